use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::utils::{ensure_dir, preview};

pub struct Logger {
    log_file: PathBuf,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionMetrics {
    pub total_requests: usize,
    pub successful_completions: usize,
    pub api_errors: usize,
    pub weather_lookups: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a Generate outcome. Only attempts that reached the provider count
    /// as requests; rejected inputs and missing keys are not recorded.
    pub fn record_completion(&mut self, result: &AppResult<String>) {
        match result {
            Ok(_) => {
                self.total_requests += 1;
                self.successful_completions += 1;
            }
            Err(AppError::Upstream(_)) => {
                self.total_requests += 1;
                self.api_errors += 1;
            }
            Err(_) => {}
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        (self.successful_completions as f64 / self.total_requests as f64) * 100.0
    }

    pub fn display(&self) {
        use colored::Colorize;
        println!("\n{}", "━━━━━━━━━ Session Statistics ━━━━━━━━━".bright_cyan().bold());
        println!("Total requests: {}", self.total_requests);
        println!("Successful completions: {}", self.successful_completions.to_string().green());
        println!("API errors: {}", self.api_errors.to_string().red());
        println!("Weather lookups: {}", self.weather_lookups.to_string().yellow());
        println!("Success rate: {:.1}%", self.success_rate());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan());
    }
}

impl Logger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        ensure_dir(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = dir.join(format!("session_{}.log", timestamp));

        Ok(Self { log_file })
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn log_api_request(&self, role: &str, model: &str, prompt: &str) -> Result<()> {
        self.log(&format!("API REQUEST [{} / {}]: {}", role, model, prompt))
    }

    pub fn log_api_response(&self, response: &str) -> Result<()> {
        self.log(&format!("API RESPONSE: {}", preview(response, 200)))
    }

    pub fn log_weather(&self, city: &str, found: bool) -> Result<()> {
        let status = if found { "OK" } else { "NO DATA" };
        self.log(&format!("WEATHER {}: {}", status, city))
    }

    pub fn log_reset(&self, role: &str) -> Result<()> {
        self.log(&format!("RESET: {}", role))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}
