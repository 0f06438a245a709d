use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::api::{GenerationParams, MAX_TOKENS_RANGE, MODELS, TEMPERATURE_RANGE};
use crate::roles::ROLE_PRESETS;

/// Application configuration, loaded from `rolecast.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Zero-based index into the role preset table.
    pub default_role: usize,
    pub weather_api_url: String,
    pub default_city: String,
    pub museum_rows: usize,
    pub enable_dashboard: bool,
    pub dashboard_port: u16,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            max_tokens: 600,
            temperature: 0.85,
            default_role: 0,
            weather_api_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            default_city: "London".to_string(),
            museum_rows: 5,
            enable_dashboard: false,
            dashboard_port: 8080,
            log_dir: "logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./rolecast.toml` -> `~/rolecast.toml` -> defaults.
    pub fn load() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg.sanitized(),
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("rolecast.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("rolecast.toml"));
        }
        paths
    }

    /// Replace out-of-range values with their defaults, warning on stderr.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !MODELS.contains(&self.model.as_str()) {
            eprintln!("Warning: unknown model '{}', using {}", self.model, defaults.model);
            self.model = defaults.model;
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            eprintln!("Warning: temperature {} out of range, using {}", self.temperature, defaults.temperature);
            self.temperature = defaults.temperature;
        }
        if !MAX_TOKENS_RANGE.contains(&self.max_tokens) {
            eprintln!("Warning: max_tokens {} out of range, using {}", self.max_tokens, defaults.max_tokens);
            self.max_tokens = defaults.max_tokens;
        }
        if self.default_role >= ROLE_PRESETS.len() {
            eprintln!("Warning: default_role {} out of range, using {}", self.default_role, defaults.default_role);
            self.default_role = defaults.default_role;
        }
        if !(1..=10).contains(&self.museum_rows) {
            eprintln!("Warning: museum_rows {} out of range, using {}", self.museum_rows, defaults.museum_rows);
            self.museum_rows = defaults.museum_rows;
        }
        self
    }

    /// Generation parameters as configured. `sanitized` guarantees these are valid.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams::new(&self.model, self.temperature, self.max_tokens)
            .unwrap_or_default()
    }
}
