use colored::*;
use tokio::sync::RwLock;

use crate::api::{CompletionClient, GenerationParams};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::logger::{Logger, SessionMetrics};
use crate::roles::RoleSelection;
use crate::session::Session;
use crate::weather::WeatherClient;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Inline message shown above the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "notice success",
            NoticeLevel::Warning => "notice warning",
            NoticeLevel::Error => "notice error",
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        let level = if err.is_warning() { NoticeLevel::Warning } else { NoticeLevel::Error };
        Self { level, text: err.to_string() }
    }
}

/// The chat controls and conversation of the dashboard's single UI session.
#[derive(Debug)]
pub struct ChatState {
    pub session: Session,
    pub selection: RoleSelection,
    pub params: GenerationParams,
    /// Key typed into the page; never rendered back.
    pub typed_key: Option<String>,
}

impl ChatState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            session: Session::new(),
            selection: RoleSelection::preset(config.default_role),
            params: config.generation_params(),
            typed_key: None,
        }
    }
}

/// Shared state behind the axum router.
pub struct DashboardState {
    pub config: AppConfig,
    pub completion: CompletionClient,
    pub weather: WeatherClient,
    /// Held for the whole Generate round-trip, so requests run one at a time.
    pub chat: RwLock<ChatState>,
    pub metrics: RwLock<SessionMetrics>,
    pub logger: Option<Logger>,
}

impl DashboardState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            completion: CompletionClient::new(&config.api_url),
            weather: WeatherClient::new(&config.weather_api_url),
            chat: RwLock::new(ChatState::new(config)),
            metrics: RwLock::new(SessionMetrics::new()),
            logger: match Logger::new(&config.log_dir) {
                Ok(l) => Some(l),
                Err(e) => {
                    println!("{} {}", "⚠️  Dashboard logging disabled:".yellow(), e);
                    None
                }
            },
        }
    }

    pub fn log(&self, f: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            let _ = f(logger);
        }
    }
}
