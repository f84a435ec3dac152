pub mod api;
pub mod bot;
pub mod config;
pub mod github;
pub mod relay;

use gotcha::axum::extract::FromRef;
use gotcha::axum::http::StatusCode;
use thiserror::Error;

use crate::bot::{BotApiClient, BotApiError};
use crate::config::Settings;
use crate::github::{GithubClient, GithubError};

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum NydusError {
    #[error(transparent)]
    BotApi(#[from] BotApiError),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, NydusError>;

impl NydusError {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            NydusError::BotApi(BotApiError::Status { status, .. }) if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            NydusError::BotApi(_) => StatusCode::BAD_GATEWAY,
            NydusError::Github(GithubError::MissingToken) => StatusCode::BAD_REQUEST,
            NydusError::Github(_) => StatusCode::BAD_GATEWAY,
            NydusError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub bot: BotApiClient,
    pub github: GithubClient,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let bot = BotApiClient::new(&settings.bot_api_url);
        Self {
            settings,
            bot,
            github: GithubClient::new(),
        }
    }
}

// Gotcha::with_types requires a Default state
impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl FromRef<AppState> for BotApiClient {
    fn from_ref(state: &AppState) -> Self {
        state.bot.clone()
    }
}

impl FromRef<AppState> for GithubClient {
    fn from_ref(state: &AppState) -> Self {
        state.github.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

// Allow extracting BotApiClient from GotchaContext
impl FromRef<gotcha::GotchaContext<AppState, Settings>> for BotApiClient {
    fn from_ref(ctx: &gotcha::GotchaContext<AppState, Settings>) -> Self {
        ctx.state.bot.clone()
    }
}

// Allow extracting GithubClient from GotchaContext
impl FromRef<gotcha::GotchaContext<AppState, Settings>> for GithubClient {
    fn from_ref(ctx: &gotcha::GotchaContext<AppState, Settings>) -> Self {
        ctx.state.github.clone()
    }
}

// Allow extracting Settings from GotchaContext
impl FromRef<gotcha::GotchaContext<AppState, Settings>> for Settings {
    fn from_ref(ctx: &gotcha::GotchaContext<AppState, Settings>) -> Self {
        ctx.state.settings.clone()
    }
}
