use crate::config::ConfigError;
use crate::onboarding::generation::GenerationError;
use crate::onboarding::leaderboard::LeaderboardExportError;
use crate::onboarding::roster::RosterImportError;
use crate::onboarding::service::MindsetError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Process-level failures raised while starting the service or running CLI commands.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Roster(RosterImportError),
    Export(LeaderboardExportError),
    Generator(GenerationError),
    Onboarding(MindsetError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Roster(err) => write!(f, "roster error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Generator(err) => write!(f, "generator setup error: {}", err),
            AppError::Onboarding(err) => write!(f, "onboarding error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Generator(err) => Some(err),
            AppError::Onboarding(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Roster(_) => StatusCode::BAD_REQUEST,
            AppError::Generator(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Export(_)
            | AppError::Onboarding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}

impl From<LeaderboardExportError> for AppError {
    fn from(value: LeaderboardExportError) -> Self {
        Self::Export(value)
    }
}

impl From<GenerationError> for AppError {
    fn from(value: GenerationError) -> Self {
        Self::Generator(value)
    }
}

impl From<MindsetError> for AppError {
    fn from(value: MindsetError) -> Self {
        Self::Onboarding(value)
    }
}
