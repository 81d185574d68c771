use std::error::Error as StdError;
use std::process::ExitCode;

use thiserror::Error;

use crate::application::posts::PostError;
use crate::config::LoadError;
use crate::infra::error::InfraError;

/// An error rendered with its full source chain.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// Messages joined outermost first.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    /// Short message for the operator, without internal detail.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Post(err) => err.user_message(),
            AppError::Config(_) => "Configuration is invalid",
            AppError::Infra(InfraError::Database { .. } | InfraError::Migration(_)) => {
                "Database unavailable"
            }
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure",
            AppError::Infra(InfraError::Configuration { .. }) => "Database is not configured",
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::Post(PostError::NotFound { .. }) => ExitCode::from(3),
            AppError::Post(PostError::AlreadyExists { .. }) => ExitCode::from(4),
            AppError::Post(PostError::ValidationFailed { .. })
            | AppError::Config(_)
            | AppError::Infra(InfraError::Configuration { .. }) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
