// Common error types for scaffold

use thiserror::Error;

use crate::services::registry_client::RegistryError;

/// Errors surfaced by the package and dispatch layers
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Missing or invalid construction options; never retried
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Version lookup against the registry failed
    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),

    /// The install mechanism failed to materialize a package
    #[error("Failed to install {package}: {source}")]
    InstallError {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    /// The child process could not be launched
    #[error("Failed to launch command package: {0}")]
    DispatchError(#[source] std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// Error rendering for the terminal, with an optional hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub suggestion: Option<String>,
    pub exit_code: i32,
}

impl UserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            exit_code: 1,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Convert a library error into what the operator sees
    pub fn from_scaffold_error(err: &ScaffoldError) -> Self {
        let user_error = Self::new(err.to_string());
        match err {
            ScaffoldError::RegistryError(_) => user_error.with_suggestion(
                "Check your network connection or the --registry setting, then run the command again.",
            ),
            ScaffoldError::InstallError { .. } => user_error.with_suggestion(
                "The package cache was left untouched; re-running the command retries the install.",
            ),
            ScaffoldError::DispatchError(_) => user_error
                .with_suggestion("Make sure Node.js is installed, or point --node at the interpreter."),
            ScaffoldError::ConfigError(_) | ScaffoldError::IoError(_) => user_error,
        }
    }

    pub fn print(&self) {
        eprintln!("error: {}", self.message);
        if let Some(suggestion) = &self.suggestion {
            eprintln!("\n{suggestion}");
        }
    }
}
