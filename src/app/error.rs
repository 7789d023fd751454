use thiserror::Error;

use crate::app::dispatch::InvokeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to initialize database: {0}")]
    DatabaseInit(String),
    #[error("runtime failure: {0}")]
    Runtime(String),
    #[error("{function} failed: {source}")]
    Invoke {
        function: String,
        #[source]
        source: InvokeError,
    },
    #[error("{function} failed remotely: {message}")]
    Remote { function: String, message: String },
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }

    pub fn database_init<E: std::fmt::Display>(error: E) -> Self {
        Self::DatabaseInit(error.to_string())
    }

    pub fn runtime<E: std::fmt::Display>(error: E) -> Self {
        Self::Runtime(error.to_string())
    }

    pub fn invoke(function: &str, source: InvokeError) -> Self {
        Self::Invoke {
            function: function.to_string(),
            source,
        }
    }

    pub fn remote(function: &str, message: impl Into<String>) -> Self {
        Self::Remote {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
