use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
    #[error("missing_content - {0}")]
    MissingContent(String),
    #[error("missing_deadline - {0}")]
    MissingDeadline(String),
    #[error("generation_failed - {0}")]
    GenerationFailed(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn missing_content() -> Self {
        Self::MissingContent("content is required".to_string())
    }

    pub fn missing_deadline() -> Self {
        Self::MissingDeadline("deadline is required".to_string())
    }

    pub fn generation_failed<M: Into<String>>(message: M) -> Self {
        Self::GenerationFailed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::MissingContent(_) => "missing_content",
            Self::MissingDeadline(_) => "missing_deadline",
            Self::GenerationFailed(_) => "generation_failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message)
            | Self::MissingContent(message)
            | Self::MissingDeadline(message)
            | Self::GenerationFailed(message) => message,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}
