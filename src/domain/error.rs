//! Domain error types.

/// Top-level error type for fractalshift.
#[derive(Debug, thiserror::Error)]
pub enum FractalShiftError {
    #[error("insufficient data: have {bars} bars, need at least {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid config value {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FractalShiftError {
    pub(crate) fn invalid_config(key: &str, reason: impl Into<String>) -> Self {
        FractalShiftError::InvalidConfig {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for problems with the price data rather than with the caller's settings.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            FractalShiftError::InsufficientData { .. }
                | FractalShiftError::MalformedBar { .. }
                | FractalShiftError::DataLoad { .. }
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            FractalShiftError::InvalidConfig { .. } | FractalShiftError::ConfigParse { .. }
        )
    }
}

impl From<&FractalShiftError> for std::process::ExitCode {
    fn from(err: &FractalShiftError) -> Self {
        let code: u8 = match err {
            FractalShiftError::Io(_) | FractalShiftError::Report { .. } => 1,
            FractalShiftError::InvalidConfig { .. } | FractalShiftError::ConfigParse { .. } => 2,
            FractalShiftError::InsufficientData { .. }
            | FractalShiftError::MalformedBar { .. }
            | FractalShiftError::DataLoad { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
