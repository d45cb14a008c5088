//! Domain error types.

/// Top-level error type for signalbook.
#[derive(Debug, thiserror::Error)]
pub enum SignalbookError {
    #[error("invalid signal config: {reason}")]
    InvalidConfig { reason: String },

    #[error("unknown signal rule: {name}")]
    UnknownRule { name: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SignalbookError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SignalbookError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        SignalbookError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&SignalbookError> for std::process::ExitCode {
    fn from(err: &SignalbookError) -> Self {
        let code: u8 = match err {
            SignalbookError::Io(_) | SignalbookError::Json(_) => 1,
            SignalbookError::ConfigParse { .. }
            | SignalbookError::ConfigMissing { .. }
            | SignalbookError::ConfigInvalid { .. } => 2,
            SignalbookError::Data { .. } => 3,
            SignalbookError::InvalidConfig { .. } => 4,
            SignalbookError::UnknownRule { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
