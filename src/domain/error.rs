//! Domain error types.

/// Top-level error type for divtrader.
#[derive(Debug, thiserror::Error)]
pub enum DivtraderError {
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

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("bad price series: {reason}")]
    Series { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DivtraderError> for std::process::ExitCode {
    fn from(err: &DivtraderError) -> Self {
        let code: u8 = match err {
            DivtraderError::Io(_) => 1,
            DivtraderError::ConfigParse { .. }
            | DivtraderError::ConfigMissing { .. }
            | DivtraderError::ConfigInvalid { .. } => 2,
            DivtraderError::Data { .. } | DivtraderError::NoData { .. } => 3,
            DivtraderError::Series { .. } => 4,
            DivtraderError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
