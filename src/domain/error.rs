//! Domain error types.
//!
//! Only faults that make a whole run meaningless live here. Per-stock data
//! problems are reported through [`crate::domain::selection::SkipReason`].

/// Top-level error type for mainline.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("candidate universe is empty")]
    EmptyUniverse,

    #[error("benchmark {symbol} has no data")]
    EmptyBenchmark { symbol: String },

    #[error("benchmark {symbol} has {points} points, need at least {minimum}")]
    InsufficientBenchmark {
        symbol: String,
        points: usize,
        minimum: usize,
    },

    #[error("benchmark {symbol} is not in strictly ascending date order")]
    UnorderedBenchmark { symbol: String },

    #[error("another selection run holds {path}")]
    RunLocked { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn data(reason: impl Into<String>) -> Self {
        ScreenerError::Data {
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScreenerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this fault.
    pub fn exit_status(&self) -> u8 {
        match self {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Data { .. } => 3,
            ScreenerError::EmptyUniverse
            | ScreenerError::EmptyBenchmark { .. }
            | ScreenerError::InsufficientBenchmark { .. }
            | ScreenerError::UnorderedBenchmark { .. } => 5,
            ScreenerError::RunLocked { .. } => 6,
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
