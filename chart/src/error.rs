//! Errors produced while building the chart.

/// Errors produced while validating values or rendering manifests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for {field}: {reason}")]
    InvalidValues { field: &'static str, reason: String },
    #[error("YAML error: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidValues {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type of chart operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
