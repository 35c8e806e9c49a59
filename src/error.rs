use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid regular expression `{expression}`: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse classifier rules: {0}")]
    InvalidRules(#[from] toml::de::Error),

    #[error("failed to read classifier rules from {path}: {source}")]
    ReadRules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown classifier `{0}`")]
    UnknownClassifier(String),

    #[error("classifier `{id}` has an invalid {field}: {reason}")]
    InvalidDefinition {
        id: String,
        field: &'static str,
        reason: String,
    },
}

pub type Result<T, E = ClassifyError> = std::result::Result<T, E>;
