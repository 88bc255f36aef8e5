use thiserror::Error;

/// Reasons a mastery report is declined. Internal only: callers across the
/// trust boundary see "no grade" regardless of which variant fired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("topic {0} not present in mastery report")]
    TopicNotInReport(String),
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("malformed report: {0}")]
    Malformed(String),
}

/// Errors raised while building block or server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shared key must not be empty")]
    EmptySecret,
    #[error("module id must not be empty")]
    EmptyTopic,
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid block config: {0}")]
    InvalidBlockConfig(String),
    #[error("invalid listen address: {0}")]
    InvalidListenAddr(String),
}
