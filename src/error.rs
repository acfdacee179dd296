//! Error types.
//!
//! Validation failures and storage failures are kept apart so the boundary
//! can tell "your report was bad" from "we cannot answer right now".

use thiserror::Error;

use crate::config::ConsensusVariant;

/// A submission that cannot be stored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReportError {
    #[error("flooded flag is required")]
    MissingFloodedFlag,

    #[error("unrecognized flooded value: {0:?} (expected yes/no)")]
    UnrecognizedFloodedValue(String),

    #[error("depth must not be negative, got {0}")]
    NegativeDepth(f64),

    #[error("depth must be a finite number")]
    NonFiniteDepth,

    #[error("unrecognized impact category: {0:?}")]
    UnrecognizedImpactCategory(String),

    /// A reading of the wrong kind for this deployment, or both kinds at once.
    #[error("{reading} reading is not accepted by the {expected} variant")]
    VariantMismatch {
        expected: ConsensusVariant,
        reading: &'static str,
    },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// The report store could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage unavailable: {reason}")]
pub struct StorageUnavailableError {
    pub reason: String,
}

impl StorageUnavailableError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the consensus engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FloodWatchError {
    #[error("invalid report: {0}")]
    InvalidReport(#[from] InvalidReportError),

    #[error(transparent)]
    StorageUnavailable(#[from] StorageUnavailableError),
}

/// Bad configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Unparseable { key: &'static str, value: String },

    #[error("{key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },

    /// The environment could not be read or deserialized.
    #[error("cannot load configuration: {0}")]
    Load(String),
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// LINE webhook failures, each mapped to the HTTP status the boundary returns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WebhookError {
    #[error("LINE webhook not configured")]
    NotConfigured,

    #[error("missing signature")]
    MissingSignature,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed webhook body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    StorageUnavailable(#[from] StorageUnavailableError),
}

impl WebhookError {
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::NotConfigured | WebhookError::StorageUnavailable(_) => 503,
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::MalformedBody(_) => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, FloodWatchError>;
