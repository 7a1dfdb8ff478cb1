use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid item_id: {item_id}. Must be a positive integer.")]
    InvalidItemId { item_id: i64 },

    #[error("Item with ID {item_id} not found")]
    ItemNotFound { item_id: i64 },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Max retries exceeded for {url}: {attempts} attempts, last status {status}")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Transport has been closed")]
    TransportClosed,

    #[error("Environment '{requested}' not found in config. Available: {available:?}")]
    UnknownEnvironment {
        requested: String,
        available: Vec<String>,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{entity} schema validation failed: {}", .violations.join("; "))]
    Schema {
        entity: &'static str,
        violations: Vec<String>,
    },

    #[error("Rule violated for {field}: {message}")]
    RuleViolation { field: String, message: String },
}

impl ApiError {
    pub(crate) fn rule(field: &str, message: impl Into<String>) -> Self {
        ApiError::RuleViolation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Status code carried by the error, when the failure came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } | ApiError::RetriesExhausted { status, .. } => {
                Some(*status)
            }
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
