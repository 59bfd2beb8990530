// Error types for the FINDOLOGIC API client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    // The message is fixed; `field` names the config key that failed its rule.
    #[error("Invalid FindologicApi config.")]
    Config { field: String },

    #[error("Required param {0} is not set.")]
    MissingParameter(&'static str),

    #[error("The service is not alive. Reason: {0}")]
    ServiceNotAlive(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

// Raised by the read accessors for config values and params. Always a
// programming error on the caller's side, never caused by remote data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unknown or unset configuration value.")]
    ConfigValue,

    #[error("Unknown or unset param.")]
    Param,
}

impl ApiError {
    pub(crate) fn config(field: &str) -> Self {
        ApiError::Config {
            field: field.to_string(),
        }
    }
}
