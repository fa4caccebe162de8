//! Error types for jsonpool.

use std::fmt;

/// Errors that can occur while encoding through the pool or configuring it.
///
/// Every failure is attributable to a bad input value or a bad configuration
/// patch. Buffer growth, pool exhaustion and statistics queries never fail.
#[derive(Debug)]
pub enum PoolError {
    /// The value could not be serialized to JSON.
    Encoding(serde_json::Error),

    /// A configuration patch was rejected.
    InvalidConfig {
        /// Description of what was invalid.
        message: String,
    },
}

impl PoolError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if this is a JSON encoding failure.
    pub fn is_encoding(&self) -> bool {
        matches!(self, PoolError::Encoding(_))
    }

    /// Returns true if this is a rejected configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, PoolError::InvalidConfig { .. })
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Encoding(e) => write!(f, "encoding error: {}", e),
            PoolError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(e: serde_json::Error) -> Self {
        PoolError::Encoding(e)
    }
}
