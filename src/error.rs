//! Error taxonomy for the command and query layers.
//!
//! Everything except `Storage` is recoverable at the request boundary: the
//! caller surfaces a message and continues. `Storage` wraps an underlying
//! database fault and is treated as fatal for the request that hit it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    #[error("a {entity} named '{name}' already exists")]
    DuplicateName { entity: &'static str, name: String },

    #[error("'{0}' is not a valid non-negative amount")]
    InvalidAmount(String),

    #[error("no product with id {0}")]
    UnknownProduct(i64),

    #[error("no market with id {0}")]
    UnknownMarket(i64),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RegistryError {
    /// True for user-correctable failures (bad input, duplicate, missing
    /// reference) as opposed to storage-layer faults.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RegistryError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RegistryError::DuplicateName {
            entity: "market",
            name: "Aldi".to_string(),
        };
        assert_eq!(err.to_string(), "a market named 'Aldi' already exists");

        let err = RegistryError::InvalidAmount("abc".to_string());
        assert_eq!(err.to_string(), "'abc' is not a valid non-negative amount");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(RegistryError::UnknownProduct(7).is_recoverable());
        assert!(RegistryError::EmptyName { entity: "market" }.is_recoverable());
        assert!(!RegistryError::Storage(rusqlite::Error::InvalidQuery).is_recoverable());
    }
}
