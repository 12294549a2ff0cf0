//! Engine document identifiers.
//!
//! Every indexed entity is addressed by a string in the format
//! `entity_type:primary_key` (for example `item:42`). The ID is derived, never
//! stored: the same derivation runs on every index and delete call, so it must
//! stay stable for the lifetime of the entity. This newtype centralizes
//! formatting and parsing to avoid ad-hoc string handling across crates.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors that can occur when parsing a document ID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input did not match the expected `entity_type:pk` format.
    #[error("invalid document id: {0}")]
    InvalidFormat(String),

    /// The ID belongs to a different entity type than expected.
    #[error("document id '{id}' is not a {expected}")]
    WrongEntityType {
        /// The offending ID.
        id: String,
        /// The entity type that was expected.
        expected: &'static str,
    },
}

/// A document identifier in `entity_type:pk` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    /// Lowercase entity type discriminator.
    pub entity_type: String,
    /// Primary key in the datastore.
    pub pk: i64,
}

impl DocumentId {
    /// Constructs a document ID from an entity type and primary key.
    pub fn new(entity_type: &str, pk: i64) -> Self {
        Self {
            entity_type: entity_type.to_ascii_lowercase(),
            pk,
        }
    }

    /// Parses a document ID, verifying it belongs to the expected type.
    pub fn parse_for(id: &str, expected: &'static str) -> Result<Self, IdError> {
        let parsed: Self = id.parse()?;
        if parsed.entity_type != expected {
            return Err(IdError::WrongEntityType {
                id: id.to_string(),
                expected,
            });
        }
        Ok(parsed)
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let Some((entity_type, pk)) = id.split_once(':') else {
            return Err(IdError::InvalidFormat(id.to_string()));
        };

        if entity_type.is_empty() {
            return Err(IdError::InvalidFormat(id.to_string()));
        }

        let pk: i64 = pk
            .parse()
            .map_err(|_| IdError::InvalidFormat(id.to_string()))?;

        Ok(Self {
            entity_type: entity_type.to_string(),
            pk,
        })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.pk)
    }
}
