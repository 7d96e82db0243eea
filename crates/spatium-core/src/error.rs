//! Error types for Spatium Core

use crate::entity::EntityId;
use crate::relation::RelationId;
use thiserror::Error;

/// Result type alias using Spatium's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Spatium error types
#[derive(Error, Debug)]
pub enum Error {
    /// A value outside its allowed domain (confidence, weight, type name, hop count)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A relationship endpoint that is not a stored entity
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationId),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for building a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
