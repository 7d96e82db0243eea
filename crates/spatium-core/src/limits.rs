//! Input validation limits for resource protection

use crate::error::Error;

/// Maximum length for entity names (256 chars)
pub const MAX_ENTITY_NAME_LEN: usize = 256;

/// Maximum hop count for spatial traversal and context radius (50)
pub const MAX_TRAVERSAL_HOPS: u32 = 50;

/// Maximum candidate entities in one observation (1000)
pub const MAX_BATCH_ENTITIES: usize = 1000;

/// Maximum candidate relationships in one observation (1000)
pub const MAX_BATCH_RELATIONSHIPS: usize = 1000;

/// Limit violations
#[derive(Debug, Clone, PartialEq)]
pub enum LimitError {
    EmptyEntityName,
    EntityNameTooLong { len: usize, max: usize },
    ZeroHops,
    TooManyHops { hops: u32, max: u32 },
    TooManyEntities { count: usize, max: usize },
    TooManyRelationships { count: usize, max: usize },
    ZeroObservationCount { id: String },
}

impl std::fmt::Display for LimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEntityName => write!(f, "Entity name cannot be empty"),
            Self::EntityNameTooLong { len, max } => {
                write!(f, "Entity name too long: {} chars (max {})", len, max)
            }
            Self::ZeroHops => write!(f, "Hop count must be at least 1"),
            Self::TooManyHops { hops, max } => {
                write!(f, "Hop count too large: {} (max {})", hops, max)
            }
            Self::TooManyEntities { count, max } => {
                write!(f, "Too many entities in observation: {} (max {})", count, max)
            }
            Self::TooManyRelationships { count, max } => {
                write!(f, "Too many relationships in observation: {} (max {})", count, max)
            }
            Self::ZeroObservationCount { id } => {
                write!(f, "Record {} must have been observed at least once", id)
            }
        }
    }
}

impl std::error::Error for LimitError {}

impl From<LimitError> for Error {
    fn from(e: LimitError) -> Self {
        Error::Validation(e.to_string())
    }
}

/// Validate entity name
pub fn validate_entity_name(name: &str) -> Result<(), LimitError> {
    if name.trim().is_empty() {
        return Err(LimitError::EmptyEntityName);
    }
    let len = name.chars().count();
    if len > MAX_ENTITY_NAME_LEN {
        return Err(LimitError::EntityNameTooLong {
            len,
            max: MAX_ENTITY_NAME_LEN,
        });
    }
    Ok(())
}

/// Validate a stored record's observation count
pub fn validate_observation_count(id: &str, count: u32) -> Result<(), LimitError> {
    if count == 0 {
        return Err(LimitError::ZeroObservationCount { id: id.to_string() });
    }
    Ok(())
}

/// Validate a traversal hop count or context radius
pub fn validate_hops(hops: u32) -> Result<(), LimitError> {
    if hops == 0 {
        return Err(LimitError::ZeroHops);
    }
    if hops > MAX_TRAVERSAL_HOPS {
        return Err(LimitError::TooManyHops {
            hops,
            max: MAX_TRAVERSAL_HOPS,
        });
    }
    Ok(())
}

/// Validate the size of an observation batch
pub fn validate_batch(entities: usize, relationships: usize) -> Result<(), LimitError> {
    if entities > MAX_BATCH_ENTITIES {
        return Err(LimitError::TooManyEntities {
            count: entities,
            max: MAX_BATCH_ENTITIES,
        });
    }
    if relationships > MAX_BATCH_RELATIONSHIPS {
        return Err(LimitError::TooManyRelationships {
            count: relationships,
            max: MAX_BATCH_RELATIONSHIPS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entity_name() {
        assert!(validate_entity_name("Hammer").is_ok());
        assert_eq!(validate_entity_name("  "), Err(LimitError::EmptyEntityName));
        assert!(validate_entity_name(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_hops() {
        assert!(validate_hops(1).is_ok());
        assert!(validate_hops(MAX_TRAVERSAL_HOPS).is_ok());
        assert_eq!(validate_hops(0), Err(LimitError::ZeroHops));
        assert!(validate_hops(MAX_TRAVERSAL_HOPS + 1).is_err());
    }

    #[test]
    fn test_validate_observation_count() {
        assert!(validate_observation_count("a", 1).is_ok());
        assert_eq!(
            validate_observation_count("a", 0),
            Err(LimitError::ZeroObservationCount { id: "a".into() })
        );
    }

    #[test]
    fn test_limit_error_becomes_validation() {
        let err: Error = LimitError::ZeroHops.into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
