//! CLI command implementations

pub mod completions;
pub mod config;
pub mod entity;
pub mod io;
pub mod query;

use spatium_core::EntityId;

/// clap value parser for entity ids
pub fn parse_entity_id(s: &str) -> Result<EntityId, String> {
    EntityId::from_string(s.trim()).map_err(|e| format!("invalid entity id '{}': {}", s, e))
}
