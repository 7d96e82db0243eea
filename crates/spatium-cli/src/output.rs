//! Output formatting utilities

use clap::ValueEnum;
use serde::Serialize;
use spatium_core::{Entity, EntityId, Relationship, SemanticGraph};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Pretty JSON to stdout
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// One-line summary of an entity
pub fn entity_line(entity: &Entity) -> String {
    let tags = if entity.semantic.tags.is_empty() {
        String::new()
    } else {
        let tags: Vec<&str> = entity.semantic.tags.iter().map(String::as_str).collect();
        format!(" [{}]", tags.join(", "))
    };
    format!(
        "{}  {} ({}) confidence={} seen={}{}",
        entity.id, entity.name, entity.entity_type, entity.confidence, entity.observation_count, tags
    )
}

/// `source -[type]-> target`, with names resolved through `graph`
pub fn relationship_line(graph: &SemanticGraph, rel: &Relationship) -> String {
    let name = |id: &EntityId| {
        graph
            .get_entity(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut line = format!(
        "{} -[{}]-> {}  confidence={} seen={}",
        name(&rel.source_id),
        rel.relation_type,
        name(&rel.target_id),
        rel.confidence,
        rel.observation_count
    );
    if let Some(meters) = rel.spatial.as_ref().and_then(|s| s.distance_meters) {
        line.push_str(&format!(" distance={}m", meters));
    }
    line
}
