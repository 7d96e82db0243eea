//! Entity commands

use clap::{Args, Subcommand};
use serde::Serialize;

use super::parse_entity_id;
use crate::output::{entity_line, print_json, relationship_line, OutputFormat};
use crate::{AppContext, Cli};
use spatium_core::{Entity, EntityId, EntityType, Relationship};

#[derive(Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommands,
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// List entities
    List {
        /// Filter by type
        #[arg(short = 't', long)]
        r#type: Option<EntityType>,
        /// Filter by name (case-insensitive)
        #[arg(short, long)]
        name: Option<String>,
        /// Substring name matching, including aliases
        #[arg(long, requires = "name")]
        fuzzy: bool,
        /// Limit results
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
    /// Show one entity with its relationships
    Show {
        /// Entity id
        #[arg(value_parser = parse_entity_id)]
        id: EntityId,
    },
}

#[derive(Serialize)]
struct EntityDetails<'a> {
    entity: &'a Entity,
    outgoing: Vec<&'a Relationship>,
    incoming: Vec<&'a Relationship>,
}

pub fn run(args: &EntityArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;

    match &args.command {
        EntityCommands::List {
            r#type,
            name,
            fuzzy,
            limit,
        } => {
            let candidates: Vec<&Entity> = match name {
                Some(name) => graph.find_entities_by_name(name, *fuzzy),
                None => graph.entities().collect(),
            };
            let filtered: Vec<&Entity> = candidates
                .into_iter()
                .filter(|e| r#type.map_or(true, |t| e.entity_type == t))
                .take(*limit)
                .collect();

            tracing::info!("Found {} entities", filtered.len());

            match cli.format {
                OutputFormat::Json => print_json(&filtered)?,
                OutputFormat::Table if filtered.is_empty() => println!("No entities found"),
                OutputFormat::Table => {
                    println!("Entities ({} found):", filtered.len());
                    for entity in &filtered {
                        println!("  {}", entity_line(entity));
                    }
                }
            }
        }
        EntityCommands::Show { id } => {
            let Some(entity) = graph.get_entity(id) else {
                anyhow::bail!("Entity {} not found", id);
            };
            let details = EntityDetails {
                entity,
                outgoing: graph.get_relationships(Some(id), None, None),
                incoming: graph.get_relationships(None, Some(id), None),
            };

            match cli.format {
                OutputFormat::Json => print_json(&details)?,
                OutputFormat::Table => print_details(&graph, &details),
            }
        }
    }

    Ok(())
}

fn print_details(graph: &spatium_core::SemanticGraph, details: &EntityDetails<'_>) {
    let entity = details.entity;
    let semantic = &entity.semantic;

    println!("Entity: {}", entity.name);
    println!("  Id: {}", entity.id);
    println!("  Type: {}", entity.entity_type);
    println!("  Confidence: {}", entity.confidence);
    println!("  Observations: {}", entity.observation_count);
    println!("  First observed: {}", entity.first_observed);
    println!("  Last observed: {}", entity.last_observed);

    if let Some(category) = &semantic.category {
        println!("  Category: {}", category);
    }
    if let Some(function) = &semantic.function {
        println!("  Function: {}", function);
    }
    if let Some(description) = &semantic.description {
        println!("  Description: {}", description);
    }
    if !semantic.tags.is_empty() {
        let tags: Vec<&str> = semantic.tags.iter().map(String::as_str).collect();
        println!("  Tags: {}", tags.join(", "));
    }
    if !semantic.aliases.is_empty() {
        println!("  Aliases: {}", semantic.aliases.join(", "));
    }
    if !entity.source_devices.is_empty() {
        let devices: Vec<&str> = entity.source_devices.iter().map(String::as_str).collect();
        println!("  Devices: {}", devices.join(", "));
    }

    for (label, rels) in [("Outgoing", &details.outgoing), ("Incoming", &details.incoming)] {
        if !rels.is_empty() {
            println!("  {}:", label);
            for rel in rels.iter() {
                println!("    {}", relationship_line(graph, rel));
            }
        }
    }
}
