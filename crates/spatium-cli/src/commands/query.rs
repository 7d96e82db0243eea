//! Graph query commands: stats, spatial, path, context

use clap::Args;

use super::parse_entity_id;
use crate::output::{entity_line, print_json, relationship_line, OutputFormat};
use crate::{AppContext, Cli};
use spatium_core::{EntityId, RelationType, SemanticGraph};

#[derive(Args)]
pub struct SpatialArgs {
    /// Starting entity id
    #[arg(value_parser = parse_entity_id)]
    pub id: EntityId,

    /// Only report this relation type
    #[arg(short = 't', long)]
    pub r#type: Option<RelationType>,

    /// Maximum hops
    #[arg(long, default_value = "1")]
    pub hops: u32,
}

#[derive(Args)]
pub struct PathArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub from: EntityId,

    /// Target entity id
    #[arg(value_parser = parse_entity_id)]
    pub to: EntityId,

    /// Relation types to follow, comma separated (default from config)
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<RelationType>,
}

#[derive(Args)]
pub struct ContextArgs {
    /// Entity id
    #[arg(value_parser = parse_entity_id)]
    pub id: EntityId,

    /// Neighbourhood radius in hops (default from config)
    #[arg(short, long)]
    pub radius: Option<u32>,
}

fn require_entity(graph: &SemanticGraph, id: &EntityId) -> anyhow::Result<()> {
    if graph.get_entity(id).is_none() {
        anyhow::bail!("Entity {} not found", id);
    }
    Ok(())
}

pub fn run_stats(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let stats = graph.stats();

    match cli.format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => {
            println!("Graph: {}", ctx.graph_path.display());
            println!("  Entities: {}", stats.total_entities);
            for (entity_type, count) in &stats.entities_by_type {
                println!("    {}: {}", entity_type, count);
            }
            println!("  Relationships: {}", stats.total_relationships);
            println!("    spatial: {}", stats.spatial_relationships);
            println!("  Density: {:.4}", stats.graph_density);
        }
    }
    Ok(())
}

pub fn run_spatial(args: &SpatialArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    require_entity(&graph, &args.id)?;

    let hits = graph.query_spatial(&args.id, args.r#type, args.hops)?;
    tracing::info!("Spatial query returned {} hits", hits.len());

    match cli.format {
        OutputFormat::Json => print_json(&hits)?,
        OutputFormat::Table if hits.is_empty() => println!("No spatial relationships found"),
        OutputFormat::Table => {
            for hit in &hits {
                println!("  {}", relationship_line(&graph, hit.relationship));
            }
        }
    }
    Ok(())
}

pub fn run_path(args: &PathArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    require_entity(&graph, &args.from)?;
    require_entity(&graph, &args.to)?;

    let allowed = (!args.types.is_empty()).then_some(args.types.as_slice());
    let path = graph.find_path(&args.from, &args.to, allowed);

    match (cli.format, path) {
        (OutputFormat::Json, path) => print_json(&path)?,
        (OutputFormat::Table, None) => println!("No path from {} to {}", args.from, args.to),
        (OutputFormat::Table, Some(path)) => {
            let mut line = path.entities[0].name.clone();
            for (rel, entity) in path.relationships.iter().zip(path.entities.iter().skip(1)) {
                line.push_str(&format!(" -[{}]-> {}", rel.relation_type, entity.name));
            }
            println!("{}", line);
            println!("  {} hops", path.len());
        }
    }
    Ok(())
}

pub fn run_context(args: &ContextArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let Some(context) = graph.get_context(&args.id, args.radius)? else {
        anyhow::bail!("Entity {} not found", args.id);
    };

    match cli.format {
        OutputFormat::Json => print_json(&context)?,
        OutputFormat::Table => {
            println!("Entity: {}", entity_line(context.entity));
            match context.container {
                Some(container) => println!("  Container: {}", entity_line(container)),
                None => println!("  Container: (none)"),
            }
            if !context.contents.is_empty() {
                println!("  Contents:");
                for entity in &context.contents {
                    println!("    {}", entity_line(entity));
                }
            }
            if !context.nearby.is_empty() {
                println!("  Nearby:");
                for entity in &context.nearby {
                    println!("    {}", entity_line(entity));
                }
            }
            if !context.spatial_neighbors.is_empty() {
                println!("  Spatial neighbours:");
                for hit in &context.spatial_neighbors {
                    println!("    {}", relationship_line(&graph, hit.relationship));
                }
            }
        }
    }
    Ok(())
}
