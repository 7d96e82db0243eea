//! Ingest/Import/Export commands

use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use anyhow::Context;
use clap::Args;

use crate::output::{print_json, OutputFormat};
use crate::{AppContext, Cli};
use spatium_core::{ExportDocument, Observation, SemanticGraph};

#[derive(Args)]
pub struct IngestArgs {
    /// Observation file (JSON)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Input file (export document)
    pub file: PathBuf,

    /// Replace a graph file that already has entities
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Write `content` readable by the owner only
pub fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        std::fs::write(path, content)
    }
}

pub fn run_ingest(args: &IngestArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Ingesting observation from {:?}", args.file);

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read observation file {:?}", args.file))?;
    let observation = Observation::from_json(&content)
        .with_context(|| format!("Invalid observation file {:?}", args.file))?;

    let mut graph = ctx.load_graph()?;
    let report = graph
        .ingest(observation)
        .context("Observation rejected, graph unchanged")?;
    ctx.save_graph(&graph)?;

    match cli.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table if !cli.quiet => {
            println!("Ingested observation {}", report.observation_id);
            println!(
                "  Entities: {} created, {} merged",
                report.entities_created.len(),
                report.entities_merged.len()
            );
            println!(
                "  Relationships: {} created, {} merged",
                report.relationships_created.len(),
                report.relationships_merged.len()
            );
        }
        OutputFormat::Table => {}
    }
    Ok(())
}

pub fn run_import(args: &ImportArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Importing from {:?}", args.file);

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let doc = ExportDocument::from_json(&content)
        .with_context(|| format!("Invalid export document {:?}", args.file))?;
    let imported = SemanticGraph::import(doc, ctx.config.graph.clone())
        .with_context(|| format!("Failed to import {:?}", args.file))?;

    if !args.force {
        let existing = ctx.load_graph()?.entity_count();
        if existing > 0 {
            anyhow::bail!(
                "Graph {:?} already has {} entities. Use --force to replace it.",
                ctx.graph_path,
                existing
            );
        }
    }

    ctx.save_graph(&imported)?;

    match cli.format {
        OutputFormat::Json => print_json(&imported.stats())?,
        OutputFormat::Table if !cli.quiet => println!(
            "Imported {} entities and {} relationships",
            imported.entity_count(),
            imported.relationship_count()
        ),
        OutputFormat::Table => {}
    }
    Ok(())
}

pub fn run_export(args: &ExportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph()?;
    let content = graph.to_json()?;

    match &args.output {
        Some(path) => {
            write_private(path, &content)
                .with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("Exported to {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
