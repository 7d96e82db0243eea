//! Spatium CLI - command line interface for the semantic memory graph

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, entity, io, query};
use config::Config;
use output::OutputFormat;
use spatium_core::SemanticGraph;

#[derive(Parser)]
#[command(name = "spatium")]
#[command(author, version, about = "Semantic memory graph for the physical world")]
pub struct Cli {
    /// Graph file (JSON export document)
    #[arg(short, long, global = true, env = "SPATIUM_GRAPH")]
    pub graph: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true, env = "SPATIUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::config_file_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show graph statistics
    Stats,
    /// Ingest an observation file into the graph
    Ingest(io::IngestArgs),
    /// Inspect entities
    Entity(entity::EntityArgs),
    /// Spatial relationships reachable from an entity
    Spatial(query::SpatialArgs),
    /// Shortest path between two entities
    Path(query::PathArgs),
    /// Container, contents and surroundings of an entity
    Context(query::ContextArgs),
    /// Export the graph
    Export(io::ExportArgs),
    /// Replace the graph with an export document
    Import(io::ImportArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context: configuration and the graph file it points at
pub struct AppContext {
    pub config: Config,
    pub graph_path: PathBuf,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load(&cli.config_path())?;
        let graph_path = cli
            .graph
            .clone()
            .or_else(|| config.graph_file.clone())
            .unwrap_or_else(config::default_graph_path);

        tracing::debug!("Using graph file at: {:?}", graph_path);
        Ok(Self { config, graph_path })
    }

    /// Load the graph file, or start empty if it does not exist yet
    pub fn load_graph(&self) -> anyhow::Result<SemanticGraph> {
        if !self.graph_path.exists() {
            tracing::info!("No graph at {:?}, starting empty", self.graph_path);
            return Ok(SemanticGraph::with_config(self.config.graph.clone())?);
        }

        let content = std::fs::read_to_string(&self.graph_path)
            .with_context(|| format!("Failed to read graph file {:?}", self.graph_path))?;
        let graph = SemanticGraph::from_json(&content, self.config.graph.clone())
            .with_context(|| format!("Invalid graph file {:?}", self.graph_path))?;
        Ok(graph)
    }

    pub fn save_graph(&self, graph: &SemanticGraph) -> anyhow::Result<()> {
        if let Some(parent) = self.graph_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        io::write_private(&self.graph_path, &graph.to_json()?)
            .with_context(|| format!("Failed to write graph file {:?}", self.graph_path))?;
        tracing::debug!("Saved graph to {:?}", self.graph_path);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting spatium CLI");

    match &cli.command {
        Commands::Config(args) => return commands::config::run(args, &cli),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli)?;

    match &cli.command {
        Commands::Stats => query::run_stats(&cli, &ctx)?,
        Commands::Ingest(args) => io::run_ingest(args, &cli, &ctx)?,
        Commands::Entity(args) => entity::run(args, &cli, &ctx)?,
        Commands::Spatial(args) => query::run_spatial(args, &cli, &ctx)?,
        Commands::Path(args) => query::run_path(args, &cli, &ctx)?,
        Commands::Context(args) => query::run_context(args, &cli, &ctx)?,
        Commands::Export(args) => io::run_export(args, &cli, &ctx)?,
        Commands::Import(args) => io::run_import(args, &cli, &ctx)?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
