//! materials CLI: load and query a materials database.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use materials_db::config::MaterialsConfig;
use materials_db::engine::{Engine, EngineConfig};
use materials_db::schema::{self, SchemaKind};

#[derive(Parser)]
#[command(name = "materials", version, about = "Materials database query and ingestion engine")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for persistent storage (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-load a CSV file ("Chemical formula,..." header, then
    /// compound,name,value,... lines).
    Upload {
        #[arg(long)]
        file: PathBuf,
    },

    /// Add materials from a JSON `add` document.
    Add {
        #[arg(long)]
        file: PathBuf,
    },

    /// Run a JSON `search` document.
    Search {
        /// Search document; an empty document matches everything.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Free-text term, matched against the full-text index.
        #[arg(long)]
        term: Option<String>,
    },

    /// Check a JSON document against the `add` or `search` schema without
    /// touching the database.
    Validate {
        /// Schema name: `add` or `search`.
        #[arg(long)]
        kind: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Show engine info and statistics.
    Info,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MaterialsConfig::load(path)?,
        None => MaterialsConfig::default(),
    };
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }

    let filter = config.log_filter.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Validate { kind, file } = &cli.command {
        let kind: SchemaKind = kind.parse()?;
        let bytes = std::fs::read(file).into_diagnostic()?;
        schema::validate(&bytes, kind)?;
        println!("{} conforms to the {kind} schema", file.display());
        return Ok(());
    }

    let engine = Engine::new(EngineConfig::from(&config))?;

    match cli.command {
        Commands::Upload { file } => {
            let bytes = std::fs::read(&file).into_diagnostic()?;
            let summary = engine.upload(&bytes)?;
            println!("{summary}");
        }

        Commands::Add { file } => {
            let bytes = std::fs::read(&file).into_diagnostic()?;
            let records = engine.add(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }

        Commands::Search { file, term } => {
            let bytes = match file {
                Some(path) => std::fs::read(&path).into_diagnostic()?,
                None => b"{}".to_vec(),
            };
            let records = engine.search(&bytes, term.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }

        Commands::Info => {
            println!("{}", engine.info()?);
        }

        Commands::Validate { .. } => {}
    }

    Ok(())
}
