#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    AttributesStrategy, CommandStrategy, ExtractInput, ExtractStrategy, InitStrategy,
    VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anyapi")]
#[command(about = "Declarative extraction from HTML, XML, JSON, YAML, CSV and text", long_about = None)]
struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract results from content using a definition
    Extract {
        /// Definition file (.json, .yaml or .yml)
        #[arg(short, long)]
        definition: PathBuf,

        /// Content file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Attribute to extract; repeatable
        #[arg(short, long = "attr")]
        attr: Vec<String>,

        /// Ad-hoc query to evaluate; repeatable
        #[arg(short, long)]
        query: Vec<String>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// List the attributes a definition exposes
    Attributes {
        #[arg(short, long)]
        definition: PathBuf,
    },
    /// Write a starter definition
    Init {
        /// Where to write it; defaults to ~/anyapi/definition.json
        path: Option<PathBuf>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Extract {
            definition,
            input,
            attr,
            query,
            pretty,
        } => ExtractStrategy.execute(ExtractInput {
            definition,
            input,
            attributes: attr,
            queries: query,
            pretty,
        }),
        Commands::Attributes { definition } => AttributesStrategy.execute(definition),
        Commands::Init { path } => InitStrategy.execute(path),
        Commands::Version => VersionStrategy.execute(()),
    }
}
