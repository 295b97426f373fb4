//! `shipdsl`: the shipping schema compiler.
//!
//! Usage:
//!   shipdsl build <dsl> <models_dir> <routes_dir> <templates_dir> [--ir <path>]
//!   shipdsl check <dsl>
//!   shipdsl ir <dsl> [--output <path>]
//!
//! Naming and output defaults come from `shipdsl.toml` or `--config`.

mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use config::Config;
use pipeline::BuildPaths;

/// Shipping schema compiler.
#[derive(Parser, Debug)]
#[command(name = "shipdsl", about = "Compile a shipping schema into Flask models, routes and templates")]
struct Cli {
    /// Path to config file (default: ./shipdsl.toml when present).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile, validate and write every artifact.
    Build {
        /// Schema DSL file.
        dsl: PathBuf,
        /// Output directory for ORM models.
        models_dir: PathBuf,
        /// Output directory for CRUD routes and relationship helpers.
        routes_dir: PathBuf,
        /// Output directory for view templates.
        templates_dir: PathBuf,
        /// Also write the IR JSON here (overrides `[output] ir`).
        #[arg(long)]
        ir: Option<PathBuf>,
    },

    /// Compile and validate only.
    Check {
        /// Schema DSL file.
        dsl: PathBuf,
    },

    /// Print the IR JSON, or write it with `--output`.
    Ir {
        /// Schema DSL file.
        dsl: PathBuf,
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            dsl,
            models_dir,
            routes_dir,
            templates_dir,
            ir,
        } => {
            let paths = BuildPaths {
                models: models_dir,
                routes: routes_dir,
                templates: templates_dir,
                ir: ir.or(config.output.ir),
            };
            let summary = pipeline::build(&dsl, &paths, &config.naming)?;
            info!(
                "Generated {} files for {} models",
                summary.files, summary.models
            );
        }
        Commands::Check { dsl } => {
            let schema = pipeline::load_schema(&dsl)?;
            println!("{}: {} models, no errors", dsl.display(), schema.models.len());
        }
        Commands::Ir { dsl, output } => {
            let schema = pipeline::load_schema(&dsl)?;
            match output {
                Some(path) => {
                    pipeline::write_ir(&schema, &path)?;
                    info!("IR written to {}", path.display());
                }
                None => print!("{}", schema.to_json()?),
            }
        }
    }

    Ok(())
}
