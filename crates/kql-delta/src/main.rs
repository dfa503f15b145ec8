//! kql-delta CLI
//!
//! Command-line tool computing and applying Kusto schema deltas.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use kql_delta::prelude::*;
use kql_delta_core::{
    reconcile, EntityName, ReconcileOptions, Reconciler, ScriptRenderer, ScriptingContext,
};

/// Compute the delta between two Kusto schemas.
#[derive(Parser)]
#[command(name = "kql-delta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the jobs of a parameter file.
    Run {
        /// Parameter file (YAML).
        #[arg(short, long, env = "KQL_DELTA_PARAMETERS")]
        parameters: PathBuf,

        /// Override a parameter, e.g. `jobs.main.current.adx.database=prod`.
        #[arg(short = 'o', long = "override", value_name = "PATH=VALUE")]
        overrides: Vec<String>,

        /// Replace columns whose type changed instead of altering them.
        #[arg(long)]
        recreate_columns: bool,

        /// Print the job reports as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the delta between two script files or folders.
    Diff {
        /// Current schema; an empty database if not specified.
        #[arg(short, long)]
        current: Option<PathBuf>,

        /// Target schema.
        #[arg(short, long)]
        target: PathBuf,

        /// Database that database-level policy commands are pointed at.
        #[arg(short, long)]
        database: Option<String>,

        /// Precede each command with a comment naming it.
        #[arg(long)]
        headers: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            parameters,
            overrides,
            recreate_columns,
            json,
        } => {
            let main_parameters = MainParameterization::from_file(&parameters, &overrides)?;
            let base_dir = parameters.parent().unwrap_or_else(|| Path::new("."));
            let mut runner = DeltaRunner::new(main_parameters, base_dir, DryRunConnector::new());
            if recreate_columns {
                runner = runner.with_reconciler(Reconciler::with_options(
                    ReconcileOptions::new().with_recreated_columns(),
                ));
            }

            let reports = runner.run().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    info!(
                        "Job '{}': {} command(s), {} file(s) written, {} pushed",
                        report.job,
                        report.delta.len(),
                        report.files.len(),
                        report.pushed
                    );
                }
            }
        }

        Commands::Diff {
            current,
            target,
            database,
            headers,
        } => {
            let current = match current {
                Some(path) => load_script_path(&path).await?,
                None => Vec::new(),
            };
            let target = load_script_path(&target).await?;
            let mut delta = reconcile(&current, &target)?;

            let database = database.map(EntityName::new);
            if let Some(database) = &database {
                delta = delta
                    .into_iter()
                    .map(|command| command.with_database(database))
                    .collect();
            }
            let context = database.map_or_else(ScriptingContext::new, ScriptingContext::from);
            let mut renderer = ScriptRenderer::new(context);
            if headers {
                renderer = renderer.with_headers();
            }
            print!("{}", renderer.render(&delta));
        }
    }

    Ok(())
}
