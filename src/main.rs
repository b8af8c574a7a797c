use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use shoplens_io::{ExperimentName, LABEL_COLUMN, ReportWriter, SplitSizes};
use shoplens_server::{PipelineConfig, build_router, initialize};

#[derive(Parser)]
#[command(name = "shoplens")]
#[command(about = "Purchase analytics dashboard backed by a random-forest classifier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the holdout split and the forest
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Settings shared by every command that runs the pipeline.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Path to the input CSV file
    #[arg(long, default_value = "data/dataset.csv")]
    data: PathBuf,

    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Fraction of rows withheld for evaluation
    #[arg(long, default_value_t = 0.2)]
    holdout: f64,

    /// Label column
    #[arg(long, default_value = LABEL_COLUMN)]
    label: String,

    /// Ordinal-encode text feature columns instead of failing
    #[arg(long, default_value_t = false)]
    encode_categoricals: bool,
}

impl PipelineArgs {
    fn to_config(&self, seed: u64) -> PipelineConfig {
        PipelineConfig::new(&self.data)
            .with_label(self.label.clone())
            .with_holdout_fraction(self.holdout)
            .with_n_trees(self.n_trees)
            .with_seed(seed)
            .with_encode_categoricals(self.encode_categoricals)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train once, then serve the dashboard over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Train once, write the evaluation report, and exit
    Evaluate {
        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    report: PathBuf,
    n_rows: usize,
    n_train: usize,
    n_holdout: usize,
    accuracy: String,
    n_trees: usize,
    n_features: usize,
    top_feature: Option<String>,
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Serve { bind, pipeline } => {
            let config = pipeline.to_config(cli.seed);
            let ctx = initialize(&config)
                .with_context(|| format!("startup failed reading {}", config.data_path().display()))?;
            let app = build_router(Arc::new(ctx));

            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind(bind)
                    .await
                    .with_context(|| format!("failed to bind {bind}"))?;
                info!(%bind, "dashboard listening");
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                    .context("server failed")
            })?;
            info!("server stopped");
        }

        Command::Evaluate {
            experiment,
            output_dir,
            pipeline,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let config = pipeline.to_config(cli.seed);

            // 1. Run the pipeline
            let ctx = initialize(&config)
                .with_context(|| format!("pipeline failed reading {}", config.data_path().display()))?;

            // 2. Write evaluation JSON
            let split = SplitSizes {
                n_train: ctx.partition.train.len(),
                n_holdout: ctx.partition.holdout.len(),
            };
            let writer = ReportWriter::new(&output_dir, experiment_name)?;
            let report = writer
                .write_evaluation(&ctx.evaluation, &ctx.importances, split)
                .context("failed to write evaluation report")?;

            // 3. Print stdout summary
            let meta = ctx.model.metadata();
            let output = EvaluateOutput {
                experiment,
                report,
                n_rows: ctx.dataset.n_rows(),
                n_train: split.n_train,
                n_holdout: split.n_holdout,
                accuracy: ctx.evaluation.accuracy_percent(),
                n_trees: meta.n_trees,
                n_features: meta.n_features,
                top_feature: ctx.importances.first().map(|f| f.name.clone()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
