use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tvsort::config::{self, Config};
use tvsort::error::Result;
use tvsort::format::Formatter;
use tvsort::library::{Catalog, ClassificationResult, Scanner};
use tvsort::sort::{SortAction, SortExecutor, SortStatus};
use tvsort::worker::{self, CancelToken, Progress};

/// CLI arguments
#[derive(Parser)]
#[command(name = "tvsort")]
#[command(about = "Sort TV episode files into a library by show and season")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show catalog in TOML (defaults to the platform data dir)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify files in the input directory and list what was found
    Scan {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Descend into subdirectories
        #[arg(short, long)]
        recurse: bool,
    },
    /// Rename, move or copy classified files
    Sort {
        #[arg(short, long, value_enum, default_value_t = ActionArg::Move)]
        action: ActionArg,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        recurse: bool,
        /// Show destinations without touching any file
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Keep directories emptied by a move
        #[arg(long)]
        keep_empty_dirs: bool,
    },
    /// Write the default config file and print its location
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Rename,
    Move,
    Copy,
}

impl From<ActionArg> for SortAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Rename => SortAction::Rename,
            ActionArg::Move => SortAction::Move,
            ActionArg::Copy => SortAction::Copy,
        }
    }
}

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "tvsort.log");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tvsort=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

/// Log progress ticks until the batch drops its sender
fn drain_progress(mut rx: mpsc::UnboundedReceiver<Progress>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            debug!(done = p.done, total = p.total, file = %p.path.display(), "Progress");
        }
    })
}

/// Wait for the progress logger; a failed logger never fails the batch
async fn join_progress(handle: tokio::task::JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Progress task failed");
            false
        }
    }
}

/// Cancel the batch between files on Ctrl-C
fn cancel_on_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing current file");
            cancel.cancel();
        }
    });
}

async fn scan(
    config: &Config,
    catalog: Arc<Catalog>,
    input: PathBuf,
    recurse: bool,
    cancel: CancelToken,
) -> Result<Vec<ClassificationResult>> {
    let scanner = Arc::new(Scanner::from_config(config));
    let (tx, rx) = mpsc::unbounded_channel();
    let progress = drain_progress(rx);

    let results = worker::spawn_scan(scanner, catalog, input, recurse, tx, cancel)
        .await
        .map_err(std::io::Error::other)??;
    join_progress(progress).await;
    Ok(results)
}

fn print_results(results: &[ClassificationResult]) {
    for result in results {
        match (&result.show, &result.episode) {
            (Some(show), Some(ep)) => println!(
                "  {}  ->  {} S{:02}E{:02} {}",
                result.file_name(),
                show.name,
                ep.season_number,
                ep.episode_number,
                ep.name
            ),
            (Some(show), None) => {
                println!("? {}  ->  {} (episode unknown)", result.file_name(), show.name)
            }
            _ => println!("? {}  ->  show unknown", result.file_name()),
        }
    }
    let incomplete = results.iter().filter(|r| r.is_incomplete()).count();
    println!("{} matched, {} need manual assignment", results.len(), incomplete);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting tvsort");

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    let catalog_path = match cli.catalog {
        Some(path) => path,
        None => config::catalog_path()?,
    };

    let cancel = CancelToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::InitConfig => {
            println!("{}", config_path.display());
        }
        Commands::Scan { input, recurse } => {
            let catalog = Arc::new(Catalog::load(&catalog_path)?);
            let input = input.unwrap_or_else(|| config.input_dir());
            let recurse = recurse || config.general.recurse;

            let results = scan(&config, catalog, input, recurse, cancel).await?;
            print_results(&results);
        }
        Commands::Sort {
            action,
            input,
            output,
            recurse,
            dry_run,
            keep_empty_dirs,
        } => {
            let catalog = Arc::new(Catalog::load(&catalog_path)?);
            let input = input.unwrap_or_else(|| config.input_dir());
            let output = output.unwrap_or_else(|| config.output_dir());
            let recurse = recurse || config.general.recurse;

            let results = scan(&config, catalog, input.clone(), recurse, cancel.clone()).await?;
            let (complete, incomplete): (Vec<_>, Vec<_>) =
                results.into_iter().partition(|r| !r.is_incomplete());
            for result in &incomplete {
                println!("skipped (unresolved): {}", result.source_file.display());
            }

            let executor = SortExecutor::new(Formatter::from_config(&config), input, output)
                .delete_empty_dirs(config.general.delete_empty_dirs && !keep_empty_dirs)
                .dry_run(dry_run);

            let (tx, rx) = mpsc::unbounded_channel();
            let progress = drain_progress(rx);
            let outcomes = worker::spawn_sort(
                Arc::new(executor),
                complete,
                action.into(),
                tx,
                cancel,
            )
            .await
            .map_err(std::io::Error::other)?;
            join_progress(progress).await;

            for outcome in &outcomes {
                let dest = outcome
                    .destination
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default();
                match &outcome.status {
                    SortStatus::Done => println!("done    {} -> {}", outcome.source.display(), dest),
                    SortStatus::Planned => println!("plan    {} -> {}", outcome.source.display(), dest),
                    SortStatus::Skipped(why) => println!("skipped {} ({})", outcome.source.display(), why),
                    SortStatus::Failed(why) => println!("FAILED  {} ({})", outcome.source.display(), why),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_progress_survives_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(tx);
        assert!(join_progress(drain_progress(rx)).await);

        let failing = tokio::spawn(async { panic!("progress logger died") });
        assert!(!join_progress(failing).await);
    }
}
