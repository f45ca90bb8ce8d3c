use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::models::Run;
use crate::store;

#[derive(Parser)]
#[command(name = "bench-store")]
#[command(author, version, about = "Benchmark history store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the benchmark history file
    #[arg(
        short,
        long,
        global = true,
        env = "BENCH_STORE_PATH",
        default_value = "dev/bench/data.js"
    )]
    store: PathBuf,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a benchmark run to the history
    Ingest {
        /// Path to the run JSON produced by the benchmark harness
        run_file: PathBuf,

        /// Accept a commit id already present in history (CI retry)
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Suite the run is recorded under
        #[arg(long, default_value = "Benchmark")]
        suite: String,

        /// Repository URL recorded in the store
        #[arg(long)]
        repo_url: Option<String>,
    },

    /// Print the time series of one benchmark as JSON
    Query {
        /// Exact benchmark name
        #[arg(short, long)]
        name: String,
    },

    /// List all benchmark names ever observed, one per line
    Names,

    /// Print the most recently ingested run as JSON
    Latest,

    /// Remove runs from the history
    Prune {
        /// Drop every run recorded for this commit id
        #[arg(long)]
        commit: Option<String>,

        /// Keep only the most recent N runs of each suite
        #[arg(long, conflicts_with = "commit")]
        keep_last: Option<usize>,
    },
}

impl Cli {
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Ingest {
                run_file,
                force,
                suite,
                repo_url,
            } => {
                info!("Ingesting run from {}", run_file.display());

                let mut history = store::load_or_default(&self.store)?;
                let content = std::fs::read_to_string(run_file)?;
                let run: Run = serde_json::from_str(&content)?;

                if let Some(repo_url) = repo_url {
                    history.set_repo_url(repo_url);
                }

                history.ingest(suite, run, *force)?;
                store::save(&history, &self.store)?;

                Ok(())
            }
            Commands::Query { name } => {
                let history = store::load_or_default(&self.store)?;
                let series = history.series(name);

                let json_output = if self.pretty {
                    serde_json::to_string_pretty(&series)?
                } else {
                    serde_json::to_string(&series)?
                };
                self.write_output(&json_output)
            }
            Commands::Names => {
                let history = store::load_or_default(&self.store)?;
                self.write_output(&history.names().join("\n"))
            }
            Commands::Latest => {
                let history = store::load_or_default(&self.store)?;

                let Some(run) = history.latest() else {
                    return Ok(());
                };
                let json_output = if self.pretty {
                    serde_json::to_string_pretty(run)?
                } else {
                    serde_json::to_string(run)?
                };
                self.write_output(&json_output)
            }
            Commands::Prune { commit, keep_last } => {
                let mut history = store::load_or_default(&self.store)?;

                let removed = match (commit, keep_last) {
                    (Some(commit), None) => history.prune_commit(commit),
                    (None, Some(keep)) => history.keep_last(*keep),
                    _ => bail!("prune requires exactly one of --commit or --keep-last"),
                };

                if removed > 0 {
                    store::save(&history, &self.store)?;
                }
                println!("Removed {removed} run(s)");

                Ok(())
            }
        }
    }

    fn write_output(&self, content: &str) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, content)?;
            info!("Output written to: {}", output_path.display());
        } else if !content.is_empty() {
            println!("{content}");
        }

        Ok(())
    }
}
