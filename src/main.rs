use bench_store::cli::Cli;
use bench_store::error::BenchStoreError;
use clap::Parser;
use log::info;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting bench-store - Benchmark History Store");

    if let Err(err) = cli.execute() {
        eprintln!("Error: {err:#}");
        // Duplicate-commit rejection gets its own exit code so CI callers
        // can tell a retry case from a validation failure
        let code = match err.downcast_ref::<BenchStoreError>() {
            Some(BenchStoreError::DuplicateCommit(_)) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}
