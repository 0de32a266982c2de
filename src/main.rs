use log::{error, info};
use std::env;
use std::path::Path;
use std::process::ExitCode;

/// CLI entry point: `recipe-harvest <threads-dir | export.json>`.
///
/// Skipped messages are not run failures; the exit code is non-zero only
/// for startup errors (missing credential, unreadable input, bad config).
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let Some(input) = args.get(1) else {
        error!("usage: recipe-harvest <threads-dir | export.json>");
        return ExitCode::FAILURE;
    };

    match recipe_harvest::harvest(Path::new(input)).await {
        Ok(summary) => {
            info!("Messages scanned: {}", summary.scanned);
            info!("Recipes written: {}", summary.written);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
