use clap::Parser;
use submit_cgap::cli::{run, Cli};
use submit_cgap_core::SubmitError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment
    dotenvy::dotenv().ok();

    // Diagnostics go to stderr so they never mix with the console output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!(command = ?cli.command, "CLI arguments parsed, invoking run");
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "CLI exited with error");
        let reported = e
            .downcast_ref::<SubmitError>()
            .is_some_and(SubmitError::already_reported);
        if !reported {
            eprintln!("ERROR: {e:#}");
        }
        std::process::exit(1);
    }
    tracing::info!("CLI completed successfully");
}
