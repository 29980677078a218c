use clap::Parser;
use tracing_subscriber::EnvFilter;

use feedwatch::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let default_filter = match args.verbose {
        0 => "feedwatch=info",
        1 => "feedwatch=debug",
        _ => "feedwatch=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(args).await
}
