mod commands;
pub mod config;
pub mod error;
pub mod pipeline;

use clap::Parser;

pub use config::ScanSettings;
pub use error::ScanError;
pub use pipeline::ScanPipeline;

pub async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relic_scanner=info,relic_vision=info,relic_data=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = commands::Cli::parse();
    commands::dispatch(cli).await
}
