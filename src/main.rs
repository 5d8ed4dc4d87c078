use clap::Parser;
use numbeoscraper::config::{Args, ScrapeConfig};
use numbeoscraper::error::Result;
use numbeoscraper::services::Orchestrator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScrapeConfig::from_yaml_file(&args.config_file)?;
    let orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.run().await?;

    for (name, table) in &results {
        info!(
            "dataset '{name}': {} rows x {} columns [{}]",
            table.row_count(),
            table.column_count(),
            table.columns().join(", ")
        );
    }

    info!("Scraping completed successfully!");
    Ok(())
}
