mod crawl;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "refurbscan")]
#[command(about = "Crawls refurbished-hardware storefronts into a per-country artifact")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the configured storefronts and update the output artifact.
    Crawl(crawl::CrawlArgs),
    /// List the storefronts a crawl would visit.
    Countries,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = refurbscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Crawl(args)) => crawl::run(&config, args).await,
        Some(Commands::Countries) | None => {
            crawl::print_countries(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
