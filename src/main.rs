use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use montage::app::AppContext;
use montage::cli::{commands, Cli, Commands};
use montage::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Fetch { params, json } => {
            commands::fetch_page(&ctx, &params, json).await?;
        }
        Commands::Check => {
            commands::check_plan(&ctx)?;
        }
    }

    Ok(())
}
