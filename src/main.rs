use anyhow::Context;
use api_client::CoinGeckoClient;
use clap::{Parser, Subcommand};
use configuration::{ConfigOverrides, init_tracing};
use engine::ReportPipeline;
use report::{ReportRenderer, SvgReportRenderer};
use std::sync::Arc;

/// Risk statistics and short-horizon forecasts for crypto assets.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; PORT and RISKCAST_* may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.overrides.load().context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;
    tracing::debug!(?config, "Configuration loaded.");

    match cli.command {
        Commands::Serve => web_server::serve(&config).await,
        Commands::Report(args) => {
            let client = CoinGeckoClient::new(&config.provider)?;
            let renderer: Option<Arc<dyn ReportRenderer>> = if args.no_plot {
                None
            } else {
                Some(Arc::new(SvgReportRenderer::default()))
            };
            let pipeline = ReportPipeline::new(&config, Arc::new(client), renderer);

            let payload = pipeline.run(&args.coin_id).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve `GET /predict/:coin_id` over HTTP.
    Serve,
    /// Build one report and print it as JSON.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ReportArgs {
    /// The CoinGecko asset id (e.g., "bitcoin").
    coin_id: String,

    /// Leave the base64 chart out of the output.
    #[arg(long)]
    no_plot: bool,
}
