mod api;
mod chart;
mod config;
mod controller;
mod conversion;
mod error;
mod export;
mod models;
mod rates;
mod tui;
mod viz;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::{sync::Arc, time::Duration};

use crate::api::{MindicadorClient, RatesApi};
use crate::config::Config;
use crate::controller::{Command, Controller, Phase};
use crate::rates::RateService;
use crate::viz::SvgSurface;

#[derive(Parser)]
#[command(author, version, about = "Currency converter and history charts backed by mindicador.cl")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive converter (default)
    Tui,
    /// List the available currencies and their current value
    List,
    /// Convert an amount into a currency and draw its historical chart
    Convert {
        /// Amount in pesos
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Currency code, e.g. dolar, euro, uf
        currency: String,
    },
    /// Export the historical series of a currency to CSV
    Export {
        /// Currency code, e.g. dolar, euro, uf
        currency: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // Log lines would tear the alternate screen; keep them off there unless asked for.
    let default_level = match command {
        Commands::Tui => "off",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = config::load_config().context("Failed to load config.toml")?;
    let client = MindicadorClient::new(&config.api_base_url, config.request_timeout())?;
    log::info!("Using indicator service at {}", client.base_url());
    let api: Arc<dyn RatesApi> = Arc::new(client);

    match command {
        Commands::Tui => run_tui(api, &config).await?,
        Commands::List => list_currencies(api).await?,
        Commands::Convert { amount, currency } => {
            convert_once(api, &config, &amount, &currency).await?
        }
        Commands::Export { currency } => export_history(api, &config, &currency).await?,
    }

    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn run_tui(api: Arc<dyn RatesApi>, config: &Config) -> Result<()> {
    let surface = SvgSurface::new(&config.output_dir, config.chart_width, config.chart_height)?;
    let chart_path = surface.path().to_path_buf();

    let handle = Controller::new(api, Box::new(surface)).spawn();
    let result = tui::start_tui(&handle).await;
    let drew_chart = handle.view().borrow().chart.is_some();
    handle.shutdown().await?;
    result?;

    if drew_chart {
        println!("📈 Last chart saved to {}", chart_path.display());
    }
    Ok(())
}

async fn list_currencies(api: Arc<dyn RatesApi>) -> Result<()> {
    let rates = RateService::new(api);
    let bar = spinner("Fetching currencies...");
    let table = rates.list_currencies().await;
    bar.finish_and_clear();
    let table = table.context(error::MSG_CURRENCIES_FAILED)?;

    for (code, record) in table.iter() {
        let value = record
            .value
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<40} {:>14} {}",
            code,
            record.name,
            value,
            record.unit.as_deref().unwrap_or_default()
        );
    }
    println!("---");
    println!("{} currencies", table.len());
    Ok(())
}

/// Drive the controller with the same commands the interactive screen sends.
async fn convert_once(
    api: Arc<dyn RatesApi>,
    config: &Config,
    amount: &str,
    code: &str,
) -> Result<()> {
    let surface = SvgSurface::new(&config.output_dir, config.chart_width, config.chart_height)?;
    let chart_path = surface.path().to_path_buf();
    let mut controller = Controller::new(api, Box::new(surface));

    let bar = spinner("Fetching currencies...");
    controller.load_currencies().await;
    bar.finish_and_clear();
    if controller.view().currencies_failed {
        anyhow::bail!(error::MSG_CURRENCIES_FAILED);
    }

    controller
        .handle(Command::SelectionChanged(Some(code.to_string())))
        .await;
    controller
        .handle(Command::InputChanged(amount.to_string()))
        .await;
    if !controller.view().button_enabled {
        anyhow::bail!(error::MSG_INVALID_INPUT);
    }

    let bar = spinner("Converting...");
    controller.handle(Command::ActionTriggered).await;
    bar.finish_and_clear();

    let view = controller.view();
    if let Some(results) = &view.results {
        println!("{}", results);
    }
    if let Some(legend) = &view.legend {
        for line in legend.lines() {
            println!("  {}", line);
        }
    }
    if let (Phase::Result, Some(chart)) = (view.phase, &view.chart) {
        println!(
            "📈 Chart with {} points saved to {}",
            chart.data.len(),
            chart_path.display()
        );
    }

    if view.phase == Phase::Error {
        anyhow::bail!("conversion did not complete");
    }
    Ok(())
}

async fn export_history(api: Arc<dyn RatesApi>, config: &Config, code: &str) -> Result<()> {
    let mut rates = RateService::new(api);
    let table = rates
        .list_currencies()
        .await
        .context(error::MSG_CURRENCIES_FAILED)?;
    if !table.contains(code) {
        anyhow::bail!("Unknown currency code: {}", code);
    }

    export::export_history_csv(&mut rates, code, &config.output_dir).await?;
    Ok(())
}
