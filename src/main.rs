//! Farewatch - airfare price monitoring
//!
//! Runs one monitoring pass: fetch the watched destinations, fill in missing
//! airport codes, look up current prices and email subscribers about deals.

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{debug, error, info};

use farewatch::cache::{CodeCache, RouteCache};
use farewatch::cli::Cli;
use farewatch::config::Config;
use farewatch::data::{AmadeusClient, SearchDates, SheetyClient};
use farewatch::monitor::{Monitor, RunReport};
use farewatch::notify::{Composer, LogMailer, Mailer, Notifier, SmtpMailer};
use farewatch::resolver::CodeResolver;
use farewatch::search::PriceSearch;

/// Exit code for configuration problems
const EXIT_CONFIG: u8 = 2;

fn init_tracing(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with_target(false)
        .init();
}

/// Builds every component from `config` and runs one pass with `mailer`
async fn run_with<M: Mailer>(
    config: &Config,
    mailer: M,
) -> Result<RunReport, Box<dyn std::error::Error>> {
    let provider = AmadeusClient::connect(&config.provider).await?;
    let store = SheetyClient::new(&config.store);

    let resolver = CodeResolver::new(provider.clone(), CodeCache::new(config.cache_dir.clone()));
    let search = PriceSearch::new(
        provider,
        RouteCache::new(config.cache_dir.clone(), config.freshness_window()),
        config.currency_code.clone(),
    );
    let dates = SearchDates::from_offsets(
        Local::now().date_naive(),
        config.depart_offset_days,
        config.return_offset_days,
    );
    info!(
        origin = %config.origin_code,
        depart = %dates.depart,
        return_date = %dates.return_date,
        cache_dir = %config.cache_dir.display(),
        "Starting monitoring run"
    );

    let monitor = Monitor::new(
        store,
        resolver,
        search,
        Notifier::new(mailer),
        Composer::new(config.origin_code.clone(), config.currency_symbol()),
        config.origin_code.clone(),
        dates,
    );
    Ok(monitor.run().await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Before the subscriber is built, so RUST_LOG can come from .env
    let env_file = dotenvy::dotenv();
    init_tracing(&cli);
    match &env_file {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    let mut config = match Config::from_env(!cli.dry_run) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            error!("Check that the .env file or environment is configured correctly");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    cli.apply(&mut config);

    let result = if cli.dry_run {
        run_with(&config, LogMailer).await
    } else {
        match SmtpMailer::new(&config.smtp) {
            Ok(mailer) => run_with(&config, mailer).await,
            Err(e) => {
                error!("Failed to set up email transport: {}", e);
                return ExitCode::from(EXIT_CONFIG);
            }
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        state = ?report.state,
        destinations = report.destinations,
        deals = report.deals(),
        "Run finished"
    );
    if let Some(failure) = &report.failure {
        error!("Run ended early: {}", failure);
    }

    if report.state.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
