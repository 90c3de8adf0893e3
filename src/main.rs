use rust_decimal::Decimal;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use token_sweeper::config::Config;
use token_sweeper::{BatchSummary, TokenOutcome, build_swapper};

const CONFIG_PATH_ENV: &str = "SWEEPER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "debug,alloy=info,hyper=info,reqwest=info".into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("debug logging enabled");

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::from_yaml(&config_path).await?;
    config.validate()?;

    let (swapper, wallet) = build_swapper(&config)?;

    tokio::select! {
        summary = swapper.sweep(wallet) => report(&summary?),
        _ = shutdown_signal() => {
            tracing::warn!("shutdown signal received, remaining tokens were not processed");
        }
    }

    Ok(())
}

fn report(summary: &BatchSummary) {
    for report in &summary.reports {
        match &report.outcome {
            TokenOutcome::Done(outcome) => tracing::info!(
                "{} ({}): swapped {} for {} {} in {:#x}",
                report.symbol,
                report.token,
                display_amount(outcome.token_in_amount),
                display_amount(outcome.token_out_amount),
                outcome.token_out_symbol,
                outcome.tx_hash
            ),
            TokenOutcome::Skipped(reason) => {
                tracing::info!("{} ({}): skipped, {reason}", report.symbol, report.token)
            }
            TokenOutcome::Failed(e) => {
                tracing::warn!("{} ({}): failed, {e}", report.symbol, report.token)
            }
        }
    }

    let received: Decimal = summary
        .outcomes()
        .filter_map(|outcome| outcome.token_out_amount)
        .sum();

    tracing::info!(
        "{} swapped, {} skipped, {} failed; received {received} in total",
        summary.done(),
        summary.skipped(),
        summary.failed()
    );
}

fn display_amount(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "?".to_string(), |d| d.to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
