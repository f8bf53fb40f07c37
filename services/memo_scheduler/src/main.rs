//! Memo scheduler service binary
//!
//! Usage: memo-scheduler [task|cron]

use anyhow::Result;
use memo_scheduler::{run_cron, run_task, Config, Mode};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuktuk_sdk::RpcLedger;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mode: Mode = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("task")
        .parse()?;

    let config = Config::from_env()?;
    let keypair = config.load_keypair()?;
    let ledger = RpcLedger::new(&config.rpc_url, keypair);

    info!("Starting memo scheduler in {:?} mode", mode);
    info!("  RPC URL: {}", ledger.url());
    info!("  Queue: {}", config.queue.name);

    let run = async {
        match mode {
            Mode::Task => run_task(&ledger, &config).await.map(|_| ()),
            Mode::Cron => run_cron(&ledger, &config).await.map(|_| ()),
        }
    };

    tokio::select! {
        result = run => {
            if let Err(e) = &result {
                error!("Memo scheduler failed: {:#}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}
