//! Memo Scheduler Service
//!
//! Schedules Memo program writes through TukTuk, either as a one-off task or
//! as a recurring cron job

pub mod config;

pub use config::{Config, Mode};

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};
use tuktuk_sdk::flow::{
    add_cron_transaction, create_cron_job, cron_job_for_name, fund_account, queue_task,
    resolve_queue,
};
use tuktuk_sdk::instructions::build_memo_instruction;
use tuktuk_sdk::monitor::{closing_signature, wait_for_task};
use tuktuk_sdk::{compile_transaction, Ledger, QueueTaskRequest, QueuedTask};

/// Outcome of a cron run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSetup {
    pub cron_job: Pubkey,
    /// False when a job with the configured name already existed
    pub created: bool,
}

/// Queue a memo to run immediately and wait for the executor to close the task.
pub async fn run_task<L: Ledger + ?Sized>(ledger: &L, config: &Config) -> Result<QueuedTask> {
    let task_queue = resolve_queue(ledger, &config.queue)
        .await
        .context("Failed to resolve task queue")?;

    let memo = build_memo_instruction(&config.message, &[]);
    let queued = queue_task(
        ledger,
        &task_queue,
        QueueTaskRequest::now(vec![memo], format!("memo: {}", config.message)),
    )
    .await
    .context("Failed to queue task")?;
    info!("Queued memo task {} with id {}", queued.task, queued.task_id);

    let polls = wait_for_task(ledger, &queued.task, &config.monitor).await?;
    match closing_signature(ledger, &queued.task).await {
        Ok(Some(signature)) => {
            info!("Memo task {} ran in {} after {} polls", queued.task, signature, polls)
        }
        Ok(None) => info!("Memo task {} ran after {} polls", queued.task, polls),
        Err(e) => warn!("Memo task {} ran, but its signature lookup failed: {}", queued.task, e),
    }
    Ok(queued)
}

/// Make sure a cron job named `config.cron.name` exists, creating, funding
/// and populating it when it does not.
pub async fn run_cron<L: Ledger + ?Sized>(ledger: &L, config: &Config) -> Result<CronSetup> {
    let authority = ledger.payer();
    let task_queue = resolve_queue(ledger, &config.queue)
        .await
        .context("Failed to resolve task queue")?;

    if let Some(cron_job) = cron_job_for_name(ledger, &authority, &config.cron.name).await? {
        info!("Cron job {} already exists at {}", config.cron.name, cron_job);
        return Ok(CronSetup {
            cron_job,
            created: false,
        });
    }

    let cron_job = create_cron_job(ledger, &task_queue, &config.cron)
        .await
        .context("Failed to create cron job")?;

    fund_account(ledger, &cron_job, config.cron.funding_lamports)
        .await
        .context("Failed to fund cron job")?;

    let memo = build_memo_instruction(&config.message, &[]);
    let compiled = compile_transaction(&[memo], Vec::new())?;
    add_cron_transaction(ledger, &cron_job, 0, compiled)
        .await
        .context("Failed to add cron transaction")?;

    info!("Cron job {} will write \"{}\" on {}", cron_job, config.message, config.cron.schedule);
    info!(
        "Close it with: tuktuk -u {} cron-transaction close --cron-name {} --id 0",
        config.rpc_url, config.cron.name
    );
    info!("Then: tuktuk -u {} cron close --cron-name {}", config.rpc_url, config.cron.name);

    Ok(CronSetup {
        cron_job,
        created: true,
    })
}
