//! Waiting for a queued task to run

use crate::client::Ledger;
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The executor closed the task account. Terminal.
    Closed,
    /// The task account still exists.
    Pending,
}

/// One look at the task account
pub async fn poll_task<L: Ledger + ?Sized>(ledger: &L, task: &Pubkey) -> Result<TaskStatus> {
    Ok(match ledger.read_account(task).await? {
        Some(_) => TaskStatus::Pending,
        None => TaskStatus::Closed,
    })
}

/// Signature of the most recent transaction touching `task`. Once the task
/// is closed that is the transaction that ran it.
pub async fn closing_signature<L: Ledger + ?Sized>(
    ledger: &L,
    task: &Pubkey,
) -> Result<Option<Signature>> {
    Ok(ledger.signatures_for_address(task, 1).await?.into_iter().next())
}

/// Poll until the task account is closed.
///
/// Returns the number of polls it took. Read failures count as a pending
/// poll, never as completion. Gives up with [`Error::MonitorTimeout`] after
/// `max_attempts` polls or once `timeout` elapses, whichever is first. Drop
/// the future to cancel.
pub async fn wait_for_task<L: Ledger + ?Sized>(
    ledger: &L,
    task: &Pubkey,
    config: &MonitorConfig,
) -> Result<u32> {
    let mut attempts = 0u32;

    let watch = async {
        let mut interval = tokio::time::interval(config.poll_interval);
        while attempts < config.max_attempts {
            interval.tick().await;
            attempts += 1;
            match poll_task(ledger, task).await {
                Ok(TaskStatus::Closed) => {
                    info!("Task {} completed after {} polls", task, attempts);
                    return Ok(attempts);
                }
                Ok(TaskStatus::Pending) => debug!("Task {} is still pending", task),
                Err(err) => warn!("Failed to read task {}: {}", task, err),
            }
        }
        Err(Error::MonitorTimeout {
            task: *task,
            attempts,
        })
    };

    let outcome = tokio::time::timeout(config.timeout, watch).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(Error::MonitorTimeout {
            task: *task,
            attempts,
        }),
    }
}
