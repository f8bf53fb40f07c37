//! Configuration passed into the submission flows

use serde::{Deserialize, Serialize};
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use std::time::Duration;

const HOURS: u32 = 60 * 60;

/// Which task queue to use, and how to create it when it is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub name: String,

    /// Create the queue when no queue with `name` exists. Creating a queue
    /// costs the payer rent for the queue account.
    pub create_if_missing: bool,

    /// Minimum reward in lamports paid to whoever cranks a task
    pub min_crank_reward: u64,

    /// Number of task slots
    pub capacity: u16,

    /// Seconds after which an unexecuted task may be reclaimed
    pub stale_task_age: u32,

    pub lookup_tables: Vec<Pubkey>,
}

impl QueueConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "banana-queue".to_string(),
            create_if_missing: true,
            min_crank_reward: 10_000,
            capacity: 10,
            stale_task_age: 48 * HOURS,
            lookup_tables: Vec::new(),
        }
    }
}

/// A recurring job on the Cron program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronConfig {
    pub name: String,

    /// Cron expression with seconds, interpreted by the Cron program
    pub schedule: String,

    pub free_tasks_per_transaction: u8,
    pub num_tasks_per_queue_call: u8,

    /// Lamports moved into the cron job to pay crank rewards
    pub funding_lamports: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            name: "my-cron-job".to_string(),
            schedule: "0 * * * * *".to_string(),
            free_tasks_per_transaction: 0,
            num_tasks_per_queue_call: 1,
            funding_lamports: LAMPORTS_PER_SOL / 100,
        }
    }
}

/// Bounds for waiting on a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 60,
            timeout: Duration::from_secs(300),
        }
    }
}
