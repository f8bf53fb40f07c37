//! TukTuk SDK - client-side helpers for the TukTuk task queue and Cron programs
//!
//! This SDK provides:
//! - Program-derived address derivation for queues, tasks and cron jobs
//! - Decoding of task queue state and slot allocation from its bitmap
//! - Compilation of instructions into the executor's compact transaction form
//! - Instruction builders and the task/cron submission flows

pub mod bitmap;
pub mod client;
pub mod compiler;
pub mod config;
pub mod error;
pub mod flow;
pub mod instructions;
pub mod monitor;
pub mod name;
pub mod pda;
pub mod state;
#[cfg(feature = "dev-context-only-utils")]
pub mod testing;
pub mod types;

// Re-export key types
pub use client::{Ledger, RpcLedger};
pub use compiler::{compile_transaction, AccountRole, CompiledAccounts};
pub use config::{CronConfig, MonitorConfig, QueueConfig};
pub use error::{Error, Result};
pub use flow::{QueueTaskRequest, QueuedTask};
pub use types::*;
