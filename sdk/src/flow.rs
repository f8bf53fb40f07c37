//! Task and cron job submission flows
//!
//! Each step awaits its read before issuing the dependent write. Nothing here
//! retries; a failed submission after slot allocation usually means another
//! submitter claimed the slot, and the caller should run the flow again.

use crate::bitmap::{next_available_task_id, occupied_slots};
use crate::client::Ledger;
use crate::compiler::compile_transaction;
use crate::config::{CronConfig, QueueConfig};
use crate::error::{Error, Result};
use crate::instructions::*;
use crate::pda::{CronSeeds, TuktukSeeds};
use crate::state::{
    AnchorAccount, CronJobNameMappingV0, TaskQueue, TaskQueueNameMappingV0, TuktukConfigV0,
    UserCronJobsV0,
};
use crate::types::*;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};
use tracing::{debug, info};

/// What to run and when
#[derive(Debug, Clone)]
pub struct QueueTaskRequest {
    pub instructions: Vec<Instruction>,
    pub signer_seeds: Vec<Vec<Vec<u8>>>,
    pub trigger: TriggerV0,
    /// Overrides the queue's minimum crank reward
    pub crank_reward: Option<u64>,
    pub free_tasks: u8,
    pub description: String,
}

impl QueueTaskRequest {
    pub fn now(instructions: Vec<Instruction>, description: impl Into<String>) -> Self {
        Self {
            instructions,
            signer_seeds: Vec::new(),
            trigger: TriggerV0::Now,
            crank_reward: None,
            free_tasks: 0,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    pub signature: Signature,
    pub task_id: u16,
    pub task: Pubkey,
}

/// Find the task queue called `config.name`, creating it if allowed, and make
/// sure the payer may queue tasks on it.
pub async fn resolve_queue<L: Ledger + ?Sized>(ledger: &L, config: &QueueConfig) -> Result<Pubkey> {
    let payer = ledger.payer();
    let (tuktuk_config, _) = TuktukSeeds::tuktuk_config()?;
    let (name_mapping, _) = TuktukSeeds::task_queue_name_mapping(&tuktuk_config, &config.name)?;

    let task_queue = match ledger.read_account(&name_mapping).await? {
        Some(data) => TaskQueueNameMappingV0::try_from_account_data(&data)?.task_queue,
        None if config.create_if_missing => {
            info!("Task queue {} not found, creating", config.name);
            create_task_queue(ledger, &tuktuk_config, config).await?
        }
        None => return Err(Error::not_found("task queue name mapping", name_mapping)),
    };

    let (queue_authority, _) = TuktukSeeds::task_queue_authority(&task_queue, &payer)?;
    if ledger.read_account(&queue_authority).await?.is_none() {
        info!("Adding queue authority {} to {}", payer, task_queue);
        let ix = build_add_queue_authority_instruction(payer, payer, payer, task_queue)?;
        ledger.send_instructions(&[ix]).await?;
    }

    info!("Task queue ready: {}", task_queue);
    Ok(task_queue)
}

async fn create_task_queue<L: Ledger + ?Sized>(
    ledger: &L,
    tuktuk_config: &Pubkey,
    config: &QueueConfig,
) -> Result<Pubkey> {
    let data = ledger
        .read_account(tuktuk_config)
        .await?
        .ok_or_else(|| Error::not_found("tuktuk config", *tuktuk_config))?;
    let next_id = TuktukConfigV0::try_from_account_data(&data)?.next_task_queue_id;
    let (task_queue, _) = TuktukSeeds::task_queue(tuktuk_config, next_id)?;

    let ix = build_initialize_task_queue_instruction(
        ledger.payer(),
        *tuktuk_config,
        task_queue,
        InitializeTaskQueueArgsV0 {
            min_crank_reward: config.min_crank_reward,
            name: config.name.clone(),
            capacity: config.capacity,
            lookup_tables: config.lookup_tables.clone(),
            stale_task_age: config.stale_task_age,
        },
    )?;
    let signature = ledger.send_instructions(&[ix]).await?;
    info!("Created task queue {} (id {}) in {}", task_queue, next_id, signature);
    Ok(task_queue)
}

/// Lowest free slot of `task_queue` as of this read
pub async fn allocate_slot<L: Ledger + ?Sized>(ledger: &L, task_queue: &Pubkey) -> Result<u16> {
    let data = ledger
        .read_account(task_queue)
        .await?
        .ok_or_else(|| Error::not_found("task queue", *task_queue))?;
    let queue = TaskQueue::decode(&data)?;
    debug!(
        "Queue {} has {}/{} slots in use",
        task_queue,
        occupied_slots(&queue.task_bitmap),
        queue.capacity
    );
    // padding bits past capacity in the last byte read as free
    next_available_task_id(&queue.task_bitmap)
        .filter(|id| *id < queue.capacity)
        .ok_or(Error::QueueFull(*task_queue))
}

/// Compile `request.instructions` and queue them as a task.
pub async fn queue_task<L: Ledger + ?Sized>(
    ledger: &L,
    task_queue: &Pubkey,
    request: QueueTaskRequest,
) -> Result<QueuedTask> {
    let payer = ledger.payer();
    let task_id = allocate_slot(ledger, task_queue).await?;
    let (task, _) = TuktukSeeds::task(task_queue, task_id)?;

    let compiled = compile_transaction(&request.instructions, request.signer_seeds)?;
    debug!(
        "Compiled {} instructions over {} accounts",
        compiled.instructions.len(),
        compiled.accounts.len()
    );

    let ix = build_queue_task_instruction(
        payer,
        payer,
        *task_queue,
        QueueTaskArgsV0 {
            id: task_id,
            trigger: request.trigger,
            transaction: TransactionSourceV0::CompiledV0(compiled),
            crank_reward: request.crank_reward,
            free_tasks: request.free_tasks,
            description: request.description,
        },
    )?;
    let signature = ledger.send_instructions(&[ix]).await?;
    info!("Queued task {} (slot {}) in {}", task, task_id, signature);

    Ok(QueuedTask {
        signature,
        task_id,
        task,
    })
}

/// Cron job registered under `name` by `authority`, if any
pub async fn cron_job_for_name<L: Ledger + ?Sized>(
    ledger: &L,
    authority: &Pubkey,
    name: &str,
) -> Result<Option<Pubkey>> {
    let (name_mapping, _) = CronSeeds::cron_job_name_mapping(authority, name)?;
    match ledger.read_account(&name_mapping).await? {
        Some(data) => Ok(Some(CronJobNameMappingV0::try_from_account_data(&data)?.cron_job)),
        None => Ok(None),
    }
}

/// Register a new cron job owned by the payer on `task_queue`.
///
/// The id comes from the payer's cron job counter; the first run takes the
/// lowest free slot of the queue.
pub async fn create_cron_job<L: Ledger + ?Sized>(
    ledger: &L,
    task_queue: &Pubkey,
    config: &CronConfig,
) -> Result<Pubkey> {
    let authority = ledger.payer();
    let (user_cron_jobs, _) = CronSeeds::user_cron_jobs(&authority)?;
    let next_id = match ledger.read_account(&user_cron_jobs).await? {
        Some(data) => UserCronJobsV0::try_from_account_data(&data)?.next_cron_job_id,
        None => 0,
    };
    let (cron_job, _) = CronSeeds::cron_job(&authority, next_id)?;

    let task_id = allocate_slot(ledger, task_queue).await?;
    let (task, _) = TuktukSeeds::task(task_queue, task_id)?;

    let ix = build_initialize_cron_job_instruction(
        InitializeCronJobAccounts {
            payer: authority,
            authority,
            cron_job,
            task_queue: *task_queue,
            task,
        },
        InitializeCronJobArgsV0 {
            schedule: config.schedule.clone(),
            name: config.name.clone(),
            free_tasks_per_transaction: config.free_tasks_per_transaction,
            num_tasks_per_queue_call: config.num_tasks_per_queue_call,
        },
    )?;
    let signature = ledger.send_instructions(&[ix]).await?;
    info!("Created cron job {} (id {}) in {}", cron_job, next_id, signature);
    Ok(cron_job)
}

/// Attach a compiled transaction to `cron_job` at `index`
pub async fn add_cron_transaction<L: Ledger + ?Sized>(
    ledger: &L,
    cron_job: &Pubkey,
    index: u32,
    transaction: CompiledTransactionV0,
) -> Result<Signature> {
    let authority = ledger.payer();
    let ix = build_add_cron_transaction_instruction(
        authority,
        authority,
        *cron_job,
        AddCronTransactionArgsV0 {
            index,
            transaction_source: TransactionSourceV0::CompiledV0(transaction),
        },
    )?;
    let signature = ledger.send_instructions(&[ix]).await?;
    info!("Added transaction {} to cron job {}", index, cron_job);
    Ok(signature)
}

/// Transfer `lamports` from the payer to `target`
pub async fn fund_account<L: Ledger + ?Sized>(
    ledger: &L,
    target: &Pubkey,
    lamports: u64,
) -> Result<Signature> {
    let ix = build_fund_instruction(ledger.payer(), *target, lamports);
    let signature = ledger.send_instructions(&[ix]).await?;
    info!("Funded {} with {} lamports", target, lamports);
    Ok(signature)
}
