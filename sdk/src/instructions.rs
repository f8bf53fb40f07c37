//! Instruction builders for the TukTuk and Cron programs

use crate::error::Result;
use crate::pda::{CronSeeds, TuktukSeeds, CRON_PROGRAM_ID, MEMO_PROGRAM_ID, TUKTUK_PROGRAM_ID};
use crate::types::*;
use anchor_lang::AnchorSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction, system_program,
};

/// Anchor instruction discriminator: `sha256("global:<name>")[..8]`
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("global:{name}").as_bytes());
    let hash = hasher.finalize();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

fn instruction_data<T: AnchorSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = instruction_discriminator(name).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// Create a named task queue. The payer becomes its update authority.
pub fn build_initialize_task_queue_instruction(
    payer: Pubkey,
    tuktuk_config: Pubkey,
    task_queue: Pubkey,
    args: InitializeTaskQueueArgsV0,
) -> Result<Instruction> {
    let (task_queue_name_mapping, _) =
        TuktukSeeds::task_queue_name_mapping(&tuktuk_config, &args.name)?;

    Ok(Instruction {
        program_id: TUKTUK_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(tuktuk_config, false),
            AccountMeta::new_readonly(payer, false), // update authority
            AccountMeta::new(task_queue, false),
            AccountMeta::new(task_queue_name_mapping, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data("initialize_task_queue_v0", &args)?,
    })
}

/// Allow `queue_authority` to queue tasks on `task_queue`
pub fn build_add_queue_authority_instruction(
    payer: Pubkey,
    update_authority: Pubkey,
    queue_authority: Pubkey,
    task_queue: Pubkey,
) -> Result<Instruction> {
    let (task_queue_authority, _) = TuktukSeeds::task_queue_authority(&task_queue, &queue_authority)?;

    Ok(Instruction {
        program_id: TUKTUK_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(update_authority, true),
            AccountMeta::new_readonly(queue_authority, false),
            AccountMeta::new(task_queue_authority, false),
            AccountMeta::new(task_queue, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data("add_queue_authority_v0", &AddQueueAuthorityArgsV0::default())?,
    })
}

/// Queue a task into slot `args.id`.
///
/// For a compiled transaction, its address table is appended as remaining
/// accounts.
pub fn build_queue_task_instruction(
    payer: Pubkey,
    queue_authority: Pubkey,
    task_queue: Pubkey,
    args: QueueTaskArgsV0,
) -> Result<Instruction> {
    let (task_queue_authority, _) = TuktukSeeds::task_queue_authority(&task_queue, &queue_authority)?;
    let (task, _) = TuktukSeeds::task(&task_queue, args.id)?;

    let mut accounts = vec![
        AccountMeta::new(payer, true),
        AccountMeta::new_readonly(queue_authority, true),
        AccountMeta::new_readonly(task_queue_authority, false),
        AccountMeta::new(task_queue, false),
        AccountMeta::new(task, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    match &args.transaction {
        TransactionSourceV0::CompiledV0(compiled) => {
            accounts.extend(compiled.remaining_accounts());
        }
        TransactionSourceV0::RemoteV0 { .. } => {}
    }

    Ok(Instruction {
        program_id: TUKTUK_PROGRAM_ID,
        accounts,
        data: instruction_data("queue_task_v0", &args)?,
    })
}

/// Accounts touched by `initialize_cron_job_v0`
#[derive(Debug, Clone, Copy)]
pub struct InitializeCronJobAccounts {
    pub payer: Pubkey,
    pub authority: Pubkey,
    pub cron_job: Pubkey,
    pub task_queue: Pubkey,
    /// Task that will fire the job's first run
    pub task: Pubkey,
}

pub fn build_initialize_cron_job_instruction(
    accounts: InitializeCronJobAccounts,
    args: InitializeCronJobArgsV0,
) -> Result<Instruction> {
    let (user_cron_jobs, _) = CronSeeds::user_cron_jobs(&accounts.authority)?;
    let (cron_job_name_mapping, _) = CronSeeds::cron_job_name_mapping(&accounts.authority, &args.name)?;
    let (task_queue_authority, _) =
        TuktukSeeds::task_queue_authority(&accounts.task_queue, &accounts.authority)?;

    Ok(Instruction {
        program_id: CRON_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new_readonly(accounts.authority, true), // queue authority
            AccountMeta::new_readonly(task_queue_authority, false),
            AccountMeta::new_readonly(accounts.authority, true),
            AccountMeta::new(user_cron_jobs, false),
            AccountMeta::new(accounts.cron_job, false),
            AccountMeta::new(cron_job_name_mapping, false),
            AccountMeta::new(accounts.task_queue, false),
            AccountMeta::new(accounts.task, false),
            AccountMeta::new_readonly(TUKTUK_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data("initialize_cron_job_v0", &args)?,
    })
}

/// Attach a transaction at `args.index` of a cron job
pub fn build_add_cron_transaction_instruction(
    payer: Pubkey,
    authority: Pubkey,
    cron_job: Pubkey,
    args: AddCronTransactionArgsV0,
) -> Result<Instruction> {
    let (cron_job_transaction, _) = CronSeeds::cron_job_transaction(&cron_job, args.index)?;

    let mut accounts = vec![
        AccountMeta::new(payer, true),
        AccountMeta::new_readonly(authority, true),
        AccountMeta::new(cron_job, false),
        AccountMeta::new(cron_job_transaction, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    if let TransactionSourceV0::CompiledV0(compiled) = &args.transaction_source {
        accounts.extend(compiled.remaining_accounts());
    }

    Ok(Instruction {
        program_id: CRON_PROGRAM_ID,
        accounts,
        data: instruction_data("add_cron_transaction_v0", &args)?,
    })
}

/// Write `message` to the transaction log via the Memo program
pub fn build_memo_instruction(message: &str, signers: &[Pubkey]) -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: signers
            .iter()
            .map(|signer| AccountMeta::new_readonly(*signer, true))
            .collect(),
        data: message.as_bytes().to_vec(),
    }
}

/// Move lamports into an account, e.g. to fund a cron job's crank rewards
pub fn build_fund_instruction(from: Pubkey, to: Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(&from, &to, lamports)
}
