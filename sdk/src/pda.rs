//! Program-derived address helpers for the TukTuk and Cron programs

use crate::error::{Error, Result};
use crate::name::hash_name;
use solana_sdk::pubkey::Pubkey;

pub const TUKTUK_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("tuktukUrfhXT6ZT77QTU8RQtvgL967uRuVagWF57zVA");
pub const CRON_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("cronAjRZnJn3MTP3B9kE62NWDrjSuAPVXf9c4hu4grM");
pub const MEMO_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Maximum length of a single seed
pub const MAX_SEED_LEN: usize = 32;
/// Maximum number of seeds, not counting the bump
pub const MAX_SEEDS: usize = 16;

/// Derive a program address and its bump seed.
///
/// The bump is searched downward from 255 until the hash of
/// `seeds || bump || program_id || "ProgramDerivedAddress"` falls off the
/// ed25519 curve, so no private key exists for the result.
pub fn derive_address(program_id: &Pubkey, seeds: &[&[u8]]) -> Result<(Pubkey, u8)> {
    if seeds.len() > MAX_SEEDS {
        return Err(Error::InvalidSeeds("too many seeds"));
    }
    if seeds.iter().any(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(Error::InvalidSeeds("seed longer than 32 bytes"));
    }
    Pubkey::try_find_program_address(seeds, program_id).ok_or(Error::DerivationExhausted)
}

/// Seeds and derivations for accounts owned by the TukTuk program
pub struct TuktukSeeds;

impl TuktukSeeds {
    pub const TUKTUK_CONFIG: &'static [u8] = b"tuktuk_config";
    pub const TASK_QUEUE: &'static [u8] = b"task_queue";
    pub const TASK_QUEUE_NAME_MAPPING: &'static [u8] = b"task_queue_name_mapping";
    pub const TASK_QUEUE_AUTHORITY: &'static [u8] = b"task_queue_authority";
    pub const TASK: &'static [u8] = b"task";

    /// Singleton program configuration
    pub fn tuktuk_config() -> Result<(Pubkey, u8)> {
        derive_address(&TUKTUK_PROGRAM_ID, &[Self::TUKTUK_CONFIG])
    }

    /// Task queue with the given numeric id
    pub fn task_queue(tuktuk_config: &Pubkey, id: u32) -> Result<(Pubkey, u8)> {
        derive_address(
            &TUKTUK_PROGRAM_ID,
            &[Self::TASK_QUEUE, tuktuk_config.as_ref(), &id.to_le_bytes()],
        )
    }

    /// Name → task queue lookup record
    pub fn task_queue_name_mapping(tuktuk_config: &Pubkey, name: &str) -> Result<(Pubkey, u8)> {
        let digest = hash_name(name);
        derive_address(
            &TUKTUK_PROGRAM_ID,
            &[Self::TASK_QUEUE_NAME_MAPPING, tuktuk_config.as_ref(), &digest],
        )
    }

    /// Record granting `queue_authority` the right to queue tasks
    pub fn task_queue_authority(
        task_queue: &Pubkey,
        queue_authority: &Pubkey,
    ) -> Result<(Pubkey, u8)> {
        derive_address(
            &TUKTUK_PROGRAM_ID,
            &[
                Self::TASK_QUEUE_AUTHORITY,
                task_queue.as_ref(),
                queue_authority.as_ref(),
            ],
        )
    }

    /// Task occupying slot `task_id` of a queue
    pub fn task(task_queue: &Pubkey, task_id: u16) -> Result<(Pubkey, u8)> {
        derive_address(
            &TUKTUK_PROGRAM_ID,
            &[Self::TASK, task_queue.as_ref(), &task_id.to_le_bytes()],
        )
    }
}

/// Seeds and derivations for accounts owned by the Cron program
pub struct CronSeeds;

impl CronSeeds {
    pub const USER_CRON_JOBS: &'static [u8] = b"user_cron_jobs";
    pub const CRON_JOB: &'static [u8] = b"cron_job";
    pub const CRON_JOB_NAME_MAPPING: &'static [u8] = b"cron_job_name_mapping";
    pub const CRON_JOB_TRANSACTION: &'static [u8] = b"cron_job_transaction";

    /// Per-authority counter record holding the next cron job id
    pub fn user_cron_jobs(authority: &Pubkey) -> Result<(Pubkey, u8)> {
        derive_address(&CRON_PROGRAM_ID, &[Self::USER_CRON_JOBS, authority.as_ref()])
    }

    pub fn cron_job(authority: &Pubkey, id: u32) -> Result<(Pubkey, u8)> {
        derive_address(
            &CRON_PROGRAM_ID,
            &[Self::CRON_JOB, authority.as_ref(), &id.to_le_bytes()],
        )
    }

    pub fn cron_job_name_mapping(authority: &Pubkey, name: &str) -> Result<(Pubkey, u8)> {
        let digest = hash_name(name);
        derive_address(
            &CRON_PROGRAM_ID,
            &[Self::CRON_JOB_NAME_MAPPING, authority.as_ref(), &digest],
        )
    }

    pub fn cron_job_transaction(cron_job: &Pubkey, index: u32) -> Result<(Pubkey, u8)> {
        derive_address(
            &CRON_PROGRAM_ID,
            &[Self::CRON_JOB_TRANSACTION, cron_job.as_ref(), &index.to_le_bytes()],
        )
    }
}
