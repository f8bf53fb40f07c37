//! Decoders for on-chain account state read by the submission flows
//!
//! The task queue is decoded through an explicit offset table because its
//! bitmap sits behind a fixed-width prefix that the client must read without
//! the program's own type definitions. The small lookup records are plain
//! Anchor accounts and decode with Borsh after their discriminator.

use crate::error::{Error, Result};
use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

/// Length of an Anchor account discriminator
pub const DISCRIMINATOR_LEN: usize = 8;

/// Anchor account discriminator: `sha256("account:<Name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(format!("account:{name}").as_bytes());
    let hash = hasher.finalize();
    let mut discriminator = [0u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    discriminator
}

/// Byte offsets of `TaskQueueV0` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQueueLayout {
    pub tuktuk_config: usize,
    pub id: usize,
    pub update_authority: usize,
    pub reserved: usize,
    pub min_crank_reward: usize,
    pub uncollected_protocol_fees: usize,
    pub capacity: usize,
    pub created_at: usize,
    pub updated_at: usize,
    pub bump_seed: usize,
    pub task_bitmap_len: usize,
    pub task_bitmap: usize,
}

impl TaskQueueLayout {
    pub const V0: TaskQueueLayout = TaskQueueLayout {
        tuktuk_config: 8,
        id: 40,
        update_authority: 44,
        reserved: 76,
        min_crank_reward: 108,
        uncollected_protocol_fees: 116,
        capacity: 124,
        created_at: 126,
        updated_at: 134,
        bump_seed: 142,
        task_bitmap_len: 143,
        task_bitmap: 147,
    };
}

/// Known task queue account versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskQueueVersion {
    #[default]
    V0,
}

impl TaskQueueVersion {
    pub fn layout(self) -> &'static TaskQueueLayout {
        match self {
            TaskQueueVersion::V0 => &TaskQueueLayout::V0,
        }
    }
}

/// Decoded task queue account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQueue {
    pub tuktuk_config: Pubkey,
    pub id: u32,
    pub update_authority: Pubkey,
    pub reserved: [u8; 32],
    pub min_crank_reward: u64,
    pub uncollected_protocol_fees: u64,
    pub capacity: u16,
    pub created_at: i64,
    pub updated_at: i64,
    pub bump_seed: u8,
    pub task_bitmap: Vec<u8>,
}

impl TaskQueue {
    pub const ACCOUNT_NAME: &'static str = "TaskQueueV0";

    /// Decode the current account version
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_versioned(data, TaskQueueVersion::default())
    }

    pub fn decode_versioned(data: &[u8], version: TaskQueueVersion) -> Result<Self> {
        let layout = version.layout();

        let bitmap_len = read_u32(data, layout.task_bitmap_len, "task_bitmap_len")? as usize;
        let bitmap_end = layout.task_bitmap.saturating_add(bitmap_len);
        let task_bitmap = data
            .get(layout.task_bitmap..bitmap_end)
            .ok_or(Error::InvalidLayout {
                field: "task_bitmap",
                needed: bitmap_end,
                actual: data.len(),
            })?
            .to_vec();

        Ok(Self {
            tuktuk_config: read_pubkey(data, layout.tuktuk_config, "tuktuk_config")?,
            id: read_u32(data, layout.id, "id")?,
            update_authority: read_pubkey(data, layout.update_authority, "update_authority")?,
            reserved: read_array(data, layout.reserved, "reserved")?,
            min_crank_reward: read_u64(data, layout.min_crank_reward, "min_crank_reward")?,
            uncollected_protocol_fees: read_u64(
                data,
                layout.uncollected_protocol_fees,
                "uncollected_protocol_fees",
            )?,
            capacity: u16::from_le_bytes(read_array(data, layout.capacity, "capacity")?),
            created_at: i64::from_le_bytes(read_array(data, layout.created_at, "created_at")?),
            updated_at: i64::from_le_bytes(read_array(data, layout.updated_at, "updated_at")?),
            bump_seed: read_array::<1>(data, layout.bump_seed, "bump_seed")?[0],
            task_bitmap,
        })
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize, field: &'static str) -> Result<[u8; N]> {
    let end = offset.saturating_add(N);
    data.get(offset..end)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(Error::InvalidLayout {
            field,
            needed: end,
            actual: data.len(),
        })
}

fn read_u32(data: &[u8], offset: usize, field: &'static str) -> Result<u32> {
    read_array(data, offset, field).map(u32::from_le_bytes)
}

fn read_u64(data: &[u8], offset: usize, field: &'static str) -> Result<u64> {
    read_array(data, offset, field).map(u64::from_le_bytes)
}

fn read_pubkey(data: &[u8], offset: usize, field: &'static str) -> Result<Pubkey> {
    read_array(data, offset, field).map(Pubkey::new_from_array)
}

/// An Anchor account decoded with Borsh after its discriminator
pub trait AnchorAccount: AnchorDeserialize {
    const ACCOUNT_NAME: &'static str;

    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        account_discriminator(Self::ACCOUNT_NAME)
    }

    fn try_from_account_data(data: &[u8]) -> Result<Self> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(Error::InvalidLayout {
                field: "discriminator",
                needed: DISCRIMINATOR_LEN,
                actual: data.len(),
            });
        }
        if data[..DISCRIMINATOR_LEN] != Self::discriminator() {
            return Err(Error::DiscriminatorMismatch {
                account: Self::ACCOUNT_NAME,
            });
        }
        let mut body = &data[DISCRIMINATOR_LEN..];
        Self::deserialize(&mut body).map_err(|_| Error::InvalidLayout {
            field: Self::ACCOUNT_NAME,
            needed: DISCRIMINATOR_LEN + 1,
            actual: data.len(),
        })
    }
}

/// Program-wide configuration; holds the counter for new queue ids
#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct TuktukConfigV0 {
    pub min_task_queue_id: u32,
    pub next_task_queue_id: u32,
    pub authority: Pubkey,
    pub min_deposit: u64,
    pub bump_seed: u8,
}

impl AnchorAccount for TuktukConfigV0 {
    const ACCOUNT_NAME: &'static str = "TuktukConfigV0";
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct TaskQueueNameMappingV0 {
    pub task_queue: Pubkey,
    pub name: String,
    pub bump_seed: u8,
}

impl AnchorAccount for TaskQueueNameMappingV0 {
    const ACCOUNT_NAME: &'static str = "TaskQueueNameMappingV0";
}

/// Per-authority cron job counter
#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct UserCronJobsV0 {
    pub min_cron_job_id: u32,
    pub next_cron_job_id: u32,
    pub authority: Pubkey,
    pub bump_seed: u8,
}

impl AnchorAccount for UserCronJobsV0 {
    const ACCOUNT_NAME: &'static str = "UserCronJobsV0";
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CronJobNameMappingV0 {
    pub cron_job: Pubkey,
    pub name: String,
    pub bump_seed: u8,
}

impl AnchorAccount for CronJobNameMappingV0 {
    const ACCOUNT_NAME: &'static str = "CronJobNameMappingV0";
}
