//! In-memory ledger and account fixtures for tests of code built on the SDK

use crate::client::Ledger;
use crate::error::{Error, Result};
use crate::state::{account_discriminator, AnchorAccount, TaskQueue, TaskQueueLayout};
use anchor_lang::AnchorSerialize;
use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};
use std::collections::HashMap;
use std::sync::Mutex;

/// Ledger backed by a map. Sent transactions are recorded, not applied.
pub struct InMemoryLedger {
    payer: Pubkey,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    sent: Mutex<Vec<Vec<Instruction>>>,
    /// Reads left before an account disappears, as if the executor closed it
    closes_after: Mutex<HashMap<Pubkey, u32>>,
    failing_reads: Mutex<u32>,
    /// Newest first
    history: Mutex<HashMap<Pubkey, Vec<Signature>>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            payer: Pubkey::new_unique(),
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            closes_after: Mutex::new(HashMap::new()),
            failing_reads: Mutex::new(0),
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        lock(&self.accounts).insert(address, data);
    }

    pub fn close_after_reads(&self, address: Pubkey, reads: u32) {
        lock(&self.closes_after).insert(address, reads);
    }

    pub fn fail_next_reads(&self, count: u32) {
        *lock(&self.failing_reads) = count;
    }

    /// Record `signature` as the newest transaction touching `address`
    pub fn record_signature(&self, address: Pubkey, signature: Signature) {
        lock(&self.history).entry(address).or_default().insert(0, signature);
    }

    pub fn sent(&self) -> Vec<Vec<Instruction>> {
        lock(&self.sent).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn payer(&self) -> Pubkey {
        self.payer
    }

    async fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        {
            let mut failing = lock(&self.failing_reads);
            if *failing > 0 {
                *failing -= 1;
                return Err(Error::from(ClientError::from(ClientErrorKind::Custom(
                    "connection reset".to_string(),
                ))));
            }
        }

        let mut closes_after = lock(&self.closes_after);
        if let Some(remaining) = closes_after.get_mut(address) {
            if *remaining == 0 {
                closes_after.remove(address);
                lock(&self.accounts).remove(address);
            } else {
                *remaining -= 1;
            }
        }
        Ok(lock(&self.accounts).get(address).cloned())
    }

    async fn send_instructions(&self, instructions: &[Instruction]) -> Result<Signature> {
        lock(&self.sent).push(instructions.to_vec());
        Ok(Signature::new_unique())
    }

    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<Signature>> {
        Ok(lock(&self.history)
            .get(address)
            .map(|signatures| signatures.iter().take(limit).copied().collect())
            .unwrap_or_default())
    }
}

/// Raw `TaskQueueV0` account bytes at the documented offsets
pub fn task_queue_data(capacity: u16, bitmap: &[u8]) -> Vec<u8> {
    let layout = TaskQueueLayout::V0;
    let mut data = vec![0u8; layout.task_bitmap + bitmap.len()];
    data[..8].copy_from_slice(&account_discriminator(TaskQueue::ACCOUNT_NAME));
    data[layout.capacity..layout.capacity + 2].copy_from_slice(&capacity.to_le_bytes());
    data[layout.task_bitmap_len..layout.task_bitmap_len + 4]
        .copy_from_slice(&(bitmap.len() as u32).to_le_bytes());
    data[layout.task_bitmap..].copy_from_slice(bitmap);
    data
}

/// Discriminator followed by the Borsh body
pub fn anchor_account_data<T: AnchorAccount + AnchorSerialize>(account: &T) -> Result<Vec<u8>> {
    let mut data = T::discriminator().to_vec();
    account.serialize(&mut data)?;
    Ok(data)
}
