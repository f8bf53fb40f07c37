//! Wire types shared with the TukTuk and Cron programs
//!
//! Field order and widths are the programs' Borsh layout; lengths are u32 LE.

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

/// One instruction rewritten to reference the transaction's address table
#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CompiledInstructionV0 {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// A batch of instructions in the executor's compact form.
///
/// The address table is ordered writable signers, readonly signers, writable
/// non-signers, readonly non-signers; the three counts delimit the groups.
#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CompiledTransactionV0 {
    pub num_rw_signers: u8,
    pub num_ro_signers: u8,
    pub num_rw: u8,
    pub accounts: Vec<Pubkey>,
    pub instructions: Vec<CompiledInstructionV0>,
    /// Seed groups for PDAs that must sign instead of a wallet
    pub signer_seeds: Vec<Vec<Vec<u8>>>,
}

impl CompiledTransactionV0 {
    pub fn num_ro(&self) -> usize {
        self.accounts.len()
            - self.num_rw_signers as usize
            - self.num_ro_signers as usize
            - self.num_rw as usize
    }

    pub fn is_writable_index(&self, index: usize) -> bool {
        let signers = self.num_rw_signers as usize + self.num_ro_signers as usize;
        index < self.num_rw_signers as usize
            || (index >= signers && index < signers + self.num_rw as usize)
    }

    /// The address table as extra accounts for the submitting instruction.
    ///
    /// None of these sign the outer transaction; the executor signs for PDAs
    /// itself when the task runs.
    pub fn remaining_accounts(&self) -> Vec<AccountMeta> {
        self.accounts
            .iter()
            .enumerate()
            .map(|(index, pubkey)| {
                if self.is_writable_index(index) {
                    AccountMeta::new(*pubkey, false)
                } else {
                    AccountMeta::new_readonly(*pubkey, false)
                }
            })
            .collect()
    }

    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.serialize(&mut data)?;
        Ok(data)
    }
}

/// When a queued task becomes runnable
#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum TriggerV0 {
    Now,
    /// Unix timestamp in seconds
    Timestamp(i64),
}

/// Where the executor gets the transaction to run
#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum TransactionSourceV0 {
    CompiledV0(CompiledTransactionV0),
    /// Fetched from a remote server at crank time and checked against `signer`
    RemoteV0 { url: String, signer: Pubkey },
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct InitializeTaskQueueArgsV0 {
    pub min_crank_reward: u64,
    pub name: String,
    pub capacity: u16,
    pub lookup_tables: Vec<Pubkey>,
    pub stale_task_age: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct AddQueueAuthorityArgsV0 {}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct QueueTaskArgsV0 {
    pub id: u16,
    pub trigger: TriggerV0,
    pub transaction: TransactionSourceV0,
    pub crank_reward: Option<u64>,
    pub free_tasks: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct InitializeCronJobArgsV0 {
    pub schedule: String,
    pub name: String,
    pub free_tasks_per_transaction: u8,
    pub num_tasks_per_queue_call: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct AddCronTransactionArgsV0 {
    pub index: u32,
    pub transaction_source: TransactionSourceV0,
}
