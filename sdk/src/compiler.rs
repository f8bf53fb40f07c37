//! Compiles instructions into the executor's index-based transaction form

use crate::error::{Error, Result};
use crate::types::{CompiledInstructionV0, CompiledTransactionV0};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::collections::HashMap;

/// Largest address table a single-byte index can reach
pub const MAX_ACCOUNTS: usize = u8::MAX as usize + 1;

/// How an instruction uses an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    ReadonlyNonSigner,
    WritableNonSigner,
    ReadonlySigner,
    WritableSigner,
}

impl AccountRole {
    pub fn new(is_signer: bool, is_writable: bool) -> Self {
        match (is_signer, is_writable) {
            (true, true) => AccountRole::WritableSigner,
            (true, false) => AccountRole::ReadonlySigner,
            (false, true) => AccountRole::WritableNonSigner,
            (false, false) => AccountRole::ReadonlyNonSigner,
        }
    }

    pub fn is_signer(self) -> bool {
        matches!(self, AccountRole::ReadonlySigner | AccountRole::WritableSigner)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, AccountRole::WritableNonSigner | AccountRole::WritableSigner)
    }

    /// Position of the role's group in the address table
    fn rank(self) -> u8 {
        match self {
            AccountRole::WritableSigner => 0,
            AccountRole::ReadonlySigner => 1,
            AccountRole::WritableNonSigner => 2,
            AccountRole::ReadonlyNonSigner => 3,
        }
    }

    /// An account referenced under both roles takes the stronger of each flag.
    pub fn merge(self, other: AccountRole) -> Self {
        AccountRole::new(
            self.is_signer() || other.is_signer(),
            self.is_writable() || other.is_writable(),
        )
    }

    pub fn meta(self, pubkey: Pubkey) -> AccountMeta {
        if self.is_writable() {
            AccountMeta::new(pubkey, self.is_signer())
        } else {
            AccountMeta::new_readonly(pubkey, self.is_signer())
        }
    }
}

impl From<&AccountMeta> for AccountRole {
    fn from(meta: &AccountMeta) -> Self {
        AccountRole::new(meta.is_signer, meta.is_writable)
    }
}

/// A deduplicated account with its reconciled role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledAccountMeta {
    pub pubkey: Pubkey,
    pub role: AccountRole,
}

impl CompiledAccountMeta {
    pub fn is_signer(&self) -> bool {
        self.role.is_signer()
    }

    pub fn is_writable(&self) -> bool {
        self.role.is_writable()
    }
}

/// The ordered, deduplicated address table for a batch of instructions
#[derive(Debug, Clone, Default)]
pub struct CompiledAccounts {
    metas: Vec<CompiledAccountMeta>,
    indices: HashMap<Pubkey, u8>,
}

impl CompiledAccounts {
    /// Collect every account and program id referenced by `instructions`.
    ///
    /// Accounts appear in first-seen order (each instruction's accounts, then
    /// its program id as a readonly non-signer), are merged by OR of their
    /// signer and writable flags, then stably sorted into role groups.
    pub fn compile(instructions: &[Instruction]) -> Result<Self> {
        let mut metas: Vec<CompiledAccountMeta> = Vec::new();
        let mut positions: HashMap<Pubkey, usize> = HashMap::new();

        let mut add = |pubkey: Pubkey, role: AccountRole| match positions.get(&pubkey) {
            Some(&position) => {
                let existing = &mut metas[position];
                existing.role = existing.role.merge(role);
            }
            None => {
                positions.insert(pubkey, metas.len());
                metas.push(CompiledAccountMeta { pubkey, role });
            }
        };

        for ix in instructions {
            for account in &ix.accounts {
                add(account.pubkey, AccountRole::from(account));
            }
            add(ix.program_id, AccountRole::ReadonlyNonSigner);
        }

        if metas.len() > MAX_ACCOUNTS {
            return Err(Error::AccountLimit(metas.len()));
        }

        // sort_by_key is stable, so first-seen order survives within a group
        metas.sort_by_key(|meta| meta.role.rank());

        let indices = metas
            .iter()
            .enumerate()
            .map(|(index, meta)| (meta.pubkey, index as u8))
            .collect();

        Ok(Self { metas, indices })
    }

    pub fn metas(&self) -> &[CompiledAccountMeta] {
        &self.metas
    }

    pub fn addresses(&self) -> Vec<Pubkey> {
        self.metas.iter().map(|meta| meta.pubkey).collect()
    }

    pub fn index_of(&self, pubkey: &Pubkey) -> Option<u8> {
        self.indices.get(pubkey).copied()
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn count(&self, role: AccountRole) -> usize {
        self.metas.iter().filter(|meta| meta.role == role).count()
    }
}

/// Rewrite each instruction against the compiled address table.
///
/// One output per input, in order. Instructions are never deduplicated.
pub fn compile_instructions(
    accounts: &CompiledAccounts,
    instructions: &[Instruction],
) -> Result<Vec<CompiledInstructionV0>> {
    let lookup = |pubkey: &Pubkey| {
        accounts
            .index_of(pubkey)
            .ok_or(Error::IndexMappingMiss(*pubkey))
    };

    instructions
        .iter()
        .map(|ix| {
            Ok(CompiledInstructionV0 {
                program_id_index: lookup(&ix.program_id)?,
                accounts: ix
                    .accounts
                    .iter()
                    .map(|meta| lookup(&meta.pubkey))
                    .collect::<Result<Vec<_>>>()?,
                data: ix.data.clone(),
            })
        })
        .collect()
}

/// Compile `instructions` into the payload a task or cron transaction carries.
pub fn compile_transaction(
    instructions: &[Instruction],
    signer_seeds: Vec<Vec<Vec<u8>>>,
) -> Result<CompiledTransactionV0> {
    let accounts = CompiledAccounts::compile(instructions)?;
    let compiled = compile_instructions(&accounts, instructions)?;

    let count = |role: AccountRole| {
        let n = accounts.count(role);
        u8::try_from(n).map_err(|_| Error::AccountLimit(n))
    };

    Ok(CompiledTransactionV0 {
        num_rw_signers: count(AccountRole::WritableSigner)?,
        num_ro_signers: count(AccountRole::ReadonlySigner)?,
        num_rw: count(AccountRole::WritableNonSigner)?,
        accounts: accounts.addresses(),
        instructions: compiled,
        signer_seeds,
    })
}
