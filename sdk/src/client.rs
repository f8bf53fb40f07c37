//! Ledger access used by the submission flows

use crate::error::Result;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use tracing::debug;

/// Reads and writes against the ledger.
///
/// Each call is atomic on its own; a sequence of calls is not. Implementations
/// own retries, fee estimation and confirmation.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fee payer and signing authority for submitted transactions
    fn payer(&self) -> Pubkey;

    /// Raw account data, or `None` if the account does not exist
    async fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Sign, send and confirm one transaction made of `instructions`
    async fn send_instructions(&self, instructions: &[Instruction]) -> Result<Signature>;

    /// Up to `limit` signatures of transactions touching `address`, newest
    /// first. Ledgers without history return none.
    async fn signatures_for_address(
        &self,
        _address: &Pubkey,
        _limit: usize,
    ) -> Result<Vec<Signature>> {
        Ok(Vec::new())
    }
}

/// JSON-RPC ledger signing with a single keypair
pub struct RpcLedger {
    rpc: RpcClient,
    keypair: Keypair,
}

impl RpcLedger {
    pub fn new(rpc_url: &str, keypair: Keypair) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
            keypair,
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn payer(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn send_instructions(&self, instructions: &[Instruction]) -> Result<Signature> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.keypair.pubkey()),
            &[&self.keypair],
            recent_blockhash,
        );
        debug!("Sending transaction with {} instructions", instructions.len());
        let signature = self.rpc.send_and_confirm_transaction(&transaction).await?;
        Ok(signature)
    }

    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<Signature>> {
        let statuses = self.rpc.get_signatures_for_address(address).await?;
        Ok(statuses
            .iter()
            .take(limit)
            .filter_map(|status| status.signature.parse().ok())
            .collect())
    }
}
