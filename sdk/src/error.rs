//! Error types for the TukTuk SDK

use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A named queue, cron job or account does not exist on the ledger.
    #[error("{what} not found at {address}")]
    NotFound { what: &'static str, address: Pubkey },

    #[error("no available task slots in queue {0}")]
    QueueFull(Pubkey),

    /// Account data is shorter than the layout requires, or a length prefix
    /// runs past the end of the buffer.
    #[error("invalid account layout: `{field}` needs {needed} bytes, buffer has {actual}")]
    InvalidLayout {
        field: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("account discriminator mismatch for {account}")]
    DiscriminatorMismatch { account: &'static str },

    #[error("could not find a bump seed that derives an off-curve address")]
    DerivationExhausted,

    #[error("invalid seeds: {0}")]
    InvalidSeeds(&'static str),

    #[error("account {0} is missing from the compiled address table")]
    IndexMappingMiss(Pubkey),

    #[error("{0} accounts cannot be indexed by a single byte")]
    AccountLimit(usize),

    #[error("serialization failed: {0}")]
    Serialization(#[from] std::io::Error),

    #[error("task {task} still pending after {attempts} polls")]
    MonitorTimeout { task: Pubkey, attempts: u32 },

    #[error("rpc transport error: {0}")]
    Transport(#[source] Box<ClientError>),
}

impl Error {
    /// True when the failure came from the RPC transport rather than from the
    /// queue program's data. Callers decide whether to retry the whole flow.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub(crate) fn not_found(what: &'static str, address: Pubkey) -> Self {
        Error::NotFound { what, address }
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        Error::Transport(Box::new(err))
    }
}
