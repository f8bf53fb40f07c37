//! Service configuration

use anyhow::{anyhow, Context, Result};
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::str::FromStr;
use std::time::Duration;
use tuktuk_sdk::{CronConfig, MonitorConfig, QueueConfig};

/// What the service submits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Queue one memo task to run now and wait for it
    Task,
    /// Register a cron job that writes the memo on a schedule
    Cron,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "task" => Ok(Mode::Task),
            "cron" => Ok(Mode::Cron),
            other => Err(anyhow!("Unknown mode '{}', expected 'task' or 'cron'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// RPC endpoint to connect to
    pub rpc_url: String,

    /// Keypair that pays for and signs every submission
    pub wallet_path: String,

    /// Text written by the memo
    pub message: String,

    pub queue: QueueConfig,
    pub cron: CronConfig,
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8899".to_string(),
            wallet_path: "~/.config/solana/id.json".to_string(),
            message: "Hello TukTuk!".to_string(),
            queue: QueueConfig::default(),
            cron: CronConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            config.rpc_url = rpc_url;
        }
        if let Ok(wallet_path) = std::env::var("WALLET_PATH") {
            config.wallet_path = wallet_path;
        }
        if let Ok(message) = std::env::var("MEMO_MESSAGE") {
            config.message = message;
        }
        if let Ok(name) = std::env::var("QUEUE_NAME") {
            config.queue.name = name;
        }
        if let Ok(name) = std::env::var("CRON_NAME") {
            config.cron.name = name;
        }
        if let Ok(schedule) = std::env::var("CRON_SCHEDULE") {
            config.cron.schedule = schedule;
        }

        config.queue.create_if_missing = env_parse("CREATE_QUEUE", config.queue.create_if_missing)?;
        config.cron.funding_lamports = env_parse("FUNDING_LAMPORTS", config.cron.funding_lamports)?;
        config.monitor.poll_interval =
            Duration::from_secs(env_parse("POLL_INTERVAL", config.monitor.poll_interval.as_secs())?);
        config.monitor.max_attempts = env_parse("MAX_POLLS", config.monitor.max_attempts)?;

        Ok(config)
    }

    /// Load the wallet keypair, expanding a leading `~`
    pub fn load_keypair(&self) -> Result<Keypair> {
        let wallet_path = shellexpand::tilde(&self.wallet_path).to_string();
        read_keypair_file(&wallet_path)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Failed to load wallet keypair from {}", wallet_path))
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("Invalid {}", key)),
        Err(_) => Ok(default),
    }
}
