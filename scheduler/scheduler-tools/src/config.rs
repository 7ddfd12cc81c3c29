//! Configuration of the block builder: command line flags, optionally on top of a TOML
//! file. Flags given on the command line take precedence over the file.

use scheduler_types::types::parameters::{BlockLimits, ChainMetadata};
use scheduler_types::types::primitives::{Energy, Timestamp};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use structopt::StructOpt;

/// Maximum total size of the items of a block, in bytes.
pub const DEFAULT_MAX_BLOCK_SIZE: u64 = 4_194_304;

/// Maximum total energy of the items of a block.
pub const DEFAULT_MAX_BLOCK_ENERGY: u64 = 3_000_000;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "block-builder",
    about = "Select and execute the pending items of a block against a genesis ledger"
)]
pub struct BlockBuilderCli {
    #[structopt(
        long = "genesis",
        help = "JSON file with the accounts and chain parameters of the ledger",
        env = "SCHEDULER_BLOCK_BUILDER_GENESIS"
    )]
    pub genesis: PathBuf,
    #[structopt(
        long = "pending",
        help = "JSON file with the pending block items",
        env = "SCHEDULER_BLOCK_BUILDER_PENDING"
    )]
    pub pending: PathBuf,
    #[structopt(
        long = "config",
        help = "TOML file with the block limits and slot time",
        env = "SCHEDULER_BLOCK_BUILDER_CONFIG"
    )]
    pub config: Option<PathBuf>,
    #[structopt(long = "max-block-size", help = "Maximum total size of the block items in bytes")]
    pub max_block_size: Option<u64>,
    #[structopt(long = "max-block-energy", help = "Maximum total energy of the block items")]
    pub max_block_energy: Option<u64>,
    #[structopt(
        long = "slot-time",
        help = "Slot time of the block in milliseconds since the unix epoch. Defaults to the \
                current time."
    )]
    pub slot_time: Option<u64>,
    #[structopt(long = "debug", short = "d", help = "Debug mode")]
    pub debug: bool,
    #[structopt(long = "trace", help = "Trace mode")]
    pub trace: bool,
    #[structopt(long = "no-log-timestamp", help = "Do not output timestamp in log output")]
    pub no_log_timestamp: bool,
}

/// Errors reading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("The system time is before the unix epoch")]
    SystemTime,
}

/// The configuration file. Every setting is optional.
#[derive(Deserialize, Debug, Default, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub max_block_size: Option<u64>,
    pub max_block_energy: Option<u64>,
    pub slot_time: Option<u64>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// The resolved configuration of a block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BlockConfig {
    pub limits: BlockLimits,
    pub chain_metadata: ChainMetadata,
}

impl BlockConfig {
    /// Resolve the configuration from the command line and the configuration file it
    /// names, if any.
    pub fn resolve(cli: &BlockBuilderCli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };
        let slot_time = match cli.slot_time.or(file.slot_time) {
            Some(slot_time) => slot_time,
            None => current_time_millis()?,
        };
        Ok(BlockConfig {
            limits: BlockLimits {
                max_block_size: cli
                    .max_block_size
                    .or(file.max_block_size)
                    .unwrap_or(DEFAULT_MAX_BLOCK_SIZE),
                max_block_energy: Energy(
                    cli.max_block_energy
                        .or(file.max_block_energy)
                        .unwrap_or(DEFAULT_MAX_BLOCK_ENERGY),
                ),
            },
            chain_metadata: ChainMetadata {
                slot_time: Timestamp(slot_time),
            },
        })
    }
}

fn current_time_millis() -> Result<u64, ConfigError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ConfigError::SystemTime)?;
    Ok(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
