//! Chain parameters and block metadata visible to transaction execution.

use crate::types::primitives::{Amount, Energy, Timestamp};
use serde::{Deserialize, Serialize};

/// An exchange rate, `numerator / denominator`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub numerator: u64,
    pub denominator: u64,
}

impl ExchangeRate {
    /// Create an exchange rate. Returns `None` if the denominator is zero.
    pub fn new(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            None
        } else {
            Some(ExchangeRate {
                numerator,
                denominator,
            })
        }
    }
}

/// Chain parameters in effect for the block being executed.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChainParameters {
    /// Micro CCD per unit of energy.
    pub energy_rate: ExchangeRate,
    /// Minimum stake required to become and remain a baker.
    pub minimum_baker_stake: Amount,
    /// Maximum number of credential deployments (account creations) in one block.
    pub account_creation_limit: u16,
    /// Time in milliseconds before stake reductions and baker removals take effect.
    pub baker_cooldown_millis: u64,
}

/// Metadata of the block the transactions are executed in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChainMetadata {
    /// Nominal time of the block.
    pub slot_time: Timestamp,
}

/// Limits of a block under construction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockLimits {
    /// Maximum total size in bytes of the block items.
    pub max_block_size: u64,
    /// Maximum total energy the block items may use.
    pub max_block_energy: Energy,
}
