//! The genesis file: the initial ledger the block builder executes against.

use scheduler_types::types::accounts::{
    AccountBaker, AccountCredential, AccountEncryptedAmount, CredentialIndex, EncryptionKey,
};
use scheduler_types::types::parameters::ChainParameters;
use scheduler_types::types::primitives::{
    AccountAddress, AnonymityRevokerId, Amount, IdentityProviderId, Nonce, UpdateSequenceNumber,
};
use scheduler_types::types::updates::{UpdateKeys, UpdateType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Errors loading a genesis file.
#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Could not read genesis file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse genesis file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Account {0} appears more than once")]
    DuplicateAccount(AccountAddress),
    #[error("Account {0} has no credentials")]
    NoCredentials(AccountAddress),
    #[error("Account {0} requires more credentials to sign than it has")]
    InvalidThreshold(AccountAddress),
    #[error("The energy rate has a zero denominator")]
    InvalidEnergyRate,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisAccount {
    pub address: AccountAddress,
    pub balance: Amount,
    #[serde(default)]
    pub nonce: Nonce,
    pub credentials: BTreeMap<CredentialIndex, AccountCredential>,
    /// Number of credentials that must sign a transaction.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default)]
    pub encryption_key: EncryptionKey,
    #[serde(default)]
    pub encrypted_amount: AccountEncryptedAmount,
    #[serde(default)]
    pub baker: Option<AccountBaker>,
}

fn default_threshold() -> u8 {
    1
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    pub chain_parameters: ChainParameters,
    pub identity_providers: BTreeSet<IdentityProviderId>,
    pub anonymity_revokers: BTreeSet<AnonymityRevokerId>,
    /// Keys authorized to sign chain updates. Updates of a type without keys never verify.
    #[serde(default)]
    pub update_keys: BTreeMap<UpdateType, UpdateKeys>,
    /// Next sequence number of each update type. Types not listed start at 1.
    #[serde(default)]
    pub update_sequence_numbers: BTreeMap<UpdateType, UpdateSequenceNumber>,
    /// Accounts in order of their index.
    pub accounts: Vec<GenesisAccount>,
}

impl Genesis {
    /// Read and check a genesis file.
    pub fn from_file(path: &Path) -> Result<Self, GenesisError> {
        let bytes = std::fs::read(path)?;
        let genesis: Genesis = serde_json::from_slice(&bytes)?;
        genesis.check()?;
        Ok(genesis)
    }

    /// Check that the accounts are consistent.
    pub fn check(&self) -> Result<(), GenesisError> {
        if self.chain_parameters.energy_rate.denominator == 0 {
            return Err(GenesisError::InvalidEnergyRate);
        }
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account.address) {
                return Err(GenesisError::DuplicateAccount(account.address));
            }
            if account.credentials.is_empty() {
                return Err(GenesisError::NoCredentials(account.address));
            }
            if account.threshold == 0 || usize::from(account.threshold) > account.credentials.len()
            {
                return Err(GenesisError::InvalidThreshold(account.address));
            }
        }
        Ok(())
    }
}
