//! Primitive protocol values: energy, amounts, nonces, times, addresses and hashes.
//!
//! Arithmetic on [`Energy`] and [`Amount`] is checked or saturating. Values in the
//! protocol are never allowed to wrap.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Energy is the metered unit of computational cost charged for executing transactions.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Energy(pub u64);

impl Energy {
    pub const ZERO: Energy = Energy(0);

    pub fn checked_add(self, other: Energy) -> Option<Energy> {
        self.0.checked_add(other.0).map(Energy)
    }

    pub fn checked_sub(self, other: Energy) -> Option<Energy> {
        self.0.checked_sub(other.0).map(Energy)
    }

    pub fn saturating_add(self, other: Energy) -> Energy {
        Energy(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Energy) -> Energy {
        Energy(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Energy {
    fn from(energy: u64) -> Self {
        Energy(energy)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NRG", self.0)
    }
}

/// An amount of CCD, represented in micro CCD.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount {
    pub micro_ccd: u64,
}

impl Amount {
    pub const ZERO: Amount = Amount { micro_ccd: 0 };

    pub const fn from_micro_ccd(micro_ccd: u64) -> Self {
        Amount { micro_ccd }
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.micro_ccd
            .checked_add(other.micro_ccd)
            .map(Amount::from_micro_ccd)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.micro_ccd
            .checked_sub(other.micro_ccd)
            .map(Amount::from_micro_ccd)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount::from_micro_ccd(self.micro_ccd.saturating_sub(other.micro_ccd))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06} CCD",
            self.micro_ccd / 1_000_000,
            self.micro_ccd % 1_000_000
        )
    }
}

/// Per-account transaction counter. The first transaction of an account uses nonce 1.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(pub u64);

impl Nonce {
    pub const FIRST: Nonce = Nonce(1);

    /// The nonce following this one.
    pub fn next(self) -> Nonce {
        Nonce(self.0.saturating_add(1))
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Nonce::FIRST
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence number of chain-update instructions of one update type. Starts at 1.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateSequenceNumber(pub u64);

impl UpdateSequenceNumber {
    pub fn next(self) -> UpdateSequenceNumber {
        UpdateSequenceNumber(self.0.saturating_add(1))
    }
}

impl Default for UpdateSequenceNumber {
    fn default() -> Self {
        UpdateSequenceNumber(1)
    }
}

impl fmt::Display for UpdateSequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time in seconds since the unix epoch. Used for transaction expiry.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionTime(pub u64);

/// Time in milliseconds since the unix epoch.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The timestamp truncated to whole seconds.
    pub fn to_transaction_time(self) -> TransactionTime {
        TransactionTime(self.0 / 1000)
    }

    pub fn saturating_add_millis(self, millis: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(millis))
    }
}

impl From<TransactionTime> for Timestamp {
    fn from(time: TransactionTime) -> Self {
        Timestamp(time.0.saturating_mul(1000))
    }
}

/// Index of an account in the ledger. Bakers are identified by the index of their account.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountIndex(pub u64);

impl fmt::Display for AccountIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type BakerId = AccountIndex;

/// Identity provider on chain.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityProviderId(pub u32);

/// Anonymity revoker on chain.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonymityRevokerId(pub u32);

/// Defines a 32 byte newtype that is displayed and serialized as hex.
macro_rules! hex_bytes_32 {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
        pub struct $name(pub [u8; 32]);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let bytes = hex_bytes::deserialize(deserializer)?;
                let array = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
                    serde::de::Error::custom(format!(
                        "expected 32 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                Ok($name(array))
            }
        }
    };
}

hex_bytes_32!(
    /// Address of an account on chain.
    AccountAddress
);

hex_bytes_32!(
    /// SHA-256 hash.
    Hash
);

impl Hash {
    /// Compute the SHA-256 hash of the given bytes.
    pub fn compute(data: &[u8]) -> Hash {
        Hash(Sha256::digest(data).into())
    }
}

/// Hash identifying a transaction.
pub type TransactionHash = Hash;

/// Reference to a deployed module, the hash of its source.
pub type ModuleRef = Hash;

/// Address of a smart contract instance.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct ContractAddress {
    pub index: u64,
    pub subindex: u64,
}

impl ContractAddress {
    pub const fn new(index: u64, subindex: u64) -> Self {
        ContractAddress { index, subindex }
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.index, self.subindex)
    }
}

/// Either an account or a contract address.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "camelCase")]
pub enum Address {
    Account(AccountAddress),
    Contract(ContractAddress),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Account(address) => write!(f, "account {}", address),
            Address::Contract(address) => write!(f, "contract {}", address),
        }
    }
}

/// Serde helpers for representing variable length byte strings as hex.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let string = String::deserialize(deserializer)?;
        hex::decode(string).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_display() {
        assert_eq!(
            Amount::from_micro_ccd(1_000_042).to_string(),
            "1.000042 CCD"
        );
    }

    #[test]
    fn test_account_address_json() {
        let address = AccountAddress([7u8; 32]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(32)));
        let decoded: AccountAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, address);
        assert!(serde_json::from_str::<AccountAddress>("\"0707\"").is_err());
    }

    #[test]
    fn test_timestamp_to_transaction_time() {
        assert_eq!(
            Timestamp(12_999).to_transaction_time(),
            TransactionTime(12)
        );
        assert_eq!(Timestamp::from(TransactionTime(12)), Timestamp(12_000));
    }
}
