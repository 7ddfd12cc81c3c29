//! Account related types: keys, credentials, bakers and encrypted balances.

use crate::types::primitives::{
    hex_bytes, AccountAddress, Amount, AnonymityRevokerId, BakerId, IdentityProviderId,
    Timestamp, TransactionTime,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a credential on an account.
pub type CredentialIndex = u8;

/// Index of a key within a credential.
pub type KeyIndex = u8;

/// Index into the list of incoming encrypted amounts on an account.
pub type EncryptedAmountIndex = u64;

/// Public key used for verifying signatures.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifyKey(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// A signature, opaque to the scheduler.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// Credential registration id. Unique on chain.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRegistrationId(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl CredentialRegistrationId {
    /// The address of the account created by deploying a credential with this registration id.
    pub fn account_address(&self) -> AccountAddress {
        AccountAddress(crate::types::primitives::Hash::compute(&self.0).0)
    }
}

/// Public keys of a single credential together with the number of signatures required.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CredentialPublicKeys {
    pub keys: BTreeMap<KeyIndex, VerifyKey>,
    pub threshold: u8,
}

/// The keys that can sign for an account: the keys of each credential together with
/// the number of credentials that must sign.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountAccessStructure {
    pub keys: BTreeMap<CredentialIndex, CredentialPublicKeys>,
    pub threshold: u8,
}

/// Policy of a credential as attested by the identity provider.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Policy {
    /// Identity provider that issued the identity behind the credential.
    pub identity_provider: IdentityProviderId,
    /// Time when the credential was created.
    pub created_at: Timestamp,
    /// The credential is valid up to and including this time.
    pub valid_to: Timestamp,
    /// Revealed attributes.
    pub revealed_attributes: BTreeMap<u8, String>,
}

/// A credential deployed on an account.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountCredential {
    pub cred_id: CredentialRegistrationId,
    pub keys: CredentialPublicKeys,
    pub policy: Policy,
}

impl AccountCredential {
    /// Whether the credential is still valid at the given slot time.
    pub fn is_valid_at(&self, slot_time: Timestamp) -> bool {
        self.policy.valid_to >= slot_time
    }
}

/// Values of a credential submitted for deployment, creating a new account.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CredentialDeploymentValues {
    pub cred_id: CredentialRegistrationId,
    pub keys: CredentialPublicKeys,
    pub policy: Policy,
    /// Anonymity revokers that can revoke the anonymity of the credential holder.
    pub anonymity_revokers: Vec<AnonymityRevokerId>,
    /// Proofs of the validity of the credential. Opaque to the scheduler.
    #[serde(with = "hex_bytes")]
    pub proofs: Vec<u8>,
}

/// A credential deployment block item. Credential deployments have no sender and are not
/// charged.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CredentialDeployment {
    pub expiry: TransactionTime,
    pub credential: CredentialDeploymentValues,
}

/// Aggregation verify key of a baker. Must be unique among bakers.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregationVerifyKey(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// Public keys of a baker.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BakerKeys {
    pub election_verify_key: VerifyKey,
    pub signature_verify_key: VerifyKey,
    pub aggregation_verify_key: AggregationVerifyKey,
}

/// Proofs of knowledge of the private keys matching [`BakerKeys`]. Opaque to the scheduler.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BakerKeyProofs {
    #[serde(with = "hex_bytes")]
    pub proof_sig: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub proof_election: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub proof_aggregation: Vec<u8>,
}

/// A pending change to the stake of a baker, taking effect at a later time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum BakerPendingChange {
    /// The baker is removed.
    RemoveBaker { effective_time: Timestamp },
    /// The stake of the baker is reduced.
    ReduceStake {
        new_stake: Amount,
        effective_time: Timestamp,
    },
}

/// Baker state of an account.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountBaker {
    pub baker_id: BakerId,
    pub keys: BakerKeys,
    pub staked_amount: Amount,
    pub restake_earnings: bool,
    pub pending_change: Option<BakerPendingChange>,
}

/// An encrypted amount. Opaque to the scheduler.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedAmount(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// Public key for encrypting amounts sent to an account.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKey(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// Encrypted balance of an account.
///
/// The incoming amounts are numbered consecutively starting at `start_index`. Combining
/// amounts "up to index `i`" means the self amount together with the incoming amounts
/// with indices in `start_index..i`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountEncryptedAmount {
    pub start_index: EncryptedAmountIndex,
    pub incoming_amounts: Vec<EncryptedAmount>,
    pub self_amount: EncryptedAmount,
}

impl AccountEncryptedAmount {
    /// The index the next incoming amount will be given.
    pub fn next_index(&self) -> EncryptedAmountIndex {
        self.start_index
            .saturating_add(self.incoming_amounts.len() as EncryptedAmountIndex)
    }

    /// The incoming amounts that must be combined with the self amount to obtain the
    /// amount available up to `index`. Returns `None` if the index is out of range.
    pub fn incoming_up_to(&self, index: EncryptedAmountIndex) -> Option<&[EncryptedAmount]> {
        if index < self.start_index || index > self.next_index() {
            return None;
        }
        let count = usize::try_from(index - self.start_index).ok()?;
        self.incoming_amounts.get(..count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_up_to() {
        let encrypted = AccountEncryptedAmount {
            start_index: 3,
            incoming_amounts: vec![EncryptedAmount(vec![1]), EncryptedAmount(vec![2])],
            self_amount: EncryptedAmount(vec![0]),
        };
        assert_eq!(encrypted.next_index(), 5);
        assert_eq!(encrypted.incoming_up_to(2), None);
        assert_eq!(encrypted.incoming_up_to(3).map(<[_]>::len), Some(0));
        assert_eq!(encrypted.incoming_up_to(4).map(<[_]>::len), Some(1));
        assert_eq!(encrypted.incoming_up_to(5).map(<[_]>::len), Some(2));
        assert_eq!(encrypted.incoming_up_to(6), None);
    }

    #[test]
    fn test_credential_validity() {
        let credential = AccountCredential {
            cred_id: CredentialRegistrationId(vec![1; 48]),
            keys: CredentialPublicKeys {
                keys: BTreeMap::new(),
                threshold: 1,
            },
            policy: Policy {
                identity_provider: IdentityProviderId(0),
                created_at: Timestamp(0),
                valid_to: Timestamp(1000),
                revealed_attributes: BTreeMap::new(),
            },
        };
        assert!(credential.is_valid_at(Timestamp(1000)));
        assert!(!credential.is_valid_at(Timestamp(1001)));
    }
}
