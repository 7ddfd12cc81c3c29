//! Verification of transaction signatures against the keys of the sender account.
//!
//! Checking signatures is the most expensive part of the header check, and does not depend
//! on the order transactions are executed in, as long as the keys of the sender do not
//! change. Signatures of a batch of transactions are therefore verified in parallel ahead
//! of execution. The results are only used if the keys are unchanged at execution time.

use crate::block_state_interface::BlockStateQuery;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::accounts::AccountAccessStructure;
use scheduler_types::types::primitives::{Hash, TransactionHash};
use scheduler_types::types::transactions::{TransactionSignature, TransactionWithMetadata};
use std::collections::BTreeMap;

/// Verify the signatures of a transaction against the keys of an account.
///
/// The signature must be well formed. Every signature must be by a known key and verify.
/// Enough credentials must meet their own threshold to meet the threshold of the account.
pub fn verify_account_signature<CV: CryptoVerifier + ?Sized>(
    crypto: &CV,
    keys: &AccountAccessStructure,
    message: &Hash,
    signature: &TransactionSignature,
) -> bool {
    if !signature.is_well_formed() {
        return false;
    }
    let mut signed_credentials = 0usize;
    for (cred_index, signatures) in &signature.signatures {
        let Some(credential_keys) = keys.keys.get(cred_index) else {
            return false;
        };
        for (key_index, sig) in signatures {
            let Some(key) = credential_keys.keys.get(key_index) else {
                return false;
            };
            if !crypto.verify_signature(key, message, sig) {
                return false;
            }
        }
        if signatures.len() >= usize::from(credential_keys.threshold) {
            signed_credentials += 1;
        }
    }
    signed_credentials >= usize::from(keys.threshold)
}

/// Results of verifying signatures ahead of execution.
#[derive(Debug, Clone, Default)]
pub struct SignatureCache {
    /// The keys each transaction was verified against, and the result.
    results: BTreeMap<TransactionHash, (AccountAccessStructure, bool)>,
}

impl SignatureCache {
    /// The result of verifying the transaction, if it was verified against `keys`.
    pub fn lookup(&self, hash: &TransactionHash, keys: &AccountAccessStructure) -> Option<bool> {
        match self.results.get(hash) {
            Some((verified_keys, valid)) if verified_keys == keys => Some(*valid),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Verify the signatures of the transactions in parallel, against the keys the senders
/// have in `block_state`. Transactions whose sender does not exist are skipped.
pub fn prevalidate_signatures<BSQ, CV>(
    block_state: &BSQ,
    crypto: &CV,
    transactions: &[&TransactionWithMetadata],
) -> SignatureCache
where
    BSQ: BlockStateQuery,
    CV: CryptoVerifier,
{
    let candidates: Vec<_> = transactions
        .iter()
        .filter_map(|transaction| {
            let sender = block_state
                .account_by_address(&transaction.data.header.sender)
                .ok()?;
            let keys = block_state.account_verification_keys(&sender);
            Some((
                transaction.hash,
                keys,
                transaction.data.sign_hash(),
                &transaction.data.signature,
            ))
        })
        .collect();

    let results = candidates
        .into_par_iter()
        .map(|(hash, keys, message, signature)| {
            let valid = verify_account_signature(crypto, &keys, &message, signature);
            (hash, (keys, valid))
        })
        .collect();
    SignatureCache { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_types::types::accounts::{
        BakerKeyProofs, BakerKeys, CredentialDeploymentValues, CredentialPublicKeys,
        EncryptedAmount, EncryptionKey, Signature, VerifyKey,
    };
    use scheduler_types::types::primitives::{AccountAddress, Amount};
    use scheduler_types::types::transactions::{
        EncryptedAmountTransferData, SecToPubAmountTransferData,
    };

    /// Signatures are valid when they equal the key.
    struct KeyEqualsSignature;

    impl CryptoVerifier for KeyEqualsSignature {
        fn verify_signature(&self, key: &VerifyKey, _: &Hash, signature: &Signature) -> bool {
            key.0 == signature.0
        }

        fn verify_baker_key_proofs(
            &self,
            _: &AccountAddress,
            _: &BakerKeys,
            _: &BakerKeyProofs,
        ) -> bool {
            false
        }

        fn verify_credential(&self, _: &CredentialDeploymentValues) -> bool {
            false
        }

        fn verify_encrypted_transfer(
            &self,
            _: &EncryptionKey,
            _: &EncryptionKey,
            _: &EncryptedAmount,
            _: &EncryptedAmountTransferData,
        ) -> bool {
            false
        }

        fn verify_transfer_to_public(
            &self,
            _: &EncryptionKey,
            _: &EncryptedAmount,
            _: &SecToPubAmountTransferData,
        ) -> bool {
            false
        }

        fn encrypt_amount_with_zero_randomness(&self, _: Amount) -> EncryptedAmount {
            EncryptedAmount::default()
        }

        fn aggregate_encrypted_amounts(
            &self,
            left: &EncryptedAmount,
            _: &EncryptedAmount,
        ) -> EncryptedAmount {
            left.clone()
        }
    }

    fn credential_keys(keys: &[u8], threshold: u8) -> CredentialPublicKeys {
        CredentialPublicKeys {
            keys: keys
                .iter()
                .enumerate()
                .map(|(index, key)| (index as u8, VerifyKey(vec![*key])))
                .collect(),
            threshold,
        }
    }

    fn signature(sigs: &[(u8, u8, u8)]) -> TransactionSignature {
        let mut signature = TransactionSignature::default();
        for (cred, key, sig) in sigs {
            signature
                .signatures
                .entry(*cred)
                .or_default()
                .insert(*key, Signature(vec![*sig]));
        }
        signature
    }

    fn two_of_two() -> AccountAccessStructure {
        AccountAccessStructure {
            keys: [(0, credential_keys(&[1, 2], 2)), (1, credential_keys(&[3], 1))]
                .into_iter()
                .collect(),
            threshold: 2,
        }
    }

    /// Both credentials meeting their thresholds satisfy the account threshold.
    #[test]
    fn test_signature_meets_thresholds() {
        let message = Hash::compute(b"message");
        let sig = signature(&[(0, 0, 1), (0, 1, 2), (1, 0, 3)]);
        assert!(verify_account_signature(&KeyEqualsSignature, &two_of_two(), &message, &sig));
    }

    /// A credential below its own threshold does not count towards the account threshold.
    #[test]
    fn test_signature_credential_below_threshold() {
        let message = Hash::compute(b"message");
        let sig = signature(&[(0, 0, 1), (1, 0, 3)]);
        assert!(!verify_account_signature(&KeyEqualsSignature, &two_of_two(), &message, &sig));
    }

    /// Any bad signature or unknown key invalidates the transaction.
    #[test]
    fn test_signature_bad_or_unknown() {
        let message = Hash::compute(b"message");
        let bad = signature(&[(0, 0, 1), (0, 1, 9), (1, 0, 3)]);
        assert!(!verify_account_signature(&KeyEqualsSignature, &two_of_two(), &message, &bad));
        let unknown = signature(&[(0, 0, 1), (0, 1, 2), (1, 0, 3), (2, 0, 4)]);
        assert!(!verify_account_signature(&KeyEqualsSignature, &two_of_two(), &message, &unknown));
    }

    /// More signatures by one credential than fit the encoding never verify, even when each
    /// of them does.
    #[test]
    fn test_signature_not_well_formed() {
        let message = Hash::compute(b"message");
        let keys = AccountAccessStructure {
            keys: [(0, credential_keys(&[7; 256], 1))].into_iter().collect(),
            threshold: 1,
        };
        let sigs: Vec<_> = (0..=255u8).map(|key| (0, key, 7)).collect();
        assert!(!verify_account_signature(
            &KeyEqualsSignature,
            &keys,
            &message,
            &signature(&sigs)
        ));
        assert!(verify_account_signature(
            &KeyEqualsSignature,
            &keys,
            &message,
            &signature(&sigs[..255])
        ));
    }

    /// Cached results are only used for the keys they were computed against.
    #[test]
    fn test_cache_lookup_requires_same_keys() {
        let hash = Hash::compute(b"transaction");
        let mut cache = SignatureCache::default();
        cache.results.insert(hash, (two_of_two(), true));
        assert_eq!(cache.lookup(&hash, &two_of_two()), Some(true));
        let mut changed = two_of_two();
        changed.threshold = 1;
        assert_eq!(cache.lookup(&hash, &changed), None);
        assert_eq!(cache.lookup(&Hash::compute(b"other"), &two_of_two()), None);
    }
}
