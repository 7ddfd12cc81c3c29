//! Interface to cryptographic verification.
//!
//! Every check is an opaque predicate to the scheduler. Implementations must be
//! deterministic, and must be [`Sync`] since signatures are verified in parallel ahead of
//! execution.

use scheduler_types::types::accounts::{
    BakerKeyProofs, BakerKeys, CredentialDeploymentValues, EncryptedAmount, EncryptionKey,
    Signature, VerifyKey,
};
use scheduler_types::types::primitives::{AccountAddress, Amount, Hash};
use scheduler_types::types::transactions::{
    EncryptedAmountTransferData, SecToPubAmountTransferData,
};

pub trait CryptoVerifier: Sync {
    /// Verify a signature on a hash.
    fn verify_signature(&self, key: &VerifyKey, message: &Hash, signature: &Signature) -> bool;

    /// Verify the proofs of knowledge of the private baker keys, bound to the account.
    fn verify_baker_key_proofs(
        &self,
        account: &AccountAddress,
        keys: &BakerKeys,
        proofs: &BakerKeyProofs,
    ) -> bool;

    /// Verify the proofs of a credential deployment.
    fn verify_credential(&self, credential: &CredentialDeploymentValues) -> bool;

    /// Verify the proof of an encrypted transfer, given the encryption keys of sender and
    /// receiver and the combined input amount of the sender.
    fn verify_encrypted_transfer(
        &self,
        sender_key: &EncryptionKey,
        receiver_key: &EncryptionKey,
        input_amount: &EncryptedAmount,
        data: &EncryptedAmountTransferData,
    ) -> bool;

    /// Verify the proof of a transfer from the encrypted to the public balance.
    fn verify_transfer_to_public(
        &self,
        key: &EncryptionKey,
        input_amount: &EncryptedAmount,
        data: &SecToPubAmountTransferData,
    ) -> bool;

    /// Encrypt a public amount with zero randomness, so that everybody can check the
    /// encryption.
    fn encrypt_amount_with_zero_randomness(&self, amount: Amount) -> EncryptedAmount;

    /// Combine two encrypted amounts into an encryption of their sum.
    fn aggregate_encrypted_amounts(
        &self,
        left: &EncryptedAmount,
        right: &EncryptedAmount,
    ) -> EncryptedAmount;
}
