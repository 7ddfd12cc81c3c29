//! The contract interpreter and verifier used when building blocks offline.
//!
//! The block builder has no contract VM and no cryptographic backend. Contract modules
//! never validate, and the signatures and proofs of pending items are taken as checked by
//! the transaction pool that produced them.

use scheduler_interface::contract_interpreter_interface::{
    ContractInterpreter, InitContext, InitResult, InterpreterOutcome, ReceiveContext,
    ReceiveResult,
};
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::accounts::{
    BakerKeyProofs, BakerKeys, CredentialDeploymentValues, EncryptedAmount, EncryptionKey,
    Signature, VerifyKey,
};
use scheduler_types::types::contracts::{
    ContractState, InitName, ModuleInterface, Parameter, ReceiveName,
};
use scheduler_types::types::parameters::ChainMetadata;
use scheduler_types::types::primitives::{AccountAddress, Amount, Energy, Hash, ModuleRef};
use scheduler_types::types::transactions::{
    EncryptedAmountTransferData, SecToPubAmountTransferData,
};

/// Interpreter without a contract VM. No module is well-formed, so no instance ever
/// exists to be run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContracts;

impl ContractInterpreter for NoContracts {
    fn validate_module(&self, _module_ref: ModuleRef, _source: &[u8]) -> Option<ModuleInterface> {
        None
    }

    fn apply_init(
        &self,
        _module: &ModuleInterface,
        _chain_metadata: &ChainMetadata,
        _context: &InitContext,
        _init_name: &InitName,
        _parameter: &Parameter,
        _amount: Amount,
        _energy: Energy,
    ) -> InterpreterOutcome<InitResult> {
        InterpreterOutcome::Trap {
            energy_used: Energy::ZERO,
        }
    }

    fn apply_receive(
        &self,
        _module: &ModuleInterface,
        _chain_metadata: &ChainMetadata,
        _context: &ReceiveContext,
        _receive_name: &ReceiveName,
        _parameter: &Parameter,
        _amount: Amount,
        _state: &ContractState,
        _energy: Energy,
    ) -> InterpreterOutcome<ReceiveResult> {
        InterpreterOutcome::Trap {
            energy_used: Energy::ZERO,
        }
    }
}

/// Verifier accepting every signature and proof.
///
/// Encrypted amounts are represented transparently as 8 big-endian bytes of the amount,
/// so that combining them stays consistent within the ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolVerified;

fn transparent_amount(amount: &EncryptedAmount) -> u64 {
    let mut bytes = [0u8; 8];
    let len = amount.0.len().min(8);
    bytes[8 - len..].copy_from_slice(&amount.0[amount.0.len() - len..]);
    u64::from_be_bytes(bytes)
}

impl CryptoVerifier for PoolVerified {
    fn verify_signature(&self, _key: &VerifyKey, _message: &Hash, _signature: &Signature) -> bool {
        true
    }

    fn verify_baker_key_proofs(
        &self,
        _account: &AccountAddress,
        _keys: &BakerKeys,
        _proofs: &BakerKeyProofs,
    ) -> bool {
        true
    }

    fn verify_credential(&self, _credential: &CredentialDeploymentValues) -> bool {
        true
    }

    fn verify_encrypted_transfer(
        &self,
        _sender_key: &EncryptionKey,
        _receiver_key: &EncryptionKey,
        _input_amount: &EncryptedAmount,
        _data: &EncryptedAmountTransferData,
    ) -> bool {
        true
    }

    fn verify_transfer_to_public(
        &self,
        _key: &EncryptionKey,
        _input_amount: &EncryptedAmount,
        _data: &SecToPubAmountTransferData,
    ) -> bool {
        true
    }

    fn encrypt_amount_with_zero_randomness(&self, amount: Amount) -> EncryptedAmount {
        EncryptedAmount(amount.micro_ccd.to_be_bytes().to_vec())
    }

    fn aggregate_encrypted_amounts(
        &self,
        left: &EncryptedAmount,
        right: &EncryptedAmount,
    ) -> EncryptedAmount {
        let sum = transparent_amount(left).saturating_add(transparent_amount(right));
        EncryptedAmount(sum.to_be_bytes().to_vec())
    }
}
