// Allow items in this file to be unused. This is needed because it is imported from multiple
// compile targets (each of the integration tests), and some of the targets may not use all
// items in the file.
#![allow(unused)]

use crate::block_state_stub::{
    AccountStubIndex, BlockStateStub, ANONYMITY_REVOKER, CREDENTIAL_VALID_TO, IDENTITY_PROVIDER,
};
use crate::crypto_stub::{CryptoStub, VALID_PROOF};
use crate::interpreter_stub::InterpreterStub;
use assert_matches::assert_matches;
use scheduler::cost;
use scheduler::scheduler::BlockExecution;
use scheduler_types::types::accounts::{
    CredentialDeployment, CredentialDeploymentValues, CredentialPublicKeys,
    CredentialRegistrationId, Policy, Signature, VerifyKey,
};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::{FailureKind, TransactionSummary, TxResult, ValidResult};
use scheduler_types::types::parameters::ChainMetadata;
use scheduler_types::types::primitives::{
    Energy, Nonce, Timestamp, TransactionTime, UpdateSequenceNumber,
};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{
    AccountTransaction, CredentialWithMetadata, Payload, TransactionWithMetadata,
    UpdateWithMetadata, WithMetadata,
};
use scheduler_types::types::updates::{UpdateInstruction, UpdateKeys, UpdatePayload, UpdateType};
use std::collections::BTreeMap;

/// Slot time of the blocks in the tests.
pub const SLOT_TIME: Timestamp = Timestamp(1_000_000);

/// Expiry of the transactions in the tests, after the slot time.
pub const EXPIRY: TransactionTime = TransactionTime(2_000);

pub const MAX_BLOCK_ENERGY: Energy = Energy(3_000_000);

pub fn chain_metadata() -> ChainMetadata {
    ChainMetadata {
        slot_time: SLOT_TIME,
    }
}

/// Transaction from the account, signed so it verifies with the crypto stub.
pub fn transaction(
    stub: &BlockStateStub,
    sender: AccountStubIndex,
    nonce: u64,
    energy: u64,
    payload: &Payload,
) -> TransactionWithMetadata {
    let transaction = AccountTransaction::new(
        stub.address(sender),
        Nonce(nonce),
        Energy(energy),
        EXPIRY,
        payload,
        stub.account_signature(sender),
    );
    WithMetadata::new(transaction, TransactionTime(0))
}

/// Deployment of a credential that is valid against the block state stub. Different seeds
/// give different registration ids.
pub fn credential_deployment(seed: u8) -> CredentialWithMetadata {
    let credential = CredentialDeploymentValues {
        cred_id: CredentialRegistrationId(vec![seed; 48]),
        keys: CredentialPublicKeys {
            keys: [(0, VerifyKey(vec![b'c', seed]))].into_iter().collect(),
            threshold: 1,
        },
        policy: Policy {
            identity_provider: IDENTITY_PROVIDER,
            created_at: Timestamp(0),
            valid_to: CREDENTIAL_VALID_TO,
            revealed_attributes: BTreeMap::new(),
        },
        anonymity_revokers: vec![ANONYMITY_REVOKER],
        proofs: VALID_PROOF.to_vec(),
    };
    WithMetadata::new(
        CredentialDeployment {
            expiry: EXPIRY,
            credential,
        },
        TransactionTime(0),
    )
}

/// The key authorized by [`authorize_updates`].
pub fn update_key() -> VerifyKey {
    VerifyKey(b"update key".to_vec())
}

/// Authorize [`update_key`] alone to sign updates of every type.
pub fn authorize_updates(stub: &mut BlockStateStub) {
    for update_type in UpdateType::ALL {
        let keys = UpdateKeys {
            keys: [(0, update_key())].into_iter().collect(),
            threshold: 1,
        };
        stub.set_update_keys(update_type, keys);
    }
}

/// Chain update effective immediately, signed with [`update_key`].
pub fn update_instruction(seq_number: u64, payload: &UpdatePayload) -> UpdateWithMetadata {
    let mut update = UpdateInstruction::new(
        UpdateSequenceNumber(seq_number),
        TransactionTime(0),
        EXPIRY,
        payload,
    );
    update.signatures.insert(0, Signature(update_key().0));
    WithMetadata::new(update, TransactionTime(0))
}

/// Energy charged for checking the header of the transaction.
pub fn header_cost(transaction: &TransactionWithMetadata) -> Energy {
    cost::header_check(
        transaction.data.header.payload_size,
        transaction.data.num_signatures(),
    )
}

/// Dispatch the transaction in a block of its own.
pub fn dispatch(
    stub: &mut BlockStateStub,
    interpreter: &InterpreterStub,
    transaction: &TransactionWithMetadata,
) -> Option<TxResult> {
    let mut exec = BlockExecution::new(
        stub,
        interpreter,
        &CryptoStub,
        chain_metadata(),
        MAX_BLOCK_ENERGY,
    );
    exec.dispatch(transaction)
        .expect("transaction internal error")
}

/// Assert the result is a successful transaction, returning the summary and events.
pub fn assert_success(result: Option<TxResult>) -> (TransactionSummary, Vec<Event>) {
    let summary = assert_matches!(result, Some(TxResult::Valid(summary)) => summary);
    let events = assert_matches!(
        &summary.result,
        ValidResult::Success { events } => events.clone()
    );
    (summary, events)
}

/// Assert the result is a rejected transaction, returning the summary and reason.
pub fn assert_rejected(result: Option<TxResult>) -> (TransactionSummary, RejectReason) {
    let summary = assert_matches!(result, Some(TxResult::Valid(summary)) => summary);
    let reason = assert_matches!(&summary.result, ValidResult::Reject { reason } => reason.clone());
    (summary, reason)
}

pub fn assert_invalid(result: Option<TxResult>) -> FailureKind {
    assert_matches!(result, Some(TxResult::Invalid(failure)) => failure)
}
