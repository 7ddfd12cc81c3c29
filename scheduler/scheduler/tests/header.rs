//! Tests of the checks made on the header of account transactions.

use crate::block_state_stub::{AccountStubIndex, BlockStateStub};
use crate::crypto_stub::CryptoStub;
use crate::interpreter_stub::InterpreterStub;
use crate::utils::{
    assert_invalid, assert_rejected, chain_metadata, dispatch, header_cost, transaction,
    SLOT_TIME,
};
use assert_matches::assert_matches;
use scheduler::cost;
use scheduler::scheduler::BlockExecution;
use scheduler_types::types::accounts::Signature;
use scheduler_types::types::execution::FailureKind;
use scheduler_types::types::primitives::{
    AccountAddress, Amount, Energy, Nonce, TransactionTime,
};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{
    AccountTransaction, EncodedPayload, Payload, TransactionWithMetadata, WithMetadata,
};

mod utils;

/// Transfer of one micro CCD to the account itself.
fn self_transfer(
    stub: &BlockStateStub,
    sender: AccountStubIndex,
    nonce: u64,
    energy: u64,
) -> TransactionWithMetadata {
    let payload = Payload::Transfer {
        to_address: stub.address(sender),
        amount: Amount::from_micro_ccd(1),
    };
    transaction(stub, sender, nonce, energy, &payload)
}

/// Change the transaction and recompute its metadata.
fn modify(
    transaction: TransactionWithMetadata,
    change: impl FnOnce(&mut AccountTransaction),
) -> TransactionWithMetadata {
    let mut data = transaction.data;
    change(&mut data);
    WithMetadata::new(data, TransactionTime(0))
}

/// Dispatch the transaction and assert it is invalid without changing the sender.
fn assert_invalid_unchanged(
    stub: &mut BlockStateStub,
    sender: AccountStubIndex,
    transaction: &TransactionWithMetadata,
) -> FailureKind {
    let balance = stub.balance(sender);
    let nonce = stub.nonce(sender);
    let failure = assert_invalid(dispatch(stub, &InterpreterStub::new(), transaction));
    assert_eq!(stub.balance(sender), balance);
    assert_eq!(stub.nonce(sender), nonce);
    assert_eq!(stub.execution_costs, Amount::ZERO);
    failure
}

/// The declared payload size must match the payload.
#[test]
fn test_invalid_payload_size() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.header.payload_size += 1
    });

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::InvalidPayloadSize);
}

/// The deposit must cover checking the header.
#[test]
fn test_deposit_insufficient() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let unfunded = self_transfer(&stub, sender, 1, 0);
    let tx = self_transfer(&stub, sender, 1, header_cost(&unfunded).0 - 1);

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::DepositInsufficient);
}

/// A deposit of exactly the header cost passes the header check.
#[test]
fn test_deposit_covers_only_header() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let unfunded = self_transfer(&stub, sender, 1, 0);
    let energy = header_cost(&unfunded);
    let tx = self_transfer(&stub, sender, 1, energy.0);

    let (summary, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
    assert_eq!(reason, RejectReason::OutOfEnergy);
    assert_eq!(summary.energy_cost, energy);
    assert_eq!(stub.nonce(sender), Nonce(2));
}

#[test]
fn test_unknown_sender() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.header.sender = AccountAddress([9u8; 32])
    });

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::UnknownAccount);
}

/// The expiry is compared with the slot time in seconds.
#[test]
fn test_expired_transaction() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let slot_seconds = SLOT_TIME.to_transaction_time();

    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.header.expiry = TransactionTime(slot_seconds.0 - 1)
    });
    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::ExpiredTransaction);

    // Expiring in the slot of the block is not expired.
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.header.expiry = slot_seconds
    });
    assert_matches!(
        dispatch(&mut stub, &InterpreterStub::new(), &tx),
        Some(scheduler_types::types::execution::TxResult::Valid(_))
    );
}

#[test]
fn test_no_valid_credential() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    stub.expire_credentials(sender, SLOT_TIME);
    let tx = self_transfer(&stub, sender, 1, 1000);

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::NoValidCredential);
}

/// The sender must be able to pay for the whole deposit.
#[test]
fn test_insufficient_funds() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(999));
    let tx = self_transfer(&stub, sender, 1, 1000);

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::InsufficientFunds);
}

/// The failure carries the nonce the sender should have used.
#[test]
fn test_non_sequential_nonce() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    stub.set_nonce(sender, Nonce(4));

    for nonce in [3, 5] {
        let tx = self_transfer(&stub, sender, nonce, 1000);
        let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
        assert_eq!(failure, FailureKind::NonSequentialNonce(Nonce(4)));
    }
}

#[test]
fn test_incorrect_signature() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let other = stub.create_account(Amount::ZERO);

    // Signed with the key of another account.
    let signature = stub.account_signature(other);
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| tx.signature = signature);
    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::IncorrectSignature);

    // No signatures at all.
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.signature.signatures.clear()
    });
    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::IncorrectSignature);

    // An extra signature by an unknown key.
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        if let Some(signatures) = tx.signature.signatures.get_mut(&0) {
            signatures.insert(7, Signature(b"unknown".to_vec()));
        }
    });
    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::IncorrectSignature);
}

/// The payload size is checked before the deposit.
#[test]
fn test_header_check_order() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::ZERO);
    let tx = modify(self_transfer(&stub, sender, 3, 1), |tx| {
        tx.header.payload_size = 0
    });

    let failure = assert_invalid_unchanged(&mut stub, sender, &tx);
    assert_eq!(failure, FailureKind::InvalidPayloadSize);
}

/// A payload that does not decode is rejected, and only checking the header is charged.
#[test]
fn test_undecodable_payload() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let tx = modify(self_transfer(&stub, sender, 1, 1000), |tx| {
        tx.payload = EncodedPayload(vec![255]);
        tx.header.payload_size = 1;
    });

    let (summary, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
    let energy = cost::header_check(1, 1);
    assert_eq!(reason, RejectReason::SerializationFailure);
    assert_eq!(summary.transaction_type, None);
    assert_eq!(summary.energy_cost, energy);
    assert_eq!(stub.balance(sender), Amount::from_micro_ccd(10_000 - energy.0));
    assert_eq!(stub.nonce(sender), Nonce(2));
}

/// Without energy left in the block for checking the header, the transaction is not
/// executed and the state is unchanged.
#[test]
fn test_block_energy_exhausted_by_header() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let tx = self_transfer(&stub, sender, 1, 1000);

    let interpreter = InterpreterStub::new();
    let mut exec = BlockExecution::new(
        &mut stub,
        &interpreter,
        &CryptoStub,
        chain_metadata(),
        Energy(10),
    );
    let result = exec.dispatch(&tx).expect("transaction internal error");
    assert_eq!(result, None);
    assert_eq!(exec.energy_used(), Energy::ZERO);
    assert_eq!(stub.nonce(sender), Nonce(1));
}

/// Block energy running out while the payload executes leaves the state unchanged.
#[test]
fn test_block_energy_exhausted_by_payload() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let receiver = stub.create_account(Amount::ZERO);
    let payload = Payload::Transfer {
        to_address: stub.address(receiver),
        amount: Amount::from_micro_ccd(5),
    };
    let tx = transaction(&stub, sender, 1, 1000, &payload);
    let max_block_energy = header_cost(&tx).saturating_add(Energy(10));

    let interpreter = InterpreterStub::new();
    let mut exec = BlockExecution::new(
        &mut stub,
        &interpreter,
        &CryptoStub,
        chain_metadata(),
        max_block_energy,
    );
    let result = exec.dispatch(&tx).expect("transaction internal error");
    assert_eq!(result, None);
    assert_eq!(stub.balance(sender), Amount::from_micro_ccd(10_000));
    assert_eq!(stub.balance(receiver), Amount::ZERO);
    assert_eq!(stub.nonce(sender), Nonce(1));
}
