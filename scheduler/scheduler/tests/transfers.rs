//! Tests of transfers between accounts: simple transfers, transfers with a release
//! schedule and data registration.

use crate::block_state_stub::BlockStateStub;
use crate::interpreter_stub::InterpreterStub;
use crate::utils::{
    assert_rejected, assert_success, dispatch, header_cost, transaction, SLOT_TIME,
};
use scheduler::block_state_interface::BlockStateQuery;
use scheduler::cost;
use scheduler_types::types::events::Event;
use scheduler_types::types::primitives::{Address, Amount, Energy, Nonce, Timestamp};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{Payload, TransactionType};

mod utils;

/// A simple transfer moves the amount and charges the sender for the energy used, with
/// the nonce incremented once.
#[test]
fn test_transfer() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(1000));
    let receiver = stub.create_account(Amount::ZERO);
    stub.set_nonce(sender, Nonce(5));

    let payload = Payload::Transfer {
        to_address: stub.address(receiver),
        amount: Amount::from_micro_ccd(100),
    };
    let tx = transaction(&stub, sender, 5, 600, &payload);
    let (summary, events) = assert_success(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    let energy = header_cost(&tx).0 + cost::SIMPLE_TRANSFER.0;
    assert_eq!(summary.energy_cost, Energy(energy));
    assert_eq!(summary.cost, Amount::from_micro_ccd(energy));
    assert_eq!(summary.sender, Some(stub.address(sender)));
    assert_eq!(summary.transaction_type, Some(TransactionType::Transfer));
    assert_eq!(summary.index, 0);
    assert_eq!(
        events,
        vec![Event::Transferred {
            from: Address::Account(stub.address(sender)),
            amount: Amount::from_micro_ccd(100),
            to: stub.address(receiver),
        }]
    );
    assert_eq!(
        stub.balance(sender),
        Amount::from_micro_ccd(1000 - 100 - energy)
    );
    assert_eq!(stub.balance(receiver), Amount::from_micro_ccd(100));
    assert_eq!(stub.nonce(sender), Nonce(6));
    assert_eq!(stub.execution_costs, Amount::from_micro_ccd(energy));
}

/// A transfer to the sender itself only costs the energy.
#[test]
fn test_transfer_to_self() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(1000));

    let payload = Payload::Transfer {
        to_address: stub.address(sender),
        amount: Amount::from_micro_ccd(400),
    };
    let tx = transaction(&stub, sender, 1, 600, &payload);
    let (summary, _) = assert_success(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(
        stub.balance(sender),
        Amount::from_micro_ccd(1000 - summary.cost.micro_ccd)
    );
}

/// A transfer that the sender cannot cover is rejected. The sender still pays for the
/// energy and the nonce is incremented, while the receiver is unchanged.
#[test]
fn test_transfer_amount_too_large() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(1000));
    let receiver = stub.create_account(Amount::ZERO);

    // The deposit is taken from the balance while the transfer executes.
    let payload = Payload::Transfer {
        to_address: stub.address(receiver),
        amount: Amount::from_micro_ccd(500),
    };
    let tx = transaction(&stub, sender, 1, 600, &payload);
    let (summary, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(
        reason,
        RejectReason::AmountTooLarge(
            Address::Account(stub.address(sender)),
            Amount::from_micro_ccd(500)
        )
    );
    assert_eq!(
        summary.energy_cost,
        header_cost(&tx).saturating_add(cost::SIMPLE_TRANSFER)
    );
    assert_eq!(
        stub.balance(sender),
        Amount::from_micro_ccd(1000 - summary.cost.micro_ccd)
    );
    assert_eq!(stub.balance(receiver), Amount::ZERO);
    assert_eq!(stub.nonce(sender), Nonce(2));
}

/// A transfer to an account that does not exist is rejected.
#[test]
fn test_transfer_to_unknown_account() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(1000));
    let unknown = scheduler_types::types::primitives::AccountAddress([7u8; 32]);

    let payload = Payload::Transfer {
        to_address: unknown,
        amount: Amount::from_micro_ccd(1),
    };
    let tx = transaction(&stub, sender, 1, 600, &payload);
    let (_, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
    assert_eq!(reason, RejectReason::InvalidAccountReference(unknown));
}

/// Amounts are never transferred to an account without a valid credential.
#[test]
fn test_transfer_receiver_without_credential() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let receiver = stub.create_account(Amount::from_micro_ccd(50));
    stub.expire_credentials(receiver, SLOT_TIME);
    let to = stub.address(receiver);

    let transfer = Payload::Transfer {
        to_address: to,
        amount: Amount::from_micro_ccd(100),
    };
    let scheduled = Payload::TransferWithSchedule {
        to,
        schedule: vec![(Timestamp(SLOT_TIME.0 + 1000), Amount::from_micro_ccd(100))],
    };
    let mut charged = 0;
    for (nonce, payload) in [transfer, scheduled].iter().enumerate() {
        let tx = transaction(&stub, sender, nonce as u64 + 1, 2000, payload);
        let (summary, reason) =
            assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
        assert_eq!(reason, RejectReason::ReceiverAccountNoCredential(to));
        charged += summary.cost.micro_ccd;
    }

    assert_eq!(stub.balance(sender), Amount::from_micro_ccd(10_000 - charged));
    assert_eq!(stub.balance(receiver), Amount::from_micro_ccd(50));
    assert!(stub.release_schedule(receiver).is_empty());
    assert_eq!(stub.nonce(sender), Nonce(3));
}

/// Running out of energy rejects the transaction and charges the whole deposit.
#[test]
fn test_transfer_out_of_energy() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(1000));
    let receiver = stub.create_account(Amount::ZERO);

    let payload = Payload::Transfer {
        to_address: stub.address(receiver),
        amount: Amount::from_micro_ccd(1),
    };
    let unfunded = transaction(&stub, sender, 1, 0, &payload);
    let energy = header_cost(&unfunded).0 + 10;
    let tx = transaction(&stub, sender, 1, energy, &payload);
    let (summary, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(reason, RejectReason::OutOfEnergy);
    assert_eq!(summary.energy_cost, Energy(energy));
    assert_eq!(stub.balance(sender), Amount::from_micro_ccd(1000 - energy));
    assert_eq!(stub.balance(receiver), Amount::ZERO);
}

/// A transfer with schedule locks the amount on the receiver until released.
#[test]
fn test_transfer_with_schedule() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));
    let receiver = stub.create_account(Amount::ZERO);

    let schedule = vec![
        (Timestamp(SLOT_TIME.0 + 1000), Amount::from_micro_ccd(100)),
        (Timestamp(SLOT_TIME.0 + 2000), Amount::from_micro_ccd(200)),
    ];
    let payload = Payload::TransferWithSchedule {
        to: stub.address(receiver),
        schedule: schedule.clone(),
    };
    let tx = transaction(&stub, sender, 1, 2000, &payload);
    let (summary, events) = assert_success(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(
        summary.energy_cost,
        header_cost(&tx).saturating_add(cost::scheduled_transfer(2))
    );
    assert_eq!(
        events,
        vec![Event::TransferredWithSchedule {
            from: stub.address(sender),
            to: stub.address(receiver),
            amount: schedule.clone(),
        }]
    );
    assert_eq!(stub.balance(receiver), Amount::from_micro_ccd(300));
    assert_eq!(stub.release_schedule(receiver), schedule);
    let account = stub.account_by_address(&stub.address(receiver)).unwrap();
    assert_eq!(stub.account_locked_amount(&account), Amount::from_micro_ccd(300));
}

/// The schedule must be to another account, with positive amounts released at
/// strictly increasing times in the future.
#[test]
fn test_transfer_with_schedule_rejects() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(100_000));
    let receiver = stub.create_account(Amount::ZERO);
    let later = Timestamp(SLOT_TIME.0 + 1000);
    let amount = Amount::from_micro_ccd(10);

    let cases = vec![
        (
            stub.address(sender),
            vec![(later, amount)],
            RejectReason::ScheduledSelfTransfer(stub.address(sender)),
        ),
        (stub.address(receiver), vec![], RejectReason::ZeroScheduledAmount),
        (
            stub.address(receiver),
            vec![(later, Amount::ZERO)],
            RejectReason::ZeroScheduledAmount,
        ),
        (
            stub.address(receiver),
            vec![(later, amount), (later, amount)],
            RejectReason::NonIncreasingSchedule,
        ),
        (
            stub.address(receiver),
            vec![(Timestamp(SLOT_TIME.0 - 1), amount)],
            RejectReason::FirstScheduledReleaseExpired,
        ),
        (
            stub.address(receiver),
            vec![(later, Amount::from_micro_ccd(1_000_000))],
            RejectReason::AmountTooLarge(
                Address::Account(stub.address(sender)),
                Amount::from_micro_ccd(1_000_000),
            ),
        ),
    ];
    for (nonce, (to, schedule, expected)) in cases.into_iter().enumerate() {
        let payload = Payload::TransferWithSchedule { to, schedule };
        let tx = transaction(&stub, sender, nonce as u64 + 1, 2000, &payload);
        let (_, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
        assert_eq!(reason, expected);
    }
    assert_eq!(stub.balance(receiver), Amount::ZERO);
    assert!(stub.release_schedule(receiver).is_empty());
}

/// Registered data is logged in an event and has no other effect than the charge.
#[test]
fn test_register_data() {
    let mut stub = BlockStateStub::new();
    let sender = stub.create_account(Amount::from_micro_ccd(10_000));

    let payload = Payload::RegisterData {
        data: b"hello".to_vec(),
    };
    let tx = transaction(&stub, sender, 1, 1000, &payload);
    let (summary, events) = assert_success(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(
        summary.energy_cost,
        header_cost(&tx).saturating_add(cost::REGISTER_DATA)
    );
    assert_eq!(
        events,
        vec![Event::DataRegistered {
            data: b"hello".to_vec()
        }]
    );
}
