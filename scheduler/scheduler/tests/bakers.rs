//! Tests of baker transactions.

use crate::block_state_stub::{AccountStubIndex, BlockStateStub};
use crate::crypto_stub::VALID_PROOF;
use crate::interpreter_stub::InterpreterStub;
use crate::utils::{assert_rejected, assert_success, dispatch, transaction, SLOT_TIME};
use scheduler_types::types::accounts::{
    AccountBaker, AggregationVerifyKey, BakerKeyProofs, BakerKeys, BakerPendingChange,
    VerifyKey,
};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::TxResult;
use scheduler_types::types::primitives::{AccountIndex, Amount, Timestamp};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::Payload;

mod utils;

/// Effective time of changes made in the test blocks, with the cooldown of the stub.
const EFFECTIVE_TIME: Timestamp = Timestamp(SLOT_TIME.0 + 3_600_000);

fn baker_keys(seed: u8) -> BakerKeys {
    BakerKeys {
        election_verify_key: VerifyKey(vec![seed, 1]),
        signature_verify_key: VerifyKey(vec![seed, 2]),
        aggregation_verify_key: AggregationVerifyKey(vec![seed, 3]),
    }
}

fn valid_proofs() -> BakerKeyProofs {
    BakerKeyProofs {
        proof_sig: VALID_PROOF.to_vec(),
        proof_election: VALID_PROOF.to_vec(),
        proof_aggregation: VALID_PROOF.to_vec(),
    }
}

fn add_baker_payload(seed: u8, stake: u64) -> Payload {
    Payload::AddBaker {
        keys: baker_keys(seed),
        proofs: valid_proofs(),
        baking_stake: Amount::from_micro_ccd(stake),
        restake_earnings: true,
    }
}

/// Send a transaction from the account with the next nonce of the account.
fn send(
    stub: &mut BlockStateStub,
    sender: AccountStubIndex,
    payload: &Payload,
) -> Option<TxResult> {
    let tx = transaction(stub, sender, stub.nonce(sender).0, 10_000, payload);
    dispatch(stub, &InterpreterStub::new(), &tx)
}

/// Make the account a baker with the given stake directly in the state.
fn set_baker(stub: &mut BlockStateStub, account: AccountStubIndex, seed: u8, stake: u64) {
    let baker_id = AccountIndex(seed as u64);
    stub.set_baker(
        account,
        AccountBaker {
            baker_id,
            keys: baker_keys(seed),
            staked_amount: Amount::from_micro_ccd(stake),
            restake_earnings: false,
            pending_change: None,
        },
    );
}

#[test]
fn test_add_baker() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));

    let (_, events) = assert_success(send(&mut stub, account, &add_baker_payload(0, 5000)));

    assert_eq!(
        events,
        vec![Event::BakerAdded {
            baker_id: AccountIndex(0),
            account: stub.address(account),
            sign_key: baker_keys(0).signature_verify_key,
            election_key: baker_keys(0).election_verify_key,
            aggregation_key: baker_keys(0).aggregation_verify_key,
            stake: Amount::from_micro_ccd(5000),
            restake_earnings: true,
        }]
    );
    let baker = stub.baker(account).expect("account is a baker");
    assert_eq!(baker.baker_id, AccountIndex(0));
    assert_eq!(baker.staked_amount, Amount::from_micro_ccd(5000));
    assert_eq!(baker.pending_change, None);
}

/// The checks of adding a baker are made in order: proofs, balance, existing baker,
/// aggregation key and minimum stake.
#[test]
fn test_add_baker_rejects() {
    let mut stub = BlockStateStub::new();
    let other = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, other, 7, 5000);
    let account = stub.create_account(Amount::from_micro_ccd(100_000));

    let bad_proofs = Payload::AddBaker {
        keys: baker_keys(1),
        proofs: BakerKeyProofs {
            proof_aggregation: b"bad".to_vec(),
            ..valid_proofs()
        },
        baking_stake: Amount::from_micro_ccd(5000),
        restake_earnings: false,
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &bad_proofs));
    assert_eq!(reason, RejectReason::InvalidProof);

    // The deposit is held while the transaction executes.
    let (_, reason) = assert_rejected(send(&mut stub, account, &add_baker_payload(1, 95_000)));
    assert_eq!(reason, RejectReason::InsufficientBalanceForBakerStake);

    let (_, reason) = assert_rejected(send(&mut stub, other, &add_baker_payload(1, 5000)));
    assert_eq!(reason, RejectReason::AlreadyABaker(AccountIndex(7)));

    let (_, reason) = assert_rejected(send(&mut stub, account, &add_baker_payload(7, 5000)));
    assert_eq!(
        reason,
        RejectReason::DuplicateAggregationKey(baker_keys(7).aggregation_verify_key)
    );

    let (_, reason) = assert_rejected(send(&mut stub, account, &add_baker_payload(1, 999)));
    assert_eq!(reason, RejectReason::StakeUnderMinimumThresholdForBaking);

    assert_eq!(stub.baker(account), None);
}

/// Removing a baker takes effect after the cooldown. The baker cannot be changed
/// meanwhile.
#[test]
fn test_remove_baker() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let (_, events) = assert_success(send(&mut stub, account, &Payload::RemoveBaker));
    assert_eq!(
        events,
        vec![Event::BakerRemoved {
            baker_id: AccountIndex(3),
            account: stub.address(account),
            effective_time: EFFECTIVE_TIME,
        }]
    );
    let baker = stub.baker(account).expect("baker is kept until the cooldown passes");
    assert_eq!(
        baker.pending_change,
        Some(BakerPendingChange::RemoveBaker {
            effective_time: EFFECTIVE_TIME
        })
    );

    let (_, reason) = assert_rejected(send(&mut stub, account, &Payload::RemoveBaker));
    assert_eq!(reason, RejectReason::BakerInCooldown);
    let payload = Payload::UpdateBakerStake {
        stake: Amount::from_micro_ccd(6000),
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
    assert_eq!(reason, RejectReason::BakerInCooldown);
}

#[test]
fn test_not_a_baker() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    let expected = RejectReason::NotABaker(stub.address(account));

    let payloads = vec![
        Payload::RemoveBaker,
        Payload::UpdateBakerStake {
            stake: Amount::from_micro_ccd(5000),
        },
        Payload::UpdateBakerRestakeEarnings {
            restake_earnings: true,
        },
        Payload::UpdateBakerKeys {
            keys: baker_keys(1),
            proofs: valid_proofs(),
        },
    ];
    for payload in payloads {
        let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
        assert_eq!(reason, expected);
    }
}

/// Increasing the stake takes effect immediately.
#[test]
fn test_increase_baker_stake() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let payload = Payload::UpdateBakerStake {
        stake: Amount::from_micro_ccd(8000),
    };
    let (_, events) = assert_success(send(&mut stub, account, &payload));
    assert_eq!(
        events,
        vec![Event::BakerStakeIncreased {
            baker_id: AccountIndex(3),
            account: stub.address(account),
            new_stake: Amount::from_micro_ccd(8000),
        }]
    );
    let baker = stub.baker(account).expect("account is a baker");
    assert_eq!(baker.staked_amount, Amount::from_micro_ccd(8000));
    assert_eq!(baker.pending_change, None);
}

/// Decreasing the stake is a pending change taking effect after the cooldown.
#[test]
fn test_decrease_baker_stake() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let payload = Payload::UpdateBakerStake {
        stake: Amount::from_micro_ccd(2000),
    };
    let (_, events) = assert_success(send(&mut stub, account, &payload));
    assert_eq!(
        events,
        vec![Event::BakerStakeDecreased {
            baker_id: AccountIndex(3),
            account: stub.address(account),
            new_stake: Amount::from_micro_ccd(2000),
            effective_time: EFFECTIVE_TIME,
        }]
    );
    let baker = stub.baker(account).expect("account is a baker");
    assert_eq!(baker.staked_amount, Amount::from_micro_ccd(5000));
    assert_eq!(
        baker.pending_change,
        Some(BakerPendingChange::ReduceStake {
            new_stake: Amount::from_micro_ccd(2000),
            effective_time: EFFECTIVE_TIME,
        })
    );
}

#[test]
fn test_update_baker_stake_rejects() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let payload = Payload::UpdateBakerStake {
        stake: Amount::from_micro_ccd(999),
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
    assert_eq!(reason, RejectReason::StakeUnderMinimumThresholdForBaking);

    let payload = Payload::UpdateBakerStake {
        stake: Amount::from_micro_ccd(1_000_000),
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
    assert_eq!(reason, RejectReason::InsufficientBalanceForBakerStake);
}

#[test]
fn test_update_baker_restake_earnings() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let payload = Payload::UpdateBakerRestakeEarnings {
        restake_earnings: true,
    };
    let (_, events) = assert_success(send(&mut stub, account, &payload));
    assert_eq!(
        events,
        vec![Event::BakerSetRestakeEarnings {
            baker_id: AccountIndex(3),
            account: stub.address(account),
            restake_earnings: true,
        }]
    );
    assert!(stub.baker(account).expect("account is a baker").restake_earnings);
}

/// New baker keys must come with valid proofs and an aggregation key not used by another
/// baker. Keeping the current aggregation key is allowed.
#[test]
fn test_update_baker_keys() {
    let mut stub = BlockStateStub::new();
    let other = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, other, 7, 5000);
    let account = stub.create_account(Amount::from_micro_ccd(100_000));
    set_baker(&mut stub, account, 3, 5000);

    let payload = Payload::UpdateBakerKeys {
        keys: baker_keys(7),
        proofs: valid_proofs(),
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
    assert_eq!(
        reason,
        RejectReason::DuplicateAggregationKey(baker_keys(7).aggregation_verify_key)
    );

    let payload = Payload::UpdateBakerKeys {
        keys: baker_keys(4),
        proofs: BakerKeyProofs {
            proof_sig: Vec::new(),
            ..valid_proofs()
        },
    };
    let (_, reason) = assert_rejected(send(&mut stub, account, &payload));
    assert_eq!(reason, RejectReason::InvalidProof);

    let keys = BakerKeys {
        election_verify_key: VerifyKey(b"new election".to_vec()),
        ..baker_keys(3)
    };
    let payload = Payload::UpdateBakerKeys {
        keys: keys.clone(),
        proofs: valid_proofs(),
    };
    let (_, events) = assert_success(send(&mut stub, account, &payload));
    assert_eq!(
        events,
        vec![Event::BakerKeysUpdated {
            baker_id: AccountIndex(3),
            account: stub.address(account),
            sign_key: keys.signature_verify_key.clone(),
            election_key: keys.election_verify_key.clone(),
            aggregation_key: keys.aggregation_verify_key.clone(),
        }]
    );
    assert_eq!(stub.baker(account).expect("account is a baker").keys, keys);
}
