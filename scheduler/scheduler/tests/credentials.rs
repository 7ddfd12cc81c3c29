//! Tests of credential deployments and updates of credential keys.

use crate::block_state_stub::{account_key, BlockStateStub, ANONYMITY_REVOKER, IDENTITY_PROVIDER};
use crate::crypto_stub::CryptoStub;
use crate::interpreter_stub::InterpreterStub;
use crate::utils::{
    assert_rejected, assert_success, chain_metadata, credential_deployment, dispatch,
    header_cost, transaction, MAX_BLOCK_ENERGY, SLOT_TIME,
};
use assert_matches::assert_matches;
use scheduler::block_state_interface::BlockStateQuery;
use scheduler::cost;
use scheduler::scheduler::BlockExecution;
use scheduler_types::types::accounts::{
    CredentialDeployment, CredentialPublicKeys, CredentialRegistrationId, VerifyKey,
};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::{FailureKind, TxResult, ValidResult};
use scheduler_types::types::primitives::{
    AnonymityRevokerId, Amount, Energy, IdentityProviderId, Timestamp, TransactionTime,
};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{CredentialWithMetadata, Payload, WithMetadata};

mod utils;

fn deploy(stub: &mut BlockStateStub, item: &CredentialWithMetadata) -> Option<TxResult> {
    deploy_with_block_energy(stub, item, MAX_BLOCK_ENERGY)
}

fn deploy_with_block_energy(
    stub: &mut BlockStateStub,
    item: &CredentialWithMetadata,
    max_block_energy: Energy,
) -> Option<TxResult> {
    let interpreter = InterpreterStub::new();
    let mut exec = BlockExecution::new(
        stub,
        &interpreter,
        &CryptoStub,
        chain_metadata(),
        max_block_energy,
    );
    exec.execute_credential_deployment(item)
        .expect("credential deployment internal error")
}

/// Change the credential deployment and recompute its metadata.
fn modify(
    item: CredentialWithMetadata,
    change: impl FnOnce(&mut CredentialDeployment),
) -> CredentialWithMetadata {
    let mut data = item.data;
    change(&mut data);
    WithMetadata::new(data, TransactionTime(0))
}

/// Deploying a credential creates an account, uses block energy and charges nothing.
#[test]
fn test_deploy_credential() {
    let mut stub = BlockStateStub::new();
    let item = credential_deployment(1);
    let address = item.data.credential.cred_id.account_address();

    let result = deploy(&mut stub, &item);
    let summary = assert_matches!(result, Some(TxResult::Valid(summary)) => summary);

    assert_eq!(summary.sender, None);
    assert_eq!(summary.cost, Amount::ZERO);
    assert_eq!(summary.energy_cost, cost::DEPLOY_CREDENTIAL);
    assert_eq!(summary.transaction_type, None);
    assert_eq!(
        summary.result,
        ValidResult::Success {
            events: vec![
                Event::AccountCreated { address },
                Event::CredentialDeployed {
                    reg_id: item.data.credential.cred_id.clone(),
                    account: address,
                },
            ]
        }
    );
    let account = stub
        .account_by_address(&address)
        .expect("account is created");
    assert_eq!(stub.account_balance(&account), Amount::ZERO);
    assert!(stub.credential_id_exists(&item.data.credential.cred_id));
    assert_eq!(stub.identity_provider_credentials[&IDENTITY_PROVIDER], 1);
}

/// The registration id cannot be deployed twice.
#[test]
fn test_deploy_credential_duplicate() {
    let mut stub = BlockStateStub::new();
    let item = credential_deployment(1);
    assert_matches!(deploy(&mut stub, &item), Some(TxResult::Valid(_)));
    let accounts = stub.account_count();

    assert_eq!(
        deploy(&mut stub, &item),
        Some(TxResult::Invalid(
            FailureKind::DuplicateAccountRegistrationId
        ))
    );
    assert_eq!(stub.account_count(), accounts);
}

#[test]
fn test_deploy_credential_failures() {
    let cases: Vec<(Box<dyn FnOnce(&mut CredentialDeployment)>, FailureKind)> = vec![
        (
            Box::new(|item| {
                item.expiry = TransactionTime(SLOT_TIME.to_transaction_time().0 - 1)
            }),
            FailureKind::ExpiredTransaction,
        ),
        (
            Box::new(|item| {
                item.credential.policy.identity_provider = IdentityProviderId(9)
            }),
            FailureKind::NonExistentIdentityProvider,
        ),
        (
            Box::new(|item| item.credential.anonymity_revokers.clear()),
            FailureKind::UnsupportedAnonymityRevokers,
        ),
        (
            Box::new(|item| {
                item.credential.anonymity_revokers =
                    vec![ANONYMITY_REVOKER, AnonymityRevokerId(9)]
            }),
            FailureKind::UnsupportedAnonymityRevokers,
        ),
        (
            Box::new(|item| item.credential.proofs = b"bad".to_vec()),
            FailureKind::AccountCredentialInvalid,
        ),
        (
            Box::new(|item| item.credential.policy.valid_to = Timestamp(SLOT_TIME.0 - 1)),
            FailureKind::AccountCredentialInvalid,
        ),
    ];
    for (change, expected) in cases {
        let mut stub = BlockStateStub::new();
        let item = modify(credential_deployment(1), change);
        assert_eq!(deploy(&mut stub, &item), Some(TxResult::Invalid(expected)));
        assert_eq!(stub.account_count(), 0);
    }
}

/// Without enough energy left in the block, the deployment is not executed.
#[test]
fn test_deploy_credential_block_energy() {
    let mut stub = BlockStateStub::new();
    let item = credential_deployment(1);
    let max_block_energy = Energy(cost::DEPLOY_CREDENTIAL.0 - 1);

    assert_eq!(
        deploy_with_block_energy(&mut stub, &item, max_block_energy),
        None
    );
    assert_eq!(stub.account_count(), 0);
}

/// The keys of a credential on the sender account are replaced.
#[test]
fn test_update_credential_keys() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(10_000));
    let cred_id = stub.credential(account, 0).cred_id;
    let keys = CredentialPublicKeys {
        keys: [
            (0, VerifyKey(b"first".to_vec())),
            (1, VerifyKey(b"second".to_vec())),
        ]
        .into_iter()
        .collect(),
        threshold: 2,
    };

    let payload = Payload::UpdateCredentialKeys {
        cred_id: cred_id.clone(),
        keys: keys.clone(),
    };
    let tx = transaction(&stub, account, 1, 2000, &payload);
    let (summary, events) = assert_success(dispatch(&mut stub, &InterpreterStub::new(), &tx));

    assert_eq!(
        summary.energy_cost,
        header_cost(&tx).saturating_add(cost::update_credential_keys(2))
    );
    assert_eq!(events, vec![Event::CredentialKeysUpdated { cred_id }]);
    assert_eq!(stub.credential(account, 0).keys, keys);
}

#[test]
fn test_update_credential_keys_rejects() {
    let mut stub = BlockStateStub::new();
    let account = stub.create_account(Amount::from_micro_ccd(10_000));
    let cred_id = stub.credential(account, 0).cred_id;
    let keys = |threshold| CredentialPublicKeys {
        keys: [(0, VerifyKey(b"key".to_vec()))].into_iter().collect(),
        threshold,
    };

    let cases = vec![
        (
            CredentialRegistrationId(b"unknown".to_vec()),
            keys(1),
            RejectReason::NonExistentCredentialID,
        ),
        (
            cred_id.clone(),
            keys(0),
            RejectReason::InvalidCredentialKeySignThreshold,
        ),
        (
            cred_id.clone(),
            keys(2),
            RejectReason::InvalidCredentialKeySignThreshold,
        ),
    ];
    for (nonce, (cred_id, keys, expected)) in cases.into_iter().enumerate() {
        let payload = Payload::UpdateCredentialKeys { cred_id, keys };
        let tx = transaction(&stub, account, nonce as u64 + 1, 2000, &payload);
        let (_, reason) = assert_rejected(dispatch(&mut stub, &InterpreterStub::new(), &tx));
        assert_eq!(reason, expected);
    }
    assert_eq!(
        stub.credential(account, 0).keys.keys[&0],
        account_key(0)
    );
}
