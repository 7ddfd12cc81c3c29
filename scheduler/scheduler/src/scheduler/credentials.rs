//! Credentials: deploying a credential to create an account, and updating the keys of a
//! credential on an existing account.

use super::deposit::with_deposit;
use super::header::TransactionContext;
use super::{reject, BlockExecution, TransactionExecutionError};
use crate::block_state_interface::BlockStateOperations;
use crate::cost;
use log::debug;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::accounts::{CredentialPublicKeys, CredentialRegistrationId};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::{FailureKind, TransactionSummary, TxResult, ValidResult};
use scheduler_types::types::primitives::Amount;
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{CredentialWithMetadata, TransactionType};

pub(super) fn handle_update_credential_keys<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    cred_id: CredentialRegistrationId,
    keys: CredentialPublicKeys,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::UpdateCredentialKeys,
        |frame| {
            frame.tick(cost::update_credential_keys(keys.keys.len()))?;
            let credentials = frame.block_state.account_credentials(&tc.sender);
            if !credentials
                .values()
                .any(|credential| credential.cred_id == cred_id)
            {
                return reject(RejectReason::NonExistentCredentialID);
            }
            if keys.threshold == 0 || usize::from(keys.threshold) > keys.keys.len() {
                return reject(RejectReason::InvalidCredentialKeySignThreshold);
            }
            Ok(())
        },
        |block_state, ()| {
            block_state.set_account_credential_keys(&tc.sender, &cred_id, keys.clone());
            Ok(vec![Event::CredentialKeysUpdated {
                cred_id: cred_id.clone(),
            }])
        },
    )
}

/// Deploy a credential, creating an account with it as its only credential.
///
/// Credential deployments have no sender and nothing is charged. They still use energy
/// from the block.
pub(super) fn execute_credential_deployment<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    item: &CredentialWithMetadata,
) -> Result<Option<TxResult>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    if exec.remaining_energy() < cost::DEPLOY_CREDENTIAL {
        return Ok(None);
    }
    if let Err(failure) = check_credential(exec, item) {
        debug!("Credential deployment {} is invalid: {:?}", item.hash, failure);
        return Ok(Some(TxResult::Invalid(failure)));
    }

    let values = &item.data.credential;
    let address = values.cred_id.account_address();
    exec.block_state
        .create_account(address, values.to_account_credential());
    exec.block_state
        .notify_identity_provider_credential(values.identity_provider());
    let index = exec.record_valid_item(cost::DEPLOY_CREDENTIAL);
    debug!("Credential deployment {} created account {}", item.hash, address);

    Ok(Some(TxResult::Valid(TransactionSummary {
        sender: None,
        hash: item.hash,
        cost: Amount::ZERO,
        energy_cost: cost::DEPLOY_CREDENTIAL,
        transaction_type: None,
        result: ValidResult::Success {
            events: vec![
                Event::AccountCreated { address },
                Event::CredentialDeployed {
                    reg_id: values.cred_id.clone(),
                    account: address,
                },
            ],
        },
        index,
    })))
}

/// Check that a credential can be deployed, in order: expiry, uniqueness of the
/// registration id and the account address, identity provider, anonymity revokers,
/// proofs and policy.
fn check_credential<BSO, CI, CV>(
    exec: &BlockExecution<'_, BSO, CI, CV>,
    item: &CredentialWithMetadata,
) -> Result<(), FailureKind>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let block_state = &*exec.block_state;
    let values = &item.data.credential;
    if item.data.expiry < exec.chain_metadata.slot_time.to_transaction_time() {
        return Err(FailureKind::ExpiredTransaction);
    }
    if block_state.credential_id_exists(&values.cred_id)
        || block_state
            .account_by_address(&values.cred_id.account_address())
            .is_ok()
    {
        return Err(FailureKind::DuplicateAccountRegistrationId);
    }
    if !block_state.identity_provider_exists(values.identity_provider()) {
        return Err(FailureKind::NonExistentIdentityProvider);
    }
    if values.anonymity_revokers.is_empty()
        || !values
            .anonymity_revokers
            .iter()
            .all(|ar| block_state.anonymity_revoker_exists(*ar))
    {
        return Err(FailureKind::UnsupportedAnonymityRevokers);
    }
    if !exec.crypto.verify_credential(values)
        || !values
            .to_account_credential()
            .is_valid_at(exec.chain_metadata.slot_time)
    {
        return Err(FailureKind::AccountCredentialInvalid);
    }
    Ok(())
}
