//! Baker transactions: registering, removing and changing the baker of the sender account.
//!
//! Changes that reduce the stake of a baker only take effect after the baker cooldown.
//! While such a change is pending the baker cannot be changed further.

use super::deposit::with_deposit;
use super::header::TransactionContext;
use super::{reject, BlockExecution, TransactionExecutionError};
use crate::block_state_interface::BlockStateOperations;
use crate::cost;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::accounts::{
    AccountBaker, BakerKeyProofs, BakerKeys, BakerPendingChange,
};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::TransactionSummary;
use scheduler_types::types::primitives::Amount;
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::TransactionType;

pub(super) fn handle_add_baker<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    keys: BakerKeys,
    proofs: BakerKeyProofs,
    stake: Amount,
    restake_earnings: bool,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::AddBaker,
        |frame| {
            frame.tick(cost::ADD_BAKER)?;
            if !frame
                .crypto
                .verify_baker_key_proofs(&tc.sender_address, &keys, &proofs)
            {
                return reject(RejectReason::InvalidProof);
            }
            if frame.account_balance(&tc.sender) < stake {
                return reject(RejectReason::InsufficientBalanceForBakerStake);
            }
            if let Some(baker) = frame.block_state.account_baker(&tc.sender) {
                return reject(RejectReason::AlreadyABaker(baker.baker_id));
            }
            if frame
                .block_state
                .aggregation_key_in_use(&keys.aggregation_verify_key)
            {
                return reject(RejectReason::DuplicateAggregationKey(
                    keys.aggregation_verify_key.clone(),
                ));
            }
            if stake < frame.chain_parameters.minimum_baker_stake {
                return reject(RejectReason::StakeUnderMinimumThresholdForBaking);
            }
            Ok(())
        },
        |block_state, ()| {
            let baker = AccountBaker {
                baker_id: tc.sender_index,
                keys: keys.clone(),
                staked_amount: stake,
                restake_earnings,
                pending_change: None,
            };
            block_state.set_account_baker(&tc.sender, Some(baker));
            Ok(vec![Event::BakerAdded {
                baker_id: tc.sender_index,
                account: tc.sender_address,
                sign_key: keys.signature_verify_key.clone(),
                election_key: keys.election_verify_key.clone(),
                aggregation_key: keys.aggregation_verify_key.clone(),
                stake,
                restake_earnings,
            }])
        },
    )
}

pub(super) fn handle_remove_baker<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::RemoveBaker,
        |frame| {
            frame.tick(cost::REMOVE_BAKER)?;
            let Some(mut baker) = frame.block_state.account_baker(&tc.sender) else {
                return reject(RejectReason::NotABaker(tc.sender_address));
            };
            if baker.pending_change.is_some() {
                return reject(RejectReason::BakerInCooldown);
            }
            let effective_time = frame
                .chain_metadata
                .slot_time
                .saturating_add_millis(frame.chain_parameters.baker_cooldown_millis);
            baker.pending_change = Some(BakerPendingChange::RemoveBaker { effective_time });
            Ok(baker)
        },
        |block_state, baker| {
            let event = match baker.pending_change {
                Some(BakerPendingChange::RemoveBaker { effective_time }) => Event::BakerRemoved {
                    baker_id: baker.baker_id,
                    account: tc.sender_address,
                    effective_time,
                },
                _ => {
                    return Err(TransactionExecutionError::StateInvariantBroken(
                        "baker removal without pending removal".to_string(),
                    ))
                }
            };
            block_state.set_account_baker(&tc.sender, Some(baker));
            Ok(vec![event])
        },
    )
}

pub(super) fn handle_update_baker_stake<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    stake: Amount,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::UpdateBakerStake,
        |frame| {
            frame.tick(cost::UPDATE_BAKER_STAKE)?;
            let Some(mut baker) = frame.block_state.account_baker(&tc.sender) else {
                return reject(RejectReason::NotABaker(tc.sender_address));
            };
            if baker.pending_change.is_some() {
                return reject(RejectReason::BakerInCooldown);
            }
            if stake < frame.chain_parameters.minimum_baker_stake {
                return reject(RejectReason::StakeUnderMinimumThresholdForBaking);
            }
            if frame.account_balance(&tc.sender) < stake {
                return reject(RejectReason::InsufficientBalanceForBakerStake);
            }
            let event = if stake >= baker.staked_amount {
                baker.staked_amount = stake;
                Event::BakerStakeIncreased {
                    baker_id: baker.baker_id,
                    account: tc.sender_address,
                    new_stake: stake,
                }
            } else {
                let effective_time = frame
                    .chain_metadata
                    .slot_time
                    .saturating_add_millis(frame.chain_parameters.baker_cooldown_millis);
                baker.pending_change = Some(BakerPendingChange::ReduceStake {
                    new_stake: stake,
                    effective_time,
                });
                Event::BakerStakeDecreased {
                    baker_id: baker.baker_id,
                    account: tc.sender_address,
                    new_stake: stake,
                    effective_time,
                }
            };
            Ok((baker, event))
        },
        |block_state, (baker, event)| {
            block_state.set_account_baker(&tc.sender, Some(baker));
            Ok(vec![event])
        },
    )
}

pub(super) fn handle_update_baker_restake_earnings<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    restake_earnings: bool,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::UpdateBakerRestakeEarnings,
        |frame| {
            frame.tick(cost::UPDATE_BAKER_RESTAKE_EARNINGS)?;
            let Some(mut baker) = frame.block_state.account_baker(&tc.sender) else {
                return reject(RejectReason::NotABaker(tc.sender_address));
            };
            baker.restake_earnings = restake_earnings;
            Ok(baker)
        },
        |block_state, baker| {
            let baker_id = baker.baker_id;
            block_state.set_account_baker(&tc.sender, Some(baker));
            Ok(vec![Event::BakerSetRestakeEarnings {
                baker_id,
                account: tc.sender_address,
                restake_earnings,
            }])
        },
    )
}

pub(super) fn handle_update_baker_keys<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    keys: BakerKeys,
    proofs: BakerKeyProofs,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::UpdateBakerKeys,
        |frame| {
            frame.tick(cost::UPDATE_BAKER_KEYS)?;
            let Some(mut baker) = frame.block_state.account_baker(&tc.sender) else {
                return reject(RejectReason::NotABaker(tc.sender_address));
            };
            if !frame
                .crypto
                .verify_baker_key_proofs(&tc.sender_address, &keys, &proofs)
            {
                return reject(RejectReason::InvalidProof);
            }
            // Keeping the current aggregation key is allowed.
            if keys.aggregation_verify_key != baker.keys.aggregation_verify_key
                && frame
                    .block_state
                    .aggregation_key_in_use(&keys.aggregation_verify_key)
            {
                return reject(RejectReason::DuplicateAggregationKey(
                    keys.aggregation_verify_key.clone(),
                ));
            }
            baker.keys = keys.clone();
            Ok(baker)
        },
        |block_state, baker| {
            let event = Event::BakerKeysUpdated {
                baker_id: baker.baker_id,
                account: tc.sender_address,
                sign_key: baker.keys.signature_verify_key.clone(),
                election_key: baker.keys.election_verify_key.clone(),
                aggregation_key: baker.keys.aggregation_verify_key.clone(),
            };
            block_state.set_account_baker(&tc.sender, Some(baker));
            Ok(vec![event])
        },
    )
}
