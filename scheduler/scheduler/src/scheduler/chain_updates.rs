//! Chain-update instructions: enqueuing authorized changes to the chain parameters.
//!
//! Updates do not take effect within the block that enqueues them.

use super::{BlockExecution, TransactionExecutionError};
use crate::block_state_interface::BlockStateOperations;
use log::debug;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::{FailureKind, TransactionSummary, TxResult, ValidResult};
use scheduler_types::types::primitives::{Amount, Energy, TransactionTime};
use scheduler_types::types::transactions::UpdateWithMetadata;
use scheduler_types::types::updates::{UpdateInstruction, UpdateKeys, UpdatePayload};

/// Execute a chain update. Updates use no energy and are never charged, so the result is
/// always present.
pub(super) fn execute_update_instruction<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    item: &UpdateWithMetadata,
) -> Result<Option<TxResult>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let payload = match check_update(exec, &item.data) {
        Ok(payload) => payload,
        Err(failure) => {
            debug!("Chain update {} is invalid: {:?}", item.hash, failure);
            return Ok(Some(TxResult::Invalid(failure)));
        }
    };

    let update = &item.data;
    exec.block_state
        .enqueue_update(update.header.effective_time, payload);
    exec.block_state
        .increment_update_sequence_number(update.update_type);
    let index = exec.record_valid_item(Energy::ZERO);
    debug!(
        "Chain update {} enqueued {:?} effective at {:?}",
        item.hash, payload, update.header.effective_time
    );

    Ok(Some(TxResult::Valid(TransactionSummary {
        sender: None,
        hash: item.hash,
        cost: Amount::ZERO,
        energy_cost: Energy::ZERO,
        transaction_type: None,
        result: ValidResult::Success {
            events: vec![Event::UpdateEnqueued {
                effective_time: update.header.effective_time,
                payload,
            }],
        },
        index,
    })))
}

/// Check a chain update, in order: timeout, payload, sequence number, effective time and
/// signatures.
fn check_update<BSO, CI, CV>(
    exec: &BlockExecution<'_, BSO, CI, CV>,
    update: &UpdateInstruction,
) -> Result<UpdatePayload, FailureKind>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let header = &update.header;
    if header.timeout < exec.chain_metadata.slot_time.to_transaction_time() {
        return Err(FailureKind::ExpiredTransaction);
    }
    let payload = update
        .payload
        .decode()
        .map_err(|_| FailureKind::SerializationFailure)?;
    if payload.update_type() != update.update_type {
        return Err(FailureKind::SerializationFailure);
    }

    let block_state = &*exec.block_state;
    let expected = block_state.next_update_sequence_number(update.update_type);
    if header.seq_number != expected {
        return Err(FailureKind::NonSequentialUpdateSequenceNumber(expected));
    }
    if header.effective_time != TransactionTime(0) && header.effective_time <= header.timeout {
        return Err(FailureKind::InvalidUpdateTime);
    }

    let keys = block_state.update_keys(update.update_type);
    if !update_signed(exec.crypto, &keys, update) {
        return Err(FailureKind::IncorrectSignature);
    }
    Ok(payload)
}

/// Whether enough of the authorized keys signed the update. A signature by an unknown key
/// or a signature that does not verify makes the update invalid.
fn update_signed<CV: CryptoVerifier>(
    crypto: &CV,
    keys: &UpdateKeys,
    update: &UpdateInstruction,
) -> bool {
    let message = update.sign_hash();
    let all_valid = update.signatures.iter().all(|(index, signature)| {
        keys.keys
            .get(index)
            .map_or(false, |key| crypto.verify_signature(key, &message, signature))
    });
    all_valid && update.signatures.len() >= usize::from(keys.threshold)
}
