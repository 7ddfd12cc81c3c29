//! The deposit frame every account transaction executes in.
//!
//! The energy deposited by the sender is notionally taken from its balance while the
//! payload executes. Afterwards the sender is charged for the energy actually used,
//! whether the payload succeeded or was rejected, and its nonce is incremented.

use super::header::TransactionContext;
use super::{
    available_amount, current_balance, has_valid_credential, newest_credential_policies,
    BlockExecution, ExecutionError, TransactionExecutionError, TransactionExecutionImpl,
};
use crate::block_state_interface::{AmountDelta, BlockStateOperations, BlockStateQuery};
use crate::changeset::{amount_with_delta, ChangeSet};
use crate::cost;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_interface::TransactionExecution;
use scheduler_types::types::accounts::Policy;
use scheduler_types::types::contracts::{ContractState, InstanceInfo};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::{TransactionSummary, ValidResult};
use scheduler_types::types::parameters::{ChainMetadata, ChainParameters};
use scheduler_types::types::primitives::{Amount, Energy};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::TransactionType;

/// What the payload of a transaction can see and do while it executes: read the block
/// state, run contracts, verify proofs, use energy and stage changes.
pub(crate) struct ExecutionFrame<'a, BSO: BlockStateQuery, CI, CV> {
    pub block_state: &'a BSO,
    pub interpreter: &'a CI,
    pub crypto: &'a CV,
    pub chain_metadata: &'a ChainMetadata,
    pub chain_parameters: &'a ChainParameters,
    pub transaction: &'a TransactionContext<BSO::Account>,
    pub energy: TransactionExecutionImpl,
    pub changes: ChangeSet,
}

impl<'a, BSO: BlockStateQuery, CI, CV> ExecutionFrame<'a, BSO, CI, CV> {
    pub fn tick(&mut self, energy: Energy) -> Result<(), ExecutionError> {
        Ok(self.energy.tick_energy(energy)?)
    }

    /// Balance of an account, with the staged changes.
    pub fn account_balance(&self, account: &BSO::Account) -> Amount {
        let delta = self.changes.account_delta(self.block_state.account_index(account));
        current_balance(self.block_state, account, delta)
    }

    /// Amount an account can transfer, with the staged changes.
    pub fn available_amount(&self, account: &BSO::Account) -> Amount {
        let delta = self.changes.account_delta(self.block_state.account_index(account));
        available_amount(self.block_state, account, delta)
    }

    /// Balance of an instance, with the staged changes.
    pub fn instance_balance(&self, instance: &InstanceInfo) -> Amount {
        amount_with_delta(instance.amount, self.changes.instance_delta(instance.address))
    }

    /// State of an instance, with the staged changes.
    pub fn instance_state(&self, instance: &InstanceInfo) -> ContractState {
        self.changes
            .instance_state(instance.address)
            .unwrap_or(&instance.state)
            .clone()
    }

    pub fn has_valid_credential(&self, account: &BSO::Account) -> bool {
        has_valid_credential(self.block_state, account, self.chain_metadata)
    }

    pub fn sender_policies(&self) -> Vec<Policy> {
        newest_credential_policies(self.block_state, &self.transaction.sender)
    }
}

/// Execute `body` under the deposit of the transaction, then apply `commit` if it succeeds.
///
/// The changes staged by `body` are written to the block state before `commit` runs.
/// `commit` makes the remaining changes, those that are not balances or contract states,
/// and returns the events of the transaction. If `body` is rejected, the staged changes
/// are dropped and `commit` is not run.
///
/// Returns `None` if the block energy is exhausted while executing `body`. Nothing is
/// written to the block state in that case.
pub(crate) fn with_deposit<BSO, CI, CV, T, B, C>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    transaction_type: TransactionType,
    body: B,
    commit: C,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
    B: FnOnce(&mut ExecutionFrame<'_, BSO, CI, CV>) -> Result<T, ExecutionError>,
    C: FnOnce(&mut BSO, T) -> Result<Vec<Event>, TransactionExecutionError>,
{
    let deposit = cost::energy_to_ccd(&exec.chain_parameters.energy_rate, tc.header.energy_amount);
    let deposit = i128::from(deposit.micro_ccd);

    let mut changes = ChangeSet::new();
    changes.add_account_amount(tc.sender_index, -deposit);
    let mut frame = ExecutionFrame {
        block_state: &*exec.block_state,
        interpreter: exec.interpreter,
        crypto: exec.crypto,
        chain_metadata: &exec.chain_metadata,
        chain_parameters: &exec.chain_parameters,
        transaction: tc,
        energy: TransactionExecutionImpl::new(
            tc.sender_address,
            tc.header.energy_amount,
            exec.remaining_energy(),
            tc.header_cost,
        ),
        changes,
    };
    let result = body(&mut frame);
    let ExecutionFrame {
        energy,
        mut changes,
        ..
    } = frame;

    let outcome = match result {
        Ok(value) => {
            changes.add_account_amount(tc.sender_index, deposit);
            changes.commit(exec.block_state)?;
            let events = commit(exec.block_state, value)?;
            ValidResult::Success { events }
        }
        Err(ExecutionError::Reject(reason)) => ValidResult::Reject { reason },
        Err(ExecutionError::BlockEnergyExhausted) => return Ok(None),
        Err(ExecutionError::Internal(err)) => return Err(err),
    };
    let summary = charge_and_finish(
        exec,
        tc,
        Some(transaction_type),
        energy.energy_used(),
        outcome,
    )?;
    Ok(Some(summary))
}

/// Reject a transaction whose payload does not decode. Only checking the header is charged.
pub(crate) fn reject_undecodable<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
) -> Result<TransactionSummary, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    charge_and_finish(
        exec,
        tc,
        None,
        tc.header_cost,
        ValidResult::Reject {
            reason: RejectReason::SerializationFailure,
        },
    )
}

/// Charge the sender for `energy_used`, increment its nonce and record the transaction as
/// a valid item of the block.
fn charge_and_finish<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    transaction_type: Option<TransactionType>,
    energy_used: Energy,
    result: ValidResult,
) -> Result<TransactionSummary, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let cost = cost::energy_to_ccd(&exec.chain_parameters.energy_rate, energy_used);
    exec.block_state
        .update_account_balance(&tc.sender, AmountDelta::Subtract(cost))?;
    exec.block_state.add_execution_cost(cost);
    exec.block_state.increment_account_nonce(&tc.sender);
    let index = exec.record_valid_item(energy_used);
    Ok(TransactionSummary {
        sender: Some(tc.sender_address),
        hash: tc.hash,
        cost,
        energy_cost: energy_used,
        transaction_type,
        result,
        index,
    })
}
