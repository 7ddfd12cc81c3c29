//! Entry points to calling the scheduler. The scheduler is responsible for checking and
//! executing block items against the block state, one at a time and in order.

use crate::block_state_interface::{
    BlockStateOperations, BlockStateQuery, UnderOrOverflowError, UpdateInstanceError,
};
use crate::changeset::amount_with_delta;
use crate::signatures::SignatureCache;
use log::{debug, warn};
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_interface::{OutOfEnergyError, TransactionExecution};
use scheduler_types::types::accounts::Policy;
use scheduler_types::types::execution::{TxResult, ValidResult};
use scheduler_types::types::parameters::{ChainMetadata, ChainParameters};
use scheduler_types::types::primitives::{AccountAddress, Amount, Energy};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{
    BlockItem, BlockItemKind, CredentialWithMetadata, Payload, TransactionWithMetadata,
    UpdateWithMetadata, WithMetadata,
};

mod bakers;
mod chain_updates;
mod contracts;
mod credentials;
mod deposit;
mod encrypted;
mod header;
mod messages;
mod transfers;

pub use messages::MAX_CALL_DEPTH;

/// Tracks the energy remaining during the execution of one transaction.
#[derive(Debug, Clone)]
pub(crate) struct TransactionExecutionImpl {
    /// The account which signed as the sender of the transaction.
    sender_address: AccountAddress,
    /// Limit for how much energy the execution can use, the energy deposited by the sender.
    energy_limit: Energy,
    /// Energy left in the block when the transaction started, including the energy for
    /// checking the header.
    block_energy_limit: Energy,
    /// Energy used so far by execution. Energy is always charged in advance for each step executed.
    energy_used: Energy,
}

impl TransactionExecutionImpl {
    pub(crate) fn new(
        sender_address: AccountAddress,
        energy_limit: Energy,
        block_energy_limit: Energy,
        header_cost: Energy,
    ) -> Self {
        TransactionExecutionImpl {
            sender_address,
            energy_limit,
            block_energy_limit,
            energy_used: header_cost,
        }
    }

    pub(crate) fn energy_used(&self) -> Energy {
        self.energy_used
    }

    /// Use all remaining energy, as when the contract interpreter runs out of energy.
    pub(crate) fn exhaust(&mut self) -> OutOfEnergyError {
        if self.block_left() < self.transaction_left() {
            OutOfEnergyError::Block
        } else {
            self.energy_used = self.energy_limit;
            OutOfEnergyError::Transaction
        }
    }

    fn transaction_left(&self) -> Energy {
        self.energy_limit.saturating_sub(self.energy_used)
    }

    fn block_left(&self) -> Energy {
        self.block_energy_limit.saturating_sub(self.energy_used)
    }
}

impl TransactionExecution for TransactionExecutionImpl {
    fn sender_account_address(&self) -> AccountAddress {
        self.sender_address
    }

    fn remaining_energy(&self) -> Energy {
        self.transaction_left().min(self.block_left())
    }

    fn tick_energy(&mut self, energy: Energy) -> Result<(), OutOfEnergyError> {
        if energy <= self.remaining_energy() {
            self.energy_used = self.energy_used.saturating_add(energy);
            Ok(())
        } else {
            Err(self.exhaust())
        }
    }
}

/// Error executing a block item. This does not include reject reasons or failures,
/// which are outcomes of execution.
#[derive(Debug, thiserror::Error)]
pub enum TransactionExecutionError {
    /// An invariant in the state that should be enforced
    /// is broken. This is generally an error that should never happen and is unrecoverable.
    #[error("State invariant broken: {0}")]
    StateInvariantBroken(String),
    #[error("Balance update out of range: {0}")]
    AmountOutOfRange(#[from] UnderOrOverflowError),
}

impl From<UpdateInstanceError> for TransactionExecutionError {
    fn from(err: UpdateInstanceError) -> Self {
        match err {
            UpdateInstanceError::NotFound(err) => {
                TransactionExecutionError::StateInvariantBroken(err.to_string())
            }
            UpdateInstanceError::AmountOutOfRange(err) => {
                TransactionExecutionError::AmountOutOfRange(err)
            }
        }
    }
}

/// Ways the body of a transaction can stop before completing.
#[derive(Debug)]
pub(crate) enum ExecutionError {
    /// The transaction is rejected. The sender is charged for the energy used.
    Reject(RejectReason),
    /// The energy remaining in the block is exhausted. The transaction cannot be part of
    /// the block, and no state is changed.
    BlockEnergyExhausted,
    /// Unrecoverable error.
    Internal(TransactionExecutionError),
}

impl From<OutOfEnergyError> for ExecutionError {
    fn from(err: OutOfEnergyError) -> Self {
        match err {
            OutOfEnergyError::Transaction => ExecutionError::Reject(RejectReason::OutOfEnergy),
            OutOfEnergyError::Block => ExecutionError::BlockEnergyExhausted,
        }
    }
}

impl From<TransactionExecutionError> for ExecutionError {
    fn from(err: TransactionExecutionError) -> Self {
        ExecutionError::Internal(err)
    }
}

pub(crate) fn reject<T>(reason: RejectReason) -> Result<T, ExecutionError> {
    Err(ExecutionError::Reject(reason))
}

/// Context of executing the items of one block.
///
/// Holds the block state and the collaborators, together with the energy used by the
/// items executed so far. Items are executed one at a time, each seeing the effects of
/// the items before it.
pub struct BlockExecution<'a, BSO, CI, CV> {
    block_state: &'a mut BSO,
    interpreter: &'a CI,
    crypto: &'a CV,
    chain_metadata: ChainMetadata,
    /// Chain parameters as of the start of the block. Enqueued updates never take effect
    /// within the block that enqueues them.
    chain_parameters: ChainParameters,
    max_block_energy: Energy,
    energy_used: Energy,
    /// Number of valid items executed so far.
    valid_items: u64,
    signature_cache: SignatureCache,
}

impl<'a, BSO, CI, CV> BlockExecution<'a, BSO, CI, CV>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    /// Start executing a block.
    ///
    /// # Arguments
    ///
    /// - `block_state` Block state that is queried and updated by execution.
    /// - `interpreter` Contract interpreter used for contract transactions.
    /// - `crypto` Verifier for signatures and proofs.
    /// - `chain_metadata` Metadata of the block.
    /// - `max_block_energy` Energy the items of the block may use in total.
    pub fn new(
        block_state: &'a mut BSO,
        interpreter: &'a CI,
        crypto: &'a CV,
        chain_metadata: ChainMetadata,
        max_block_energy: Energy,
    ) -> Self {
        let chain_parameters = block_state.chain_parameters();
        BlockExecution {
            block_state,
            interpreter,
            crypto,
            chain_metadata,
            chain_parameters,
            max_block_energy,
            energy_used: Energy::ZERO,
            valid_items: 0,
            signature_cache: SignatureCache::default(),
        }
    }

    pub fn block_state(&self) -> &BSO {
        self.block_state
    }

    pub fn crypto(&self) -> &CV {
        self.crypto
    }

    pub fn chain_metadata(&self) -> &ChainMetadata {
        &self.chain_metadata
    }

    pub fn chain_parameters(&self) -> &ChainParameters {
        &self.chain_parameters
    }

    /// Energy used by the valid items executed so far.
    pub fn energy_used(&self) -> Energy {
        self.energy_used
    }

    pub fn remaining_energy(&self) -> Energy {
        self.max_block_energy.saturating_sub(self.energy_used)
    }

    pub fn max_block_energy(&self) -> Energy {
        self.max_block_energy
    }

    /// Use the results of verifying signatures ahead of execution.
    pub fn set_signature_cache(&mut self, cache: SignatureCache) {
        self.signature_cache = cache;
    }

    /// Execute an account transaction.
    ///
    /// The header is checked first. If the check fails, the transaction is invalid and the
    /// state is unchanged. Otherwise the nonce of the sender is incremented and the sender
    /// is charged for the energy used, whether the payload succeeds or is rejected.
    ///
    /// Returns `None` if the energy remaining in the block does not suffice to execute the
    /// transaction. The state is then unchanged.
    ///
    /// # Errors
    ///
    /// - [`TransactionExecutionError`] If executing the transaction fails with an unrecoverable
    ///   error.
    ///   Returning this error will terminate the scheduler.
    pub fn dispatch(
        &mut self,
        transaction: &TransactionWithMetadata,
    ) -> Result<Option<TxResult>, TransactionExecutionError> {
        let tc = match header::check_header(self, transaction) {
            Ok(tc) => tc,
            Err(header::HeaderFailure::Invalid(failure)) => {
                debug!(
                    "Transaction {} from {} is invalid: {:?}",
                    transaction.hash, transaction.data.header.sender, failure
                );
                return Ok(Some(TxResult::Invalid(failure)));
            }
            Err(header::HeaderFailure::BlockEnergyExhausted) => {
                warn!(
                    "Not enough energy left in block to check transaction {}",
                    transaction.hash
                );
                return Ok(None);
            }
        };

        let payload = match transaction.data.payload.decode() {
            Ok(payload) => payload,
            Err(err) => {
                debug!("Payload of transaction {} does not decode: {}", tc.hash, err);
                let summary = deposit::reject_undecodable(self, &tc)?;
                return Ok(Some(TxResult::Valid(summary)));
            }
        };

        let summary = match payload {
            Payload::DeployModule { module } => contracts::handle_deploy_module(self, &tc, module)?,
            Payload::InitContract {
                amount,
                module_ref,
                init_name,
                parameter,
            } => contracts::handle_init_contract(
                self, &tc, amount, module_ref, init_name, parameter,
            )?,
            Payload::Update {
                amount,
                address,
                receive_name,
                message,
            } => contracts::handle_update_contract(
                self,
                &tc,
                amount,
                address,
                receive_name,
                message,
            )?,
            Payload::Transfer { to_address, amount } => {
                transfers::handle_transfer(self, &tc, to_address, amount)?
            }
            Payload::AddBaker {
                keys,
                proofs,
                baking_stake,
                restake_earnings,
            } => bakers::handle_add_baker(self, &tc, keys, proofs, baking_stake, restake_earnings)?,
            Payload::RemoveBaker => bakers::handle_remove_baker(self, &tc)?,
            Payload::UpdateBakerStake { stake } => {
                bakers::handle_update_baker_stake(self, &tc, stake)?
            }
            Payload::UpdateBakerRestakeEarnings { restake_earnings } => {
                bakers::handle_update_baker_restake_earnings(self, &tc, restake_earnings)?
            }
            Payload::UpdateBakerKeys { keys, proofs } => {
                bakers::handle_update_baker_keys(self, &tc, keys, proofs)?
            }
            Payload::UpdateCredentialKeys { cred_id, keys } => {
                credentials::handle_update_credential_keys(self, &tc, cred_id, keys)?
            }
            Payload::EncryptedAmountTransfer { to, data } => {
                encrypted::handle_encrypted_amount_transfer(self, &tc, to, data)?
            }
            Payload::TransferToEncrypted { amount } => {
                encrypted::handle_transfer_to_encrypted(self, &tc, amount)?
            }
            Payload::TransferToPublic { data } => {
                encrypted::handle_transfer_to_public(self, &tc, data)?
            }
            Payload::TransferWithSchedule { to, schedule } => {
                transfers::handle_transfer_with_schedule(self, &tc, to, schedule)?
            }
            Payload::RegisterData { data } => transfers::handle_register_data(self, &tc, data)?,
        };

        match summary {
            Some(summary) => {
                debug!(
                    "Transaction {} from {} used {}: {}",
                    summary.hash,
                    tc.sender_address,
                    summary.energy_cost,
                    if summary.result.is_success() {
                        "success"
                    } else {
                        "rejected"
                    }
                );
                Ok(Some(TxResult::Valid(summary)))
            }
            None => {
                warn!(
                    "Block energy exhausted while executing transaction {}",
                    tc.hash
                );
                Ok(None)
            }
        }
    }

    /// Execute a credential deployment, creating a new account.
    ///
    /// Returns `None` if the energy remaining in the block does not cover deploying a
    /// credential.
    pub fn execute_credential_deployment(
        &mut self,
        credential: &CredentialWithMetadata,
    ) -> Result<Option<TxResult>, TransactionExecutionError> {
        credentials::execute_credential_deployment(self, credential)
    }

    /// Execute a chain-update instruction, enqueuing the update.
    pub fn execute_update_instruction(
        &mut self,
        update: &UpdateWithMetadata,
    ) -> Result<Option<TxResult>, TransactionExecutionError> {
        chain_updates::execute_update_instruction(self, update)
    }

    /// Execute any kind of block item.
    pub fn execute_block_item(
        &mut self,
        item: &BlockItem,
    ) -> Result<Option<TxResult>, TransactionExecutionError> {
        match &item.data {
            BlockItemKind::AccountTransaction(transaction) => {
                self.dispatch(&with_data(item, transaction.clone()))
            }
            BlockItemKind::CredentialDeployment(credential) => {
                self.execute_credential_deployment(&with_data(item, credential.clone()))
            }
            BlockItemKind::UpdateInstruction(update) => {
                self.execute_update_instruction(&with_data(item, update.clone()))
            }
        }
    }

    /// Record a valid item using `energy`, returning its index among the valid items.
    fn record_valid_item(&mut self, energy: Energy) -> u64 {
        self.energy_used = self.energy_used.saturating_add(energy);
        let index = self.valid_items;
        self.valid_items += 1;
        index
    }
}

fn with_data<T>(item: &BlockItem, data: T) -> WithMetadata<T> {
    WithMetadata {
        data,
        hash: item.hash,
        size: item.size,
        arrival: item.arrival,
    }
}

/// The balance of an account with the staged change applied.
pub(crate) fn current_balance<BSQ: BlockStateQuery>(
    block_state: &BSQ,
    account: &BSQ::Account,
    staged_delta: i128,
) -> Amount {
    amount_with_delta(block_state.account_balance(account), staged_delta)
}

/// The part of the balance of an account that can be transferred: the balance less
/// whichever is larger of the amount locked by release schedules and the baker stake.
pub(crate) fn available_amount<BSQ: BlockStateQuery>(
    block_state: &BSQ,
    account: &BSQ::Account,
    staged_delta: i128,
) -> Amount {
    let locked = block_state.account_locked_amount(account);
    let staked = block_state
        .account_baker(account)
        .map_or(Amount::ZERO, |baker| baker.staked_amount);
    current_balance(block_state, account, staged_delta).saturating_sub(locked.max(staked))
}

/// Whether the account has a credential that is valid at the slot time.
pub(crate) fn has_valid_credential<BSQ: BlockStateQuery>(
    block_state: &BSQ,
    account: &BSQ::Account,
    chain_metadata: &ChainMetadata,
) -> bool {
    block_state
        .account_credentials(account)
        .values()
        .any(|credential| credential.is_valid_at(chain_metadata.slot_time))
}

/// The policy of the newest credential of the account, the one with the highest index.
pub(crate) fn newest_credential_policies<BSQ: BlockStateQuery>(
    block_state: &BSQ,
    account: &BSQ::Account,
) -> Vec<Policy> {
    block_state
        .account_credentials(account)
        .into_values()
        .next_back()
        .map(|credential| vec![credential.policy])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn meter(limit: u64, block: u64, header: u64) -> TransactionExecutionImpl {
        TransactionExecutionImpl::new(
            AccountAddress([0u8; 32]),
            Energy(limit),
            Energy(block),
            Energy(header),
        )
    }

    #[test]
    fn test_tick_within_limits() {
        let mut energy = meter(1000, 5000, 100);
        energy.tick_energy(Energy(400)).unwrap();
        assert_eq!(energy.energy_used(), Energy(500));
        assert_eq!(energy.remaining_energy(), Energy(500));
    }

    #[test]
    fn test_tick_out_of_transaction_energy_uses_limit() {
        let mut energy = meter(1000, 5000, 100);
        assert_matches!(
            energy.tick_energy(Energy(901)),
            Err(OutOfEnergyError::Transaction)
        );
        assert_eq!(energy.energy_used(), Energy(1000));
    }

    #[test]
    fn test_tick_out_of_block_energy() {
        let mut energy = meter(1000, 600, 100);
        assert_eq!(energy.remaining_energy(), Energy(500));
        assert_matches!(energy.tick_energy(Energy(501)), Err(OutOfEnergyError::Block));
        assert_eq!(energy.energy_used(), Energy(100));
    }

    #[test]
    fn test_block_energy_equal_to_limit_rejects() {
        let mut energy = meter(1000, 1000, 100);
        assert_matches!(
            energy.tick_energy(Energy(901)),
            Err(OutOfEnergyError::Transaction)
        );
    }
}
