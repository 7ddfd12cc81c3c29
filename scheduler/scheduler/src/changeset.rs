//! Staged changes to balances and contract states made by one transaction.
//!
//! Changes are accumulated while a transaction executes, including nested contract
//! calls, and only written to the block state when the transaction succeeds. Discarding
//! the changes of a rejected transaction is dropping the change set.

use crate::block_state_interface::{AmountDelta, BlockStateOperations};
use crate::scheduler::TransactionExecutionError;
use scheduler_types::types::contracts::ContractState;
use scheduler_types::types::primitives::{AccountIndex, Amount, ContractAddress};
use std::collections::BTreeMap;

/// Staged change to a contract instance.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
struct InstanceChange {
    /// Net change of the instance balance.
    amount_delta: i128,
    /// New state of the instance, if it was updated.
    state: Option<ContractState>,
}

/// Staged changes to accounts and contract instances.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ChangeSet {
    /// Net change of account balances.
    accounts: BTreeMap<AccountIndex, i128>,
    instances: BTreeMap<ContractAddress, InstanceChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net change staged for the balance of an account.
    pub fn account_delta(&self, account: AccountIndex) -> i128 {
        self.accounts.get(&account).copied().unwrap_or(0)
    }

    /// Stage a change of the balance of an account.
    pub fn add_account_amount(&mut self, account: AccountIndex, delta: i128) {
        *self.accounts.entry(account).or_default() += delta;
    }

    /// Stage a transfer from one account to another.
    pub fn transfer_between_accounts(
        &mut self,
        from: AccountIndex,
        to: AccountIndex,
        amount: Amount,
    ) {
        self.add_account_amount(from, -i128::from(amount.micro_ccd));
        self.add_account_amount(to, i128::from(amount.micro_ccd));
    }

    /// Net change staged for the balance of an instance.
    pub fn instance_delta(&self, address: ContractAddress) -> i128 {
        self.instances
            .get(&address)
            .map_or(0, |change| change.amount_delta)
    }

    /// Stage a change of the balance of an instance.
    pub fn add_instance_amount(&mut self, address: ContractAddress, delta: i128) {
        self.instances.entry(address).or_default().amount_delta += delta;
    }

    /// The staged state of an instance, if it has been updated.
    pub fn instance_state(&self, address: ContractAddress) -> Option<&ContractState> {
        self.instances
            .get(&address)
            .and_then(|change| change.state.as_ref())
    }

    /// Stage a new state for an instance.
    pub fn set_instance_state(&mut self, address: ContractAddress, state: ContractState) {
        self.instances.entry(address).or_default().state = Some(state);
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.values().all(|delta| *delta == 0) && self.instances.is_empty()
    }

    /// Write the staged changes to the block state.
    ///
    /// # Errors
    ///
    /// - [`TransactionExecutionError::StateInvariantBroken`] A changed account or instance
    ///   does not exist, or a balance would become negative or overflow. Execution checks
    ///   both before staging a change.
    pub fn commit<BSO: BlockStateOperations>(
        self,
        block_state: &mut BSO,
    ) -> Result<(), TransactionExecutionError> {
        for (index, delta) in self.accounts {
            if delta == 0 {
                continue;
            }
            let account = block_state.account_by_index(index).map_err(|err| {
                TransactionExecutionError::StateInvariantBroken(err.to_string())
            })?;
            let delta = AmountDelta::from_net_change(delta)?;
            block_state.update_account_balance(&account, delta)?;
        }
        for (address, change) in self.instances {
            let delta = AmountDelta::from_net_change(change.amount_delta)?;
            block_state.update_instance(address, delta, change.state)?;
        }
        Ok(())
    }
}

/// Apply a staged net change to an amount read from the block state. Returns zero if the
/// result would be negative.
pub fn amount_with_delta(amount: Amount, delta: i128) -> Amount {
    let total = i128::from(amount.micro_ccd) + delta;
    Amount::from_micro_ccd(u64::try_from(total.max(0)).unwrap_or(u64::MAX))
}
