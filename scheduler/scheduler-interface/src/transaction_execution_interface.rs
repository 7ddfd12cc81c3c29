//! Interface/context for transaction execution.

use crate::error::OutOfEnergyError;
use scheduler_types::types::primitives::{AccountAddress, Energy};

/// Operations and context related to transaction execution. This is the abstraction
/// seen by the transaction handlers in the scheduler.
pub trait TransactionExecution {
    /// The account address of the account initiating the transaction.
    fn sender_account_address(&self) -> AccountAddress;

    /// Energy that can still be used by the execution. This is the smaller of what remains
    /// of the transaction energy limit and what remains of the block energy.
    fn remaining_energy(&self) -> Energy;

    /// Reduce the available energy for the execution.
    ///
    /// # Arguments
    ///
    /// - `energy` The amount of energy to charge.
    ///
    /// # Errors
    ///
    /// - [`OutOfEnergyError::Transaction`] If the energy remaining of the transaction limit is
    ///   smaller than the ticked amount. All of the transaction energy limit is then used.
    /// - [`OutOfEnergyError::Block`] If the energy remaining in the block is the smaller one,
    ///   and is smaller than the ticked amount.
    fn tick_energy(&mut self, energy: Energy) -> Result<(), OutOfEnergyError>;
}
