use scheduler_types::types::primitives::{
    AccountAddress, AccountIndex, ContractAddress, ModuleRef,
};

/// Account with given address does not exist
#[derive(Debug, thiserror::Error)]
#[error("Account with address {0} does not exist")]
pub struct AccountNotFoundByAddressError(pub AccountAddress);

/// Account with given index does not exist
#[derive(Debug, thiserror::Error)]
#[error("Account with index {0} does not exist")]
pub struct AccountNotFoundByIndexError(pub AccountIndex);

/// Contract instance with given address does not exist
#[derive(Debug, thiserror::Error)]
#[error("Contract instance {0} does not exist")]
pub struct InstanceNotFoundError(pub ContractAddress);

/// Module with given reference is not deployed
#[derive(Debug, thiserror::Error)]
#[error("Module {0} does not exist")]
pub struct ModuleNotFoundError(pub ModuleRef);

/// Execution ran out of energy.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum OutOfEnergyError {
    /// The energy limit of the transaction was reached. The transaction is rejected.
    #[error("Execution out of energy")]
    Transaction,
    /// The energy remaining in the block was reached before the energy limit of the
    /// transaction. The transaction cannot be part of the block.
    #[error("Block energy exhausted")]
    Block,
}
