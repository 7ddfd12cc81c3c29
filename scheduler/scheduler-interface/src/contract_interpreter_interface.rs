//! Interface to the smart contract interpreter.
//!
//! The interpreter is a black box to the scheduler: it runs one contract entry point with
//! an energy budget and reports the new contract state, the actions requested by the
//! contract and the events it logged.

use scheduler_types::types::accounts::Policy;
use scheduler_types::types::contracts::{
    ActionsTree, ContractEvent, ContractState, InitName, ModuleInterface, Parameter,
    ReceiveName,
};
use scheduler_types::types::parameters::ChainMetadata;
use scheduler_types::types::primitives::{
    AccountAddress, Address, Amount, ContractAddress, Energy, ModuleRef,
};

/// Context of a call to a contract init function.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InitContext {
    /// The account creating the instance.
    pub origin: AccountAddress,
    /// Policies of the newest credential of the origin account.
    pub sender_policies: Vec<Policy>,
}

/// Context of a call to a contract receive function.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReceiveContext {
    /// The account that sent the top-level transaction.
    pub invoker: AccountAddress,
    pub self_address: ContractAddress,
    /// Balance of the instance before the amount of the call is added.
    pub self_balance: Amount,
    /// The immediate sender of the message, an account or a contract.
    pub sender: Address,
    /// The account owning the instance.
    pub owner: AccountAddress,
    /// Policies of the newest credential of the invoker account.
    pub sender_policies: Vec<Policy>,
}

/// Result of a successful call to an init function.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InitResult {
    pub state: ContractState,
    pub events: Vec<ContractEvent>,
}

/// Result of a successful call to a receive function.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReceiveResult {
    pub state: ContractState,
    pub actions: ActionsTree,
    pub events: Vec<ContractEvent>,
}

/// Outcome of running a contract function.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InterpreterOutcome<T> {
    /// The function returned successfully.
    Success { result: T, energy_used: Energy },
    /// The function rejected the call with the given code.
    Reject { reason: i32, energy_used: Energy },
    /// The function trapped.
    Trap { energy_used: Energy },
    /// The energy budget was exhausted.
    OutOfEnergy,
}

/// The contract interpreter.
///
/// Calls are synchronous and bounded by the energy budget given. The energy used reported
/// in an outcome never exceeds the budget.
pub trait ContractInterpreter {
    /// Validate and process a module for deployment. Returns `None` if the module is not
    /// well-formed.
    ///
    /// # Arguments
    ///
    /// - `module_ref` The reference the module will be stored under, the hash of `source`.
    /// - `source` The module as submitted in the deploy transaction.
    fn validate_module(&self, module_ref: ModuleRef, source: &[u8]) -> Option<ModuleInterface>;

    /// Run the init function `init_name` of a module.
    #[allow(clippy::too_many_arguments)]
    fn apply_init(
        &self,
        module: &ModuleInterface,
        chain_metadata: &ChainMetadata,
        context: &InitContext,
        init_name: &InitName,
        parameter: &Parameter,
        amount: Amount,
        energy: Energy,
    ) -> InterpreterOutcome<InitResult>;

    /// Run the receive function `receive_name` of an instance with the given state.
    #[allow(clippy::too_many_arguments)]
    fn apply_receive(
        &self,
        module: &ModuleInterface,
        chain_metadata: &ChainMetadata,
        context: &ReceiveContext,
        receive_name: &ReceiveName,
        parameter: &Parameter,
        amount: Amount,
        state: &ContractState,
        energy: Energy,
    ) -> InterpreterOutcome<ReceiveResult>;
}
