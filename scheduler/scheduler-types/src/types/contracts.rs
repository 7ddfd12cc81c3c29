//! Smart contract related types: modules, instances and the actions requested by contracts.

use crate::types::primitives::{
    hex_bytes, AccountAddress, Amount, ContractAddress, ModuleRef,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of a contract init function, e.g. `init_counter`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitName(pub String);

/// Name of a contract receive function, e.g. `counter.increment`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiveName(pub String);

impl fmt::Display for InitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ReceiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameter passed to a contract function.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameter(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// State of a contract instance. Opaque to the scheduler.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractState(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// An event logged by a contract.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractEvent(#[serde(with = "hex_bytes")] pub Vec<u8>);

/// The interface of a deployed module: the functions it exposes together with the
/// processed artifact executed by the contract interpreter.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ModuleInterface {
    pub module_ref: ModuleRef,
    /// Size of the module source in bytes.
    pub size: u64,
    /// Init functions and the receive functions of the contract each of them creates.
    pub exposed: BTreeMap<InitName, BTreeSet<ReceiveName>>,
    /// Processed module, as understood by the contract interpreter.
    #[serde(with = "hex_bytes")]
    pub artifact: Vec<u8>,
}

/// Read-only view of a contract instance.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub address: ContractAddress,
    /// Account that created the instance.
    pub owner: AccountAddress,
    pub amount: Amount,
    pub state: ContractState,
    pub module_ref: ModuleRef,
    pub init_name: InitName,
    /// Receive functions the instance can be invoked with.
    pub receive_methods: BTreeSet<ReceiveName>,
}

/// A contract instance to be created in the ledger.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NewInstance {
    pub owner: AccountAddress,
    pub amount: Amount,
    pub state: ContractState,
    pub module_ref: ModuleRef,
    pub init_name: InitName,
    pub receive_methods: BTreeSet<ReceiveName>,
}

/// The actions a contract requests as the result of being invoked.
///
/// The tree is processed depth first, left to right.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionsTree {
    /// Accept the invocation, no further effects.
    Accept,
    /// Transfer an amount from the contract to an account.
    SimpleTransfer { to: AccountAddress, amount: Amount },
    /// Invoke a receive function of a contract instance.
    Send {
        to: ContractAddress,
        receive_name: ReceiveName,
        amount: Amount,
        parameter: Parameter,
    },
    /// Execute both actions, left first. Rejected if either is rejected.
    And(Box<ActionsTree>, Box<ActionsTree>),
    /// Execute the left action. If it is rejected, its effects are discarded and the
    /// right action is executed instead.
    Or(Box<ActionsTree>, Box<ActionsTree>),
}

impl ActionsTree {
    pub fn and(left: ActionsTree, right: ActionsTree) -> Self {
        ActionsTree::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: ActionsTree, right: ActionsTree) -> Self {
        ActionsTree::Or(Box::new(left), Box::new(right))
    }
}
