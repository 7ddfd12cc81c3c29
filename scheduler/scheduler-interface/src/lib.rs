//! Interfaces of the collaborators of the transaction scheduler: contract execution,
//! cryptographic verification and energy metering.

pub mod contract_interpreter_interface;
pub mod crypto_interface;
pub mod error;
pub mod transaction_execution_interface;

pub use error::OutOfEnergyError;
pub use transaction_execution_interface::TransactionExecution;
