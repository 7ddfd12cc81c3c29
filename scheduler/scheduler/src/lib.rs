//! The transaction scheduler: checks and executes block items against a block state.
//!
//! Block items are executed one at a time through a [`BlockExecution`](scheduler::BlockExecution),
//! which tracks the energy used by the block. On top of it,
//! [`filter_transactions`](block_filter::filter_transactions) selects the items of a new block
//! from the pending items, and [`run_transactions`](executor::run_transactions) executes the
//! items of a given block.
//!
//! The block state, the contract interpreter and cryptographic verification are provided
//! by the caller through the traits in [`block_state_interface`] and the
//! `scheduler-interface` crate.

pub mod block_filter;
pub mod block_state_interface;
pub mod changeset;
pub mod cost;
pub mod executor;
pub mod scheduler;
pub mod signatures;
