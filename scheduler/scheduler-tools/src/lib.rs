//! Building blocks offline: the pending items of a transaction pool are selected and
//! executed against an in-memory ledger loaded from a genesis file.

pub mod collaborators;
pub mod config;
pub mod genesis;
pub mod ledger;
pub mod pending;

use crate::collaborators::{NoContracts, PoolVerified};
use crate::config::BlockConfig;
use crate::ledger::InMemoryLedger;
use log::info;
use scheduler::block_filter::{filter_transactions, FilteredTransactions, TransactionGroup};
use scheduler::scheduler::{BlockExecution, TransactionExecutionError};

/// Select and execute the items of a block from the pending groups, updating the ledger.
///
/// # Errors
///
/// - [`TransactionExecutionError`] If executing an item fails with an unrecoverable error.
pub fn build_block(
    config: &BlockConfig,
    ledger: &mut InMemoryLedger,
    groups: Vec<TransactionGroup>,
) -> Result<FilteredTransactions, TransactionExecutionError> {
    ledger.set_block_time(config.chain_metadata.slot_time);
    let mut exec = BlockExecution::new(
        ledger,
        &NoContracts,
        &PoolVerified,
        config.chain_metadata,
        config.limits.max_block_energy,
    );
    let filtered = filter_transactions(&mut exec, config.limits.max_block_size, groups)?;
    info!(
        "Built block with {} items using {} of {}",
        filtered.added.len(),
        exec.energy_used(),
        config.limits.max_block_energy
    );
    Ok(filtered)
}
