//! Executing the items of a given block, as when validating a block received from a peer.
//!
//! Unlike [`filter_transactions`](crate::block_filter::filter_transactions), every item must
//! be valid and fit in the block. Execution stops at the first item that is not. The caller
//! discards the block state in that case.

use crate::block_state_interface::BlockStateOperations;
use crate::scheduler::{BlockExecution, TransactionExecutionError};
use log::{debug, warn};
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::execution::{FailureKind, TransactionSummary, TxResult};
use scheduler_types::types::primitives::TransactionHash;
use scheduler_types::types::transactions::BlockItem;
use serde::{Deserialize, Serialize};

/// The reason executing the items of a block stopped.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockItemFailure {
    /// The item at `index` is invalid.
    Invalid {
        index: usize,
        hash: TransactionHash,
        failure: FailureKind,
    },
    /// The item at `index` does not fit in the energy remaining in the block.
    ExceededBlockEnergy { index: usize, hash: TransactionHash },
}

/// Execute the items in order, returning the summary of each.
///
/// # Errors
///
/// - [`TransactionExecutionError`] If executing an item fails with an unrecoverable error.
pub fn run_transactions<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    items: &[BlockItem],
) -> Result<Result<Vec<(BlockItem, TransactionSummary)>, BlockItemFailure>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let mut summaries = Vec::with_capacity(items.len());
    let result = execute_each(exec, items, |item, summary| {
        summaries.push((item.clone(), summary))
    })?;
    Ok(result.map(|()| summaries))
}

/// Execute the items in order, discarding the summaries.
///
/// # Errors
///
/// - [`TransactionExecutionError`] If executing an item fails with an unrecoverable error.
pub fn exec_transactions<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    items: &[BlockItem],
) -> Result<Result<(), BlockItemFailure>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    execute_each(exec, items, |_, _| ())
}

fn execute_each<BSO, CI, CV, F>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    items: &[BlockItem],
    mut on_valid: F,
) -> Result<Result<(), BlockItemFailure>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
    F: FnMut(&BlockItem, TransactionSummary),
{
    for (index, item) in items.iter().enumerate() {
        match exec.execute_block_item(item)? {
            Some(TxResult::Valid(summary)) => on_valid(item, summary),
            Some(TxResult::Invalid(failure)) => {
                debug!("Block item {} at {} is invalid: {:?}", item.hash, index, failure);
                return Ok(Err(BlockItemFailure::Invalid {
                    index,
                    hash: item.hash,
                    failure,
                }));
            }
            None => {
                warn!("Block item {} at {} exceeds the block energy", item.hash, index);
                return Ok(Err(BlockItemFailure::ExceededBlockEnergy {
                    index,
                    hash: item.hash,
                }));
            }
        }
    }
    Ok(Ok(()))
}
