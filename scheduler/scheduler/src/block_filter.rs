//! Selecting the pending block items that go into a new block.
//!
//! Pending items come in groups: the transactions of one sender ordered by nonce, the
//! chain updates of one type ordered by sequence number, and single credential
//! deployments. The groups are processed in order of arrival. Within a group, the items
//! are executed in order until the block is full, recording each item as added, failed
//! or unprocessed.
//!
//! An account accepts exactly one transaction per nonce, so once a transaction succeeds,
//! the remaining transactions of the group with the same nonce fail. Once a transaction
//! fails, a transaction with a higher nonce can never succeed in the same block. If a
//! transaction does not fit in the block, a later transaction with the same nonce might
//! still fit and is tried, while transactions with higher nonces are left for a later
//! block.

use crate::block_state_interface::BlockStateOperations;
use crate::cost;
use crate::scheduler::{BlockExecution, TransactionExecutionError};
use crate::signatures::prevalidate_signatures;
use log::debug;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::execution::{FailureKind, TransactionSummary, TxResult};
use scheduler_types::types::primitives::{Nonce, TransactionTime, UpdateSequenceNumber};
use scheduler_types::types::transactions::{
    BlockItem, CredentialWithMetadata, TransactionWithMetadata, UpdateWithMetadata,
    WithMetadata,
};
use serde::{Deserialize, Serialize};

/// A group of pending block items that are processed together.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TransactionGroup {
    /// Transactions of a single sender, ordered by nonce.
    AccountTransactions(Vec<TransactionWithMetadata>),
    CredentialDeployment(CredentialWithMetadata),
    /// Chain updates of a single type, ordered by sequence number.
    UpdateInstructions(Vec<UpdateWithMetadata>),
}

impl TransactionGroup {
    /// Arrival time of the first item of the group. `None` for an empty group.
    pub fn arrival(&self) -> Option<TransactionTime> {
        match self {
            TransactionGroup::AccountTransactions(transactions) => {
                transactions.first().map(|transaction| transaction.arrival)
            }
            TransactionGroup::CredentialDeployment(credential) => Some(credential.arrival),
            TransactionGroup::UpdateInstructions(updates) => {
                updates.first().map(|update| update.arrival)
            }
        }
    }
}

/// Merge the groups into a single list ordered by the arrival of the first item of each
/// group. Groups that arrived at the same time keep the order they are given in, account
/// transactions before credentials before updates. Empty groups are dropped.
pub fn merge_by_arrival(
    account_groups: Vec<Vec<TransactionWithMetadata>>,
    credentials: Vec<CredentialWithMetadata>,
    update_groups: Vec<Vec<UpdateWithMetadata>>,
) -> Vec<TransactionGroup> {
    let mut groups: Vec<TransactionGroup> = account_groups
        .into_iter()
        .map(TransactionGroup::AccountTransactions)
        .chain(credentials.into_iter().map(TransactionGroup::CredentialDeployment))
        .chain(update_groups.into_iter().map(TransactionGroup::UpdateInstructions))
        .filter(|group| group.arrival().is_some())
        .collect();
    groups.sort_by_key(TransactionGroup::arrival);
    groups
}

/// The outcome of selecting the items of a block.
///
/// Every pending item ends up in exactly one of the lists.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredTransactions {
    /// Items included in the block, in execution order, with their outcomes.
    pub added: Vec<(BlockItem, TransactionSummary)>,
    /// Transactions that are invalid, and can never be included in this block.
    pub failed: Vec<(TransactionWithMetadata, FailureKind)>,
    pub failed_credentials: Vec<(CredentialWithMetadata, FailureKind)>,
    pub failed_updates: Vec<(UpdateWithMetadata, FailureKind)>,
    /// Transactions that did not fit in the block, but may fit in a later block.
    pub unprocessed: Vec<TransactionWithMetadata>,
    pub unprocessed_credentials: Vec<CredentialWithMetadata>,
    pub unprocessed_updates: Vec<UpdateWithMetadata>,
}

impl FilteredTransactions {
    /// The items added to the block, in order.
    pub fn block_items(&self) -> Vec<BlockItem> {
        self.added.iter().map(|(item, _)| item.clone()).collect()
    }
}

/// Result of trying to include one item of a group.
enum Attempt {
    Added(TransactionSummary),
    Failed(FailureKind),
    /// The item does not fit in what remains of the block.
    DoesNotFit,
}

/// Items of one group sorted by outcome.
struct GroupOutcome<T> {
    added: Vec<(WithMetadata<T>, TransactionSummary)>,
    failed: Vec<(WithMetadata<T>, FailureKind)>,
    unprocessed: Vec<WithMetadata<T>>,
}

/// Process the items of a group in order.
///
/// # Arguments
///
/// - `items` The items of the group, ordered by `sequence`.
/// - `sequence` The nonce or sequence number of an item.
/// - `duplicate` Failure of an item whose sequence number was used by an added item.
/// - `attempt` Try to include an item in the block.
fn process_group<T, S, A>(
    items: Vec<WithMetadata<T>>,
    sequence: S,
    duplicate: fn(u64) -> FailureKind,
    mut attempt: A,
) -> Result<GroupOutcome<T>, TransactionExecutionError>
where
    S: Fn(&T) -> u64,
    A: FnMut(&WithMetadata<T>) -> Result<Attempt, TransactionExecutionError>,
{
    let mut outcome = GroupOutcome {
        added: Vec::new(),
        failed: Vec::new(),
        unprocessed: Vec::new(),
    };
    let mut items = items.into_iter().peekable();
    while let Some(item) = items.next() {
        let current = sequence(&item.data);
        match attempt(&item)? {
            Attempt::Added(summary) => {
                debug!("Added {} to the block", item.hash);
                outcome.added.push((item, summary));
                while let Some(sibling) = items.next_if(|next| sequence(&next.data) == current) {
                    debug!("Failed {}: sequence number {} already used", sibling.hash, current);
                    outcome.failed.push((sibling, duplicate(current)));
                }
            }
            Attempt::Failed(failure) => {
                debug!("Failed {}: {:?}", item.hash, failure);
                outcome.failed.push((item, failure));
                if items
                    .peek()
                    .map_or(false, |next| sequence(&next.data) > current)
                {
                    for successor in items.by_ref() {
                        debug!("Failed {}: successor of an invalid item", successor.hash);
                        outcome
                            .failed
                            .push((successor, FailureKind::SuccessorOfInvalidTransaction));
                    }
                }
            }
            Attempt::DoesNotFit => {
                debug!("Unprocessed {}: does not fit in the block", item.hash);
                outcome.unprocessed.push(item);
                if !items
                    .peek()
                    .map_or(false, |next| sequence(&next.data) == current)
                {
                    outcome.unprocessed.extend(items.by_ref());
                }
            }
        }
    }
    Ok(outcome)
}

/// Select and execute the items of a block from the pending groups.
///
/// The groups are processed in the order given, see [`merge_by_arrival`]. Signatures of
/// all account transactions are verified in parallel before any item is executed.
///
/// # Arguments
///
/// - `exec` Execution of the block. The added items are executed against its state.
/// - `max_block_size` Maximum total size of the added items.
/// - `groups` The pending groups.
///
/// # Errors
///
/// - [`TransactionExecutionError`] If executing an item fails with an unrecoverable error.
pub fn filter_transactions<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    max_block_size: u64,
    groups: Vec<TransactionGroup>,
) -> Result<FilteredTransactions, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let pending: Vec<&TransactionWithMetadata> = groups
        .iter()
        .filter_map(|group| match group {
            TransactionGroup::AccountTransactions(transactions) => Some(transactions),
            _ => None,
        })
        .flatten()
        .collect();
    let cache = prevalidate_signatures(exec.block_state(), exec.crypto(), &pending);
    debug!("Verified signatures of {} pending transactions", cache.len());
    exec.set_signature_cache(cache);

    let account_creation_limit = usize::from(exec.chain_parameters().account_creation_limit);
    let mut filtered = FilteredTransactions::default();
    let mut size_used = 0u64;
    let mut credentials_added = 0usize;

    for group in groups {
        match group {
            TransactionGroup::AccountTransactions(transactions) => {
                let outcome = process_group(
                    transactions,
                    |transaction| transaction.header.nonce.0,
                    |nonce| FailureKind::NonSequentialNonce(Nonce(nonce).next()),
                    |transaction| {
                        let energy = transaction.data.header.energy_amount;
                        if energy > exec.max_block_energy() {
                            return Ok(Attempt::Failed(FailureKind::ExceedsMaxBlockEnergy));
                        }
                        if transaction.size > max_block_size {
                            return Ok(Attempt::Failed(FailureKind::ExceedsMaxBlockSize));
                        }
                        if size_used.saturating_add(transaction.size) > max_block_size
                            || energy > exec.remaining_energy()
                        {
                            return Ok(Attempt::DoesNotFit);
                        }
                        let attempt = match exec.dispatch(transaction)? {
                            Some(TxResult::Valid(summary)) => {
                                size_used += transaction.size;
                                Attempt::Added(summary)
                            }
                            Some(TxResult::Invalid(failure)) => Attempt::Failed(failure),
                            None => Attempt::DoesNotFit,
                        };
                        Ok(attempt)
                    },
                )?;
                filtered
                    .added
                    .extend(outcome.added.into_iter().map(|(t, s)| (t.into(), s)));
                filtered.failed.extend(outcome.failed);
                filtered.unprocessed.extend(outcome.unprocessed);
            }
            TransactionGroup::CredentialDeployment(credential) => {
                if credential.size > max_block_size {
                    debug!("Failed credential {}: larger than a block", credential.hash);
                    filtered
                        .failed_credentials
                        .push((credential, FailureKind::ExceedsMaxBlockSize));
                    continue;
                }
                if credentials_added >= account_creation_limit
                    || size_used.saturating_add(credential.size) > max_block_size
                    || exec.remaining_energy() < cost::DEPLOY_CREDENTIAL
                {
                    debug!(
                        "Unprocessed credential {}: does not fit in the block",
                        credential.hash
                    );
                    filtered.unprocessed_credentials.push(credential);
                    continue;
                }
                match exec.execute_credential_deployment(&credential)? {
                    Some(TxResult::Valid(summary)) => {
                        debug!("Added credential {} to the block", credential.hash);
                        size_used += credential.size;
                        credentials_added += 1;
                        filtered.added.push((credential.into(), summary));
                    }
                    Some(TxResult::Invalid(failure)) => {
                        debug!("Failed credential {}: {:?}", credential.hash, failure);
                        filtered.failed_credentials.push((credential, failure));
                    }
                    None => filtered.unprocessed_credentials.push(credential),
                }
            }
            TransactionGroup::UpdateInstructions(updates) => {
                let outcome = process_group(
                    updates,
                    |update| update.header.seq_number.0,
                    |seq| {
                        FailureKind::NonSequentialUpdateSequenceNumber(
                            UpdateSequenceNumber(seq).next(),
                        )
                    },
                    |update| {
                        if update.size > max_block_size {
                            return Ok(Attempt::Failed(FailureKind::ExceedsMaxBlockSize));
                        }
                        if size_used.saturating_add(update.size) > max_block_size {
                            return Ok(Attempt::DoesNotFit);
                        }
                        let attempt = match exec.execute_update_instruction(update)? {
                            Some(TxResult::Valid(summary)) => {
                                size_used += update.size;
                                Attempt::Added(summary)
                            }
                            Some(TxResult::Invalid(failure)) => Attempt::Failed(failure),
                            None => Attempt::DoesNotFit,
                        };
                        Ok(attempt)
                    },
                )?;
                filtered
                    .added
                    .extend(outcome.added.into_iter().map(|(u, s)| (u.into(), s)));
                filtered.failed_updates.extend(outcome.failed);
                filtered.unprocessed_updates.extend(outcome.unprocessed);
            }
        }
    }

    debug!(
        "Filtered block: {} added, {} failed, {} unprocessed, {} energy used",
        filtered.added.len(),
        filtered.failed.len() + filtered.failed_credentials.len() + filtered.failed_updates.len(),
        filtered.unprocessed.len()
            + filtered.unprocessed_credentials.len()
            + filtered.unprocessed_updates.len(),
        exec.energy_used()
    );
    Ok(filtered)
}
