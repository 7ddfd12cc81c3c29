//! Pending block items as exported by a transaction pool, and their grouping for the
//! block filter.

use scheduler::block_filter::{merge_by_arrival, TransactionGroup};
use scheduler_types::types::primitives::{AccountAddress, TransactionTime};
use scheduler_types::types::transactions::{
    BlockItemKind, CredentialWithMetadata, TransactionWithMetadata, UpdateWithMetadata,
    WithMetadata,
};
use scheduler_types::types::updates::UpdateType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors loading a pending items file.
#[derive(Debug, thiserror::Error)]
pub enum PendingError {
    #[error("Could not read pending items: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse pending items: {0}")]
    Json(#[from] serde_json::Error),
}

/// A block item waiting in the pool.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    /// Time the pool received the item.
    pub arrival: TransactionTime,
    pub block_item: BlockItemKind,
}

/// Pending items sorted by kind. Hashes and sizes are computed from the item encodings.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PendingItems {
    pub transactions: Vec<TransactionWithMetadata>,
    pub credentials: Vec<CredentialWithMetadata>,
    pub updates: Vec<UpdateWithMetadata>,
}

impl PendingItems {
    pub fn len(&self) -> usize {
        self.transactions.len() + self.credentials.len() + self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group the items for the block filter: the transactions of each sender ordered by
    /// nonce, the updates of each type ordered by sequence number, and each credential
    /// deployment on its own. Items with the same nonce or sequence number keep their order
    /// of arrival.
    pub fn into_groups(self) -> Vec<TransactionGroup> {
        let mut by_sender: BTreeMap<AccountAddress, Vec<TransactionWithMetadata>> =
            BTreeMap::new();
        for transaction in self.transactions {
            by_sender
                .entry(transaction.data.header.sender)
                .or_default()
                .push(transaction);
        }
        let account_groups = by_sender
            .into_values()
            .map(|mut transactions| {
                transactions.sort_by_key(|t| (t.data.header.nonce, t.arrival));
                transactions
            })
            .collect();

        let mut by_type: BTreeMap<UpdateType, Vec<UpdateWithMetadata>> = BTreeMap::new();
        for update in self.updates {
            by_type.entry(update.data.update_type).or_default().push(update);
        }
        let update_groups = by_type
            .into_values()
            .map(|mut updates| {
                updates.sort_by_key(|u| (u.data.header.seq_number, u.arrival));
                updates
            })
            .collect();

        merge_by_arrival(account_groups, self.credentials, update_groups)
    }
}

impl FromIterator<PendingItem> for PendingItems {
    fn from_iter<I: IntoIterator<Item = PendingItem>>(items: I) -> Self {
        let mut pending = PendingItems::default();
        for PendingItem {
            arrival,
            block_item,
        } in items
        {
            match block_item {
                BlockItemKind::AccountTransaction(transaction) => pending
                    .transactions
                    .push(WithMetadata::new(transaction, arrival)),
                BlockItemKind::CredentialDeployment(credential) => pending
                    .credentials
                    .push(WithMetadata::new(credential, arrival)),
                BlockItemKind::UpdateInstruction(update) => {
                    pending.updates.push(WithMetadata::new(update, arrival))
                }
            }
        }
        pending
    }
}

/// Read the pending items from a JSON file holding a list of [`PendingItem`].
pub fn load_pending(path: &Path) -> Result<PendingItems, PendingError> {
    let bytes = std::fs::read(path)?;
    let items: Vec<PendingItem> = serde_json::from_slice(&bytes)?;
    Ok(items.into_iter().collect())
}
