//! Outcomes of executing block items.

use crate::types::events::Event;
use crate::types::primitives::{
    AccountAddress, Amount, Energy, Nonce, TransactionHash, UpdateSequenceNumber,
};
use crate::types::reject_reasons::RejectReason;
use crate::types::transactions::TransactionType;
use serde::{Deserialize, Serialize};

/// Reason a block item is invalid: it cannot be part of a block at all.
///
/// Unlike a [`RejectReason`], a failure has no effect on the chain state and nothing is
/// charged.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "failure", content = "details")]
pub enum FailureKind {
    /// The sender cannot pay for the deposited energy.
    InsufficientFunds,
    /// The signatures do not verify against the keys of the sender.
    IncorrectSignature,
    /// The nonce is not the next nonce of the sender, which is given.
    NonSequentialNonce(Nonce),
    /// A previous transaction of the sender with a lower nonce failed.
    SuccessorOfInvalidTransaction,
    /// The sender account does not exist.
    UnknownAccount,
    /// The deposited energy does not cover the header check.
    DepositInsufficient,
    /// The sender has no credential valid at the slot time.
    NoValidCredential,
    /// The expiry time has passed.
    ExpiredTransaction,
    /// The deposited energy exceeds the energy of a block.
    ExceedsMaxBlockEnergy,
    /// The item is larger than a block.
    ExceedsMaxBlockSize,
    /// The declared payload size does not match the payload or exceeds the maximum.
    InvalidPayloadSize,
    /// A chain-update payload could not be decoded or does not match its declared type.
    SerializationFailure,
    /// The credential registration id is already in use.
    DuplicateAccountRegistrationId,
    NonExistentIdentityProvider,
    UnsupportedAnonymityRevokers,
    /// The proofs of the credential do not verify or its policy has expired.
    AccountCredentialInvalid,
    /// The sequence number is not the next of its update type, which is given.
    NonSequentialUpdateSequenceNumber(UpdateSequenceNumber),
    /// The effective time of a chain update is not after its timeout.
    InvalidUpdateTime,
}

/// Outcome of a block item that is valid.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ValidResult {
    /// The item was successfully applied.
    Success { events: Vec<Event> },
    /// The transaction was rejected, but is included in the block as a rejected
    /// transaction.
    Reject { reason: RejectReason },
}

impl ValidResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidResult::Success { .. })
    }
}

/// Summary of a block item included in a block.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    /// Sender of an account transaction. Credential deployments and chain updates have no
    /// sender.
    pub sender: Option<AccountAddress>,
    pub hash: TransactionHash,
    /// Amount charged to the sender.
    pub cost: Amount,
    /// Energy used by the item.
    pub energy_cost: Energy,
    /// Type of an account transaction. `None` for other block items, and for account
    /// transactions whose payload could not be decoded.
    pub transaction_type: Option<TransactionType>,
    pub result: ValidResult,
    /// Position of the item among the valid items of the block.
    pub index: u64,
}

/// Result of executing a single block item.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", content = "details")]
pub enum TxResult {
    /// The item is valid, and was applied.
    Valid(TransactionSummary),
    /// The item is invalid, and the state is unchanged.
    Invalid(FailureKind),
}
