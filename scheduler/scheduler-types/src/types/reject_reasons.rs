//! Reject reasons for transactions executed by the scheduler.
//!
//! A rejected transaction means that the transaction was included on chain, but
//! failed for some reason. The only effects of a rejected transaction are the charge of
//! energy and the increment of the sender's nonce.

use crate::types::accounts::AggregationVerifyKey;
use crate::types::contracts::{InitName, Parameter, ReceiveName};
use crate::types::primitives::{
    AccountAddress, Address, Amount, BakerId, ContractAddress, ModuleRef,
};
use serde::{Deserialize, Serialize};

/// A reason for why a transaction was rejected.
///
/// Rejected means included in a block, but the desired action was not achieved.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", content = "contents")]
pub enum RejectReason {
    /// Error raised when validating the module.
    ModuleNotWF,
    /// A module with the same hash already exists.
    ModuleHashAlreadyExists(ModuleRef),
    /// The account does not exist.
    InvalidAccountReference(AccountAddress),
    /// The module does not expose the init method.
    InvalidInitMethod(ModuleRef, InitName),
    /// The instance does not expose the receive method.
    InvalidReceiveMethod(ModuleRef, ReceiveName),
    /// The module does not exist.
    InvalidModuleReference(ModuleRef),
    /// The contract instance does not exist.
    InvalidContractAddress(ContractAddress),
    /// Runtime failure while executing contract code, other than running out of energy.
    RuntimeFailure,
    /// The sender cannot cover the amount.
    AmountTooLarge(Address, Amount),
    /// The payload could not be decoded.
    SerializationFailure,
    /// We ran out of energy to process this transaction.
    OutOfEnergy,
    /// The contract init function rejected with the given code.
    RejectedInit { reject_reason: i32 },
    /// The contract receive function rejected with the given code.
    RejectedReceive {
        reject_reason: i32,
        contract_address: ContractAddress,
        receive_name: ReceiveName,
        parameter: Parameter,
    },
    /// Nested contract invocations exceeded the maximum call depth.
    MaxCallDepthExceeded,
    /// A proof of knowledge of baker keys did not verify.
    InvalidProof,
    /// The account is already a baker.
    AlreadyABaker(BakerId),
    /// The account is not a baker.
    NotABaker(AccountAddress),
    /// The sender cannot cover the requested stake.
    InsufficientBalanceForBakerStake,
    /// The requested stake is below the minimum stake of a baker.
    StakeUnderMinimumThresholdForBaking,
    /// The baker has a pending change and cannot be changed until it takes effect.
    BakerInCooldown,
    /// The aggregation key is already used by another baker.
    DuplicateAggregationKey(AggregationVerifyKey),
    /// The credential does not exist on the sender account.
    NonExistentCredentialID,
    /// The signature threshold is zero or exceeds the number of keys.
    InvalidCredentialKeySignThreshold,
    /// The owner of the invoked contract has no valid credential.
    ReceiverContractNoCredential(ContractAddress),
    /// The receiving account has no valid credential.
    ReceiverAccountNoCredential(AccountAddress),
    /// The index of the input amounts is out of range.
    InvalidIndexOnEncryptedTransfer,
    /// The proof of an encrypted transfer did not verify.
    InvalidEncryptedAmountTransferProof,
    /// The proof of a transfer to the public balance did not verify.
    InvalidTransferToPublicProof,
    /// An encrypted transfer to the sender itself.
    EncryptedAmountSelfTransfer(AccountAddress),
    /// A transfer with schedule to the sender itself.
    ScheduledSelfTransfer(AccountAddress),
    /// The release timestamps of the schedule are not strictly increasing.
    NonIncreasingSchedule,
    /// The schedule is empty or one of its releases is zero.
    ZeroScheduledAmount,
    /// The first release of the schedule has already passed.
    FirstScheduledReleaseExpired,
}
