//! Events produced by block items executed by the scheduler.
//! Events represent the observable changes to the chain state made by a successful block item.

use crate::types::accounts::{
    AggregationVerifyKey, CredentialRegistrationId, EncryptedAmount, EncryptedAmountIndex,
    VerifyKey,
};
use crate::types::contracts::{ContractEvent, InitName, Parameter, ReceiveName};
use crate::types::primitives::{
    hex_bytes, AccountAddress, Address, Amount, BakerId, ContractAddress, ModuleRef, Timestamp,
    TransactionTime,
};
use crate::types::updates::UpdatePayload;
use serde::{Deserialize, Serialize};

/// Block item event.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// A smart contract module was deployed.
    ModuleDeployed { module_ref: ModuleRef },
    /// A contract instance was created.
    ContractInitialized {
        module_ref: ModuleRef,
        address: ContractAddress,
        amount: Amount,
        init_name: InitName,
        /// Events logged by the init function.
        events: Vec<ContractEvent>,
    },
    /// A contract instance was invoked and accepted the invocation.
    Updated {
        address: ContractAddress,
        instigator: Address,
        amount: Amount,
        message: Parameter,
        receive_name: ReceiveName,
        /// Events logged by the receive function.
        events: Vec<ContractEvent>,
    },
    /// An amount was transferred to an account.
    Transferred {
        from: Address,
        amount: Amount,
        to: AccountAddress,
    },
    /// An account was created by a credential deployment.
    AccountCreated { address: AccountAddress },
    /// A credential was deployed on an account.
    CredentialDeployed {
        reg_id: CredentialRegistrationId,
        account: AccountAddress,
    },
    BakerAdded {
        baker_id: BakerId,
        account: AccountAddress,
        sign_key: VerifyKey,
        election_key: VerifyKey,
        aggregation_key: AggregationVerifyKey,
        stake: Amount,
        restake_earnings: bool,
    },
    /// A baker will be removed once the cooldown has passed.
    BakerRemoved {
        baker_id: BakerId,
        account: AccountAddress,
        effective_time: Timestamp,
    },
    BakerStakeIncreased {
        baker_id: BakerId,
        account: AccountAddress,
        new_stake: Amount,
    },
    /// The stake of a baker will be reduced once the cooldown has passed.
    BakerStakeDecreased {
        baker_id: BakerId,
        account: AccountAddress,
        new_stake: Amount,
        effective_time: Timestamp,
    },
    BakerSetRestakeEarnings {
        baker_id: BakerId,
        account: AccountAddress,
        restake_earnings: bool,
    },
    BakerKeysUpdated {
        baker_id: BakerId,
        account: AccountAddress,
        sign_key: VerifyKey,
        election_key: VerifyKey,
        aggregation_key: AggregationVerifyKey,
    },
    CredentialKeysUpdated { cred_id: CredentialRegistrationId },
    /// An encrypted amount was received by an account.
    NewEncryptedAmount {
        account: AccountAddress,
        new_index: EncryptedAmountIndex,
        encrypted_amount: EncryptedAmount,
    },
    /// Incoming encrypted amounts up to `up_to_index` were combined and replaced by a new
    /// self amount.
    EncryptedAmountsRemoved {
        account: AccountAddress,
        new_amount: EncryptedAmount,
        input_amount: EncryptedAmount,
        up_to_index: EncryptedAmountIndex,
    },
    AmountAddedByDecryption {
        account: AccountAddress,
        amount: Amount,
    },
    EncryptedSelfAmountAdded {
        account: AccountAddress,
        new_amount: EncryptedAmount,
        amount: Amount,
    },
    TransferredWithSchedule {
        from: AccountAddress,
        to: AccountAddress,
        amount: Vec<(Timestamp, Amount)>,
    },
    DataRegistered {
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
    /// A chain update was enqueued and takes effect at `effective_time`.
    UpdateEnqueued {
        effective_time: TransactionTime,
        payload: UpdatePayload,
    },
}
