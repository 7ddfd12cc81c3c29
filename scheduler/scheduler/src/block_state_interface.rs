use scheduler_interface::error::{
    AccountNotFoundByAddressError, AccountNotFoundByIndexError, InstanceNotFoundError,
    ModuleNotFoundError,
};
use scheduler_types::types::accounts::{
    AccountAccessStructure, AccountBaker, AccountCredential, AccountEncryptedAmount,
    AggregationVerifyKey, CredentialIndex, CredentialPublicKeys, CredentialRegistrationId,
    EncryptedAmount, EncryptedAmountIndex, EncryptionKey,
};
use scheduler_types::types::contracts::{ContractState, InstanceInfo, ModuleInterface, NewInstance};
use scheduler_types::types::parameters::ChainParameters;
use scheduler_types::types::primitives::{
    AccountAddress, AccountIndex, AnonymityRevokerId, Amount, ContractAddress,
    IdentityProviderId, ModuleRef, Nonce, Timestamp, TransactionTime, UpdateSequenceNumber,
};
use scheduler_types::types::updates::{UpdateKeys, UpdatePayload, UpdateType};
use std::collections::BTreeMap;

/// Change in [`Amount`].
///
/// Represented as either add and subtract instead of a signed value, in order
/// to be able to represent the full range of possible deltas.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AmountDelta {
    /// Add the amount
    Add(Amount),
    /// Subtract the amount
    Subtract(Amount),
}

impl AmountDelta {
    /// Convert a signed net change into a delta.
    ///
    /// # Errors
    ///
    /// - [`UnderOrOverflowError`] The change does not fit in an [`Amount`].
    pub fn from_net_change(change: i128) -> Result<Self, UnderOrOverflowError> {
        let magnitude = u64::try_from(change.unsigned_abs()).map_err(|_| UnderOrOverflowError)?;
        if change >= 0 {
            Ok(AmountDelta::Add(Amount::from_micro_ccd(magnitude)))
        } else {
            Ok(AmountDelta::Subtract(Amount::from_micro_ccd(magnitude)))
        }
    }

    /// Apply the delta to an amount.
    pub fn apply(self, amount: Amount) -> Result<Amount, UnderOrOverflowError> {
        match self {
            AmountDelta::Add(delta) => amount.checked_add(delta),
            AmountDelta::Subtract(delta) => amount.checked_sub(delta),
        }
        .ok_or(UnderOrOverflowError)
    }
}

/// Queries on the state of a block in the chain.
pub trait BlockStateQuery {
    /// Opaque type that represents an account on chain.
    /// The account is guaranteed to exist on chain, when holding an instance of this type.
    type Account: Clone;

    /// Lookup the account using an account address.
    fn account_by_address(
        &self,
        address: &AccountAddress,
    ) -> Result<Self::Account, AccountNotFoundByAddressError>;

    /// Lookup the account using an account index.
    fn account_by_index(
        &self,
        index: AccountIndex,
    ) -> Result<Self::Account, AccountNotFoundByIndexError>;

    /// Get the account index for the account.
    fn account_index(&self, account: &Self::Account) -> AccountIndex;

    /// Get the canonical account address of the account, i.e. the address used as part of the
    /// credential deployment and not an alias.
    fn account_canonical_address(&self, account: &Self::Account) -> AccountAddress;

    /// Get the next nonce of the account.
    fn account_nonce(&self, account: &Self::Account) -> Nonce;

    /// Get the public balance of the account, including locked and staked amounts.
    fn account_balance(&self, account: &Self::Account) -> Amount;

    /// Get the amount of the balance locked by release schedules that have not yet been
    /// released.
    fn account_locked_amount(&self, account: &Self::Account) -> Amount;

    /// Get the credentials of the account by credential index.
    fn account_credentials(
        &self,
        account: &Self::Account,
    ) -> BTreeMap<CredentialIndex, AccountCredential>;

    /// Get the keys that can sign transactions on behalf of the account.
    fn account_verification_keys(&self, account: &Self::Account) -> AccountAccessStructure;

    /// Get the key amounts sent to the account are encrypted with.
    fn account_encryption_key(&self, account: &Self::Account) -> EncryptionKey;

    /// Get the encrypted balance of the account.
    fn account_encrypted_amount(&self, account: &Self::Account) -> AccountEncryptedAmount;

    /// Get the baker state of the account, if the account is a baker.
    fn account_baker(&self, account: &Self::Account) -> Option<AccountBaker>;

    /// Check whether an aggregation key is used by any baker.
    fn aggregation_key_in_use(&self, key: &AggregationVerifyKey) -> bool;

    /// Check whether a credential with the registration id has been deployed.
    fn credential_id_exists(&self, cred_id: &CredentialRegistrationId) -> bool;

    fn identity_provider_exists(&self, identity_provider: IdentityProviderId) -> bool;

    fn anonymity_revoker_exists(&self, anonymity_revoker: AnonymityRevokerId) -> bool;

    /// Lookup a contract instance.
    fn instance_by_address(
        &self,
        address: ContractAddress,
    ) -> Result<InstanceInfo, InstanceNotFoundError>;

    /// Lookup the interface of a deployed module.
    fn module_interface(&self, module_ref: &ModuleRef)
        -> Result<ModuleInterface, ModuleNotFoundError>;

    /// Get the chain parameters in effect.
    fn chain_parameters(&self) -> ChainParameters;

    /// Get the sequence number the next update of the given type must have.
    fn next_update_sequence_number(&self, update_type: UpdateType) -> UpdateSequenceNumber;

    /// Get the keys authorized to sign updates of the given type.
    fn update_keys(&self, update_type: UpdateType) -> UpdateKeys;
}

/// Operations on the state of a block in the chain.
pub trait BlockStateOperations: BlockStateQuery {
    /// Update the public balance of an account.
    ///
    /// # Arguments
    ///
    /// - `account` The account to update.
    /// - `amount_delta` The balance delta.
    ///
    /// # Errors
    ///
    /// - [`UnderOrOverflowError`] The update would overflow or underflow (result in negative balance)
    ///   the balance of the account.
    fn update_account_balance(
        &mut self,
        account: &Self::Account,
        amount_delta: AmountDelta,
    ) -> Result<(), UnderOrOverflowError>;

    /// Increment the nonce of the account.
    fn increment_account_nonce(&mut self, account: &Self::Account);

    /// Lock part of the balance of the account, releasing it according to the schedule.
    /// The balance itself is updated separately.
    fn add_release_schedule(&mut self, account: &Self::Account, schedule: &[(Timestamp, Amount)]);

    /// Replace the keys of a credential of the account.
    ///
    /// # Preconditions
    ///
    /// The credential must be one of the account's credentials.
    fn set_account_credential_keys(
        &mut self,
        account: &Self::Account,
        cred_id: &CredentialRegistrationId,
        keys: CredentialPublicKeys,
    );

    /// Remove the incoming encrypted amounts below `up_to_index`, and replace the self
    /// amount of the account with `new_self_amount`.
    fn replace_encrypted_amounts(
        &mut self,
        account: &Self::Account,
        up_to_index: EncryptedAmountIndex,
        new_self_amount: EncryptedAmount,
    );

    /// Add an incoming encrypted amount to the account. Returns the index it is given.
    fn add_incoming_encrypted_amount(
        &mut self,
        account: &Self::Account,
        amount: EncryptedAmount,
    ) -> EncryptedAmountIndex;

    /// Replace the self amount of the account, keeping the incoming amounts.
    fn set_self_encrypted_amount(&mut self, account: &Self::Account, amount: EncryptedAmount);

    /// Set or clear the baker state of the account.
    fn set_account_baker(&mut self, account: &Self::Account, baker: Option<AccountBaker>);

    /// Create an account with a single credential and a zero balance.
    ///
    /// # Preconditions
    ///
    /// No account with the address and no credential with the registration id of
    /// `credential` may exist.
    fn create_account(
        &mut self,
        address: AccountAddress,
        credential: AccountCredential,
    ) -> Self::Account;

    /// Record that the identity provider issued the identity behind a deployed credential.
    fn notify_identity_provider_credential(&mut self, identity_provider: IdentityProviderId);

    /// Store a deployed module.
    fn put_module(&mut self, module: ModuleInterface);

    /// Create a contract instance, returning its address.
    fn create_instance(&mut self, instance: NewInstance) -> ContractAddress;

    /// Update the balance, and optionally the state, of a contract instance.
    ///
    /// # Errors
    ///
    /// - [`UpdateInstanceError::NotFound`] The instance does not exist.
    /// - [`UpdateInstanceError::AmountOutOfRange`] The update would overflow or underflow
    ///   the balance.
    fn update_instance(
        &mut self,
        address: ContractAddress,
        amount_delta: AmountDelta,
        state: Option<ContractState>,
    ) -> Result<(), UpdateInstanceError>;

    /// Enqueue a chain update taking effect at `effective_time`.
    fn enqueue_update(&mut self, effective_time: TransactionTime, payload: UpdatePayload);

    /// Increment the sequence number of the given update type.
    fn increment_update_sequence_number(&mut self, update_type: UpdateType);

    /// Record fees charged for executing a block item, to be distributed as rewards.
    fn add_execution_cost(&mut self, amount: Amount);
}

/// The computation resulted in underflow or overflow.
#[derive(Debug, thiserror::Error)]
#[error("Amount underflow or overflow")]
pub struct UnderOrOverflowError;

/// Error updating a contract instance.
#[derive(Debug, thiserror::Error)]
pub enum UpdateInstanceError {
    #[error("{0}")]
    NotFound(#[from] InstanceNotFoundError),
    #[error("{0}")]
    AmountOutOfRange(#[from] UnderOrOverflowError),
}
