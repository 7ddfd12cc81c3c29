//! An in-memory ledger implementing the block state traits of the scheduler.
//!
//! Accounts are kept in a vector by index, with a map from address to index. The ledger
//! keeps no history: it is the state of a single block under construction.

use crate::genesis::Genesis;
use log::warn;
use scheduler::block_state_interface::{
    AmountDelta, BlockStateOperations, BlockStateQuery, UnderOrOverflowError,
    UpdateInstanceError,
};
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
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct LedgerAccount {
    address: AccountAddress,
    balance: Amount,
    nonce: Nonce,
    credentials: BTreeMap<CredentialIndex, AccountCredential>,
    threshold: u8,
    encryption_key: EncryptionKey,
    encrypted_amount: AccountEncryptedAmount,
    baker: Option<AccountBaker>,
    release_schedule: Vec<(Timestamp, Amount)>,
}

/// Ledger state held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    accounts: Vec<LedgerAccount>,
    account_indices: BTreeMap<AccountAddress, AccountIndex>,
    instances: BTreeMap<ContractAddress, InstanceInfo>,
    /// Index of the next contract instance.
    next_instance_index: u64,
    modules: BTreeMap<ModuleRef, ModuleInterface>,
    identity_providers: BTreeSet<IdentityProviderId>,
    anonymity_revokers: BTreeSet<AnonymityRevokerId>,
    chain_parameters: ChainParameters,
    update_keys: BTreeMap<UpdateType, UpdateKeys>,
    update_sequence_numbers: BTreeMap<UpdateType, UpdateSequenceNumber>,
    enqueued_updates: Vec<EnqueuedUpdate>,
    /// Fees of the block so far. Saturates rather than fails.
    execution_costs: Amount,
    identity_provider_credentials: BTreeMap<IdentityProviderId, u64>,
    /// Slot time of the block. Releases at or before it are no longer locked.
    block_time: Timestamp,
}

/// A chain update waiting to take effect.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedUpdate {
    pub effective_time: TransactionTime,
    pub payload: UpdatePayload,
}

impl InMemoryLedger {
    pub fn from_genesis(genesis: Genesis) -> Self {
        let mut account_indices = BTreeMap::new();
        let accounts = genesis
            .accounts
            .into_iter()
            .enumerate()
            .map(|(index, account)| {
                account_indices.insert(account.address, AccountIndex(index as u64));
                LedgerAccount {
                    address: account.address,
                    balance: account.balance,
                    nonce: account.nonce,
                    credentials: account.credentials,
                    threshold: account.threshold,
                    encryption_key: account.encryption_key,
                    encrypted_amount: account.encrypted_amount,
                    baker: account.baker,
                    release_schedule: Vec::new(),
                }
            })
            .collect();
        InMemoryLedger {
            accounts,
            account_indices,
            instances: BTreeMap::new(),
            next_instance_index: 0,
            modules: BTreeMap::new(),
            identity_providers: genesis.identity_providers,
            anonymity_revokers: genesis.anonymity_revokers,
            chain_parameters: genesis.chain_parameters,
            update_keys: genesis.update_keys,
            update_sequence_numbers: genesis.update_sequence_numbers,
            enqueued_updates: Vec::new(),
            execution_costs: Amount::ZERO,
            identity_provider_credentials: BTreeMap::new(),
            block_time: Timestamp(0),
        }
    }

    /// Set the slot time of the block under construction.
    pub fn set_block_time(&mut self, slot_time: Timestamp) {
        self.block_time = slot_time;
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Chain updates enqueued by the block, in order.
    pub fn enqueued_updates(&self) -> &[EnqueuedUpdate] {
        &self.enqueued_updates
    }

    /// Fees charged by the block.
    pub fn execution_costs(&self) -> Amount {
        self.execution_costs
    }

    /// Number of credentials deployed in the block per identity provider.
    pub fn identity_provider_credentials(&self) -> &BTreeMap<IdentityProviderId, u64> {
        &self.identity_provider_credentials
    }

    fn account(&self, account: &AccountIndex) -> &LedgerAccount {
        &self.accounts[account.0 as usize]
    }

    fn account_mut(&mut self, account: &AccountIndex) -> &mut LedgerAccount {
        &mut self.accounts[account.0 as usize]
    }
}

impl BlockStateQuery for InMemoryLedger {
    type Account = AccountIndex;

    fn account_by_address(
        &self,
        address: &AccountAddress,
    ) -> Result<Self::Account, AccountNotFoundByAddressError> {
        self.account_indices
            .get(address)
            .copied()
            .ok_or(AccountNotFoundByAddressError(*address))
    }

    fn account_by_index(
        &self,
        index: AccountIndex,
    ) -> Result<Self::Account, AccountNotFoundByIndexError> {
        if (index.0 as usize) < self.accounts.len() {
            Ok(index)
        } else {
            Err(AccountNotFoundByIndexError(index))
        }
    }

    fn account_index(&self, account: &Self::Account) -> AccountIndex {
        *account
    }

    fn account_canonical_address(&self, account: &Self::Account) -> AccountAddress {
        self.account(account).address
    }

    fn account_nonce(&self, account: &Self::Account) -> Nonce {
        self.account(account).nonce
    }

    fn account_balance(&self, account: &Self::Account) -> Amount {
        self.account(account).balance
    }

    fn account_locked_amount(&self, account: &Self::Account) -> Amount {
        let locked = self
            .account(account)
            .release_schedule
            .iter()
            .filter(|(release, _)| *release > self.block_time)
            .map(|(_, amount)| amount.micro_ccd)
            .fold(0u64, u64::saturating_add);
        Amount::from_micro_ccd(locked)
    }

    fn account_credentials(
        &self,
        account: &Self::Account,
    ) -> BTreeMap<CredentialIndex, AccountCredential> {
        self.account(account).credentials.clone()
    }

    fn account_verification_keys(&self, account: &Self::Account) -> AccountAccessStructure {
        let account = self.account(account);
        AccountAccessStructure {
            keys: account
                .credentials
                .iter()
                .map(|(index, credential)| (*index, credential.keys.clone()))
                .collect(),
            threshold: account.threshold,
        }
    }

    fn account_encryption_key(&self, account: &Self::Account) -> EncryptionKey {
        self.account(account).encryption_key.clone()
    }

    fn account_encrypted_amount(&self, account: &Self::Account) -> AccountEncryptedAmount {
        self.account(account).encrypted_amount.clone()
    }

    fn account_baker(&self, account: &Self::Account) -> Option<AccountBaker> {
        self.account(account).baker.clone()
    }

    fn aggregation_key_in_use(&self, key: &AggregationVerifyKey) -> bool {
        self.accounts
            .iter()
            .filter_map(|account| account.baker.as_ref())
            .any(|baker| baker.keys.aggregation_verify_key == *key)
    }

    fn credential_id_exists(&self, cred_id: &CredentialRegistrationId) -> bool {
        self.accounts
            .iter()
            .flat_map(|account| account.credentials.values())
            .any(|credential| credential.cred_id == *cred_id)
    }

    fn identity_provider_exists(&self, identity_provider: IdentityProviderId) -> bool {
        self.identity_providers.contains(&identity_provider)
    }

    fn anonymity_revoker_exists(&self, anonymity_revoker: AnonymityRevokerId) -> bool {
        self.anonymity_revokers.contains(&anonymity_revoker)
    }

    fn instance_by_address(
        &self,
        address: ContractAddress,
    ) -> Result<InstanceInfo, InstanceNotFoundError> {
        self.instances
            .get(&address)
            .cloned()
            .ok_or(InstanceNotFoundError(address))
    }

    fn module_interface(
        &self,
        module_ref: &ModuleRef,
    ) -> Result<ModuleInterface, ModuleNotFoundError> {
        self.modules
            .get(module_ref)
            .cloned()
            .ok_or(ModuleNotFoundError(*module_ref))
    }

    fn chain_parameters(&self) -> ChainParameters {
        self.chain_parameters.clone()
    }

    fn next_update_sequence_number(&self, update_type: UpdateType) -> UpdateSequenceNumber {
        self.update_sequence_numbers
            .get(&update_type)
            .copied()
            .unwrap_or_default()
    }

    fn update_keys(&self, update_type: UpdateType) -> UpdateKeys {
        self.update_keys
            .get(&update_type)
            .cloned()
            .unwrap_or(UpdateKeys {
                keys: BTreeMap::new(),
                threshold: 1,
            })
    }
}

impl BlockStateOperations for InMemoryLedger {
    fn update_account_balance(
        &mut self,
        account: &Self::Account,
        amount_delta: AmountDelta,
    ) -> Result<(), UnderOrOverflowError> {
        let account = self.account_mut(account);
        account.balance = amount_delta.apply(account.balance)?;
        Ok(())
    }

    fn increment_account_nonce(&mut self, account: &Self::Account) {
        let account = self.account_mut(account);
        account.nonce = account.nonce.next();
    }

    fn add_release_schedule(&mut self, account: &Self::Account, schedule: &[(Timestamp, Amount)]) {
        self.account_mut(account)
            .release_schedule
            .extend_from_slice(schedule);
    }

    fn set_account_credential_keys(
        &mut self,
        account: &Self::Account,
        cred_id: &CredentialRegistrationId,
        keys: CredentialPublicKeys,
    ) {
        let credential = self
            .account_mut(account)
            .credentials
            .values_mut()
            .find(|credential| credential.cred_id == *cred_id);
        match credential {
            Some(credential) => credential.keys = keys,
            None => warn!("Account {} has no credential to update the keys of", account),
        }
    }

    fn replace_encrypted_amounts(
        &mut self,
        account: &Self::Account,
        up_to_index: EncryptedAmountIndex,
        new_self_amount: EncryptedAmount,
    ) {
        let encrypted = &mut self.account_mut(account).encrypted_amount;
        let removed = up_to_index.saturating_sub(encrypted.start_index);
        let removed = usize::try_from(removed)
            .unwrap_or(usize::MAX)
            .min(encrypted.incoming_amounts.len());
        encrypted.incoming_amounts.drain(..removed);
        encrypted.start_index = up_to_index;
        encrypted.self_amount = new_self_amount;
    }

    fn add_incoming_encrypted_amount(
        &mut self,
        account: &Self::Account,
        amount: EncryptedAmount,
    ) -> EncryptedAmountIndex {
        let encrypted = &mut self.account_mut(account).encrypted_amount;
        let index = encrypted.next_index();
        encrypted.incoming_amounts.push(amount);
        index
    }

    fn set_self_encrypted_amount(&mut self, account: &Self::Account, amount: EncryptedAmount) {
        self.account_mut(account).encrypted_amount.self_amount = amount;
    }

    fn set_account_baker(&mut self, account: &Self::Account, baker: Option<AccountBaker>) {
        self.account_mut(account).baker = baker;
    }

    fn create_account(
        &mut self,
        address: AccountAddress,
        credential: AccountCredential,
    ) -> Self::Account {
        let index = AccountIndex(self.accounts.len() as u64);
        self.accounts.push(LedgerAccount {
            address,
            balance: Amount::ZERO,
            nonce: Nonce::FIRST,
            credentials: [(0, credential)].into_iter().collect(),
            threshold: 1,
            encryption_key: EncryptionKey::default(),
            encrypted_amount: AccountEncryptedAmount::default(),
            baker: None,
            release_schedule: Vec::new(),
        });
        self.account_indices.insert(address, index);
        index
    }

    fn notify_identity_provider_credential(&mut self, identity_provider: IdentityProviderId) {
        *self
            .identity_provider_credentials
            .entry(identity_provider)
            .or_default() += 1;
    }

    fn put_module(&mut self, module: ModuleInterface) {
        self.modules.insert(module.module_ref, module);
    }

    fn create_instance(&mut self, instance: NewInstance) -> ContractAddress {
        let address = ContractAddress::new(self.next_instance_index, 0);
        self.next_instance_index += 1;
        self.instances.insert(
            address,
            InstanceInfo {
                address,
                owner: instance.owner,
                amount: instance.amount,
                state: instance.state,
                module_ref: instance.module_ref,
                init_name: instance.init_name,
                receive_methods: instance.receive_methods,
            },
        );
        address
    }

    fn update_instance(
        &mut self,
        address: ContractAddress,
        amount_delta: AmountDelta,
        state: Option<ContractState>,
    ) -> Result<(), UpdateInstanceError> {
        let instance = self
            .instances
            .get_mut(&address)
            .ok_or(InstanceNotFoundError(address))?;
        instance.amount = amount_delta.apply(instance.amount)?;
        if let Some(state) = state {
            instance.state = state;
        }
        Ok(())
    }

    fn enqueue_update(&mut self, effective_time: TransactionTime, payload: UpdatePayload) {
        self.enqueued_updates.push(EnqueuedUpdate {
            effective_time,
            payload,
        });
    }

    fn increment_update_sequence_number(&mut self, update_type: UpdateType) {
        let next = self.next_update_sequence_number(update_type).next();
        self.update_sequence_numbers.insert(update_type, next);
    }

    fn add_execution_cost(&mut self, amount: Amount) {
        self.execution_costs = Amount::from_micro_ccd(
            self.execution_costs
                .micro_ccd
                .saturating_add(amount.micro_ccd),
        );
    }
}
