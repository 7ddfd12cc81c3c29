//! Checks on the header of an account transaction, made before any of its payload is
//! executed.

use super::{available_amount, has_valid_credential, BlockExecution};
use crate::block_state_interface::BlockStateOperations;
use crate::cost;
use crate::signatures::verify_account_signature;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::execution::FailureKind;
use scheduler_types::types::primitives::{AccountAddress, AccountIndex, Energy, TransactionHash};
use scheduler_types::types::transactions::{
    TransactionHeader, TransactionWithMetadata, MAX_PAYLOAD_SIZE,
};

/// A transaction that passed the header check, together with its sender.
#[derive(Debug, Clone)]
pub(crate) struct TransactionContext<Account> {
    pub sender: Account,
    pub sender_address: AccountAddress,
    pub sender_index: AccountIndex,
    pub hash: TransactionHash,
    pub header: TransactionHeader,
    /// Energy charged for checking the header.
    pub header_cost: Energy,
}

#[derive(Debug)]
pub(crate) enum HeaderFailure {
    /// The transaction is invalid.
    Invalid(FailureKind),
    /// The energy remaining in the block does not cover checking the header.
    BlockEnergyExhausted,
}

impl From<FailureKind> for HeaderFailure {
    fn from(failure: FailureKind) -> Self {
        HeaderFailure::Invalid(failure)
    }
}

/// Check the header of a transaction against the current block state.
///
/// The checks are made in this order: payload size, deposit covers checking the header,
/// block energy covers checking the header, sender exists, expiry, sender has a valid
/// credential, sender can pay the deposit, nonce, signatures.
pub(crate) fn check_header<BSO, CI, CV>(
    exec: &BlockExecution<'_, BSO, CI, CV>,
    transaction: &TransactionWithMetadata,
) -> Result<TransactionContext<BSO::Account>, HeaderFailure>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let header = &transaction.data.header;
    if u64::from(header.payload_size) != transaction.data.payload.size()
        || header.payload_size > MAX_PAYLOAD_SIZE
    {
        return Err(FailureKind::InvalidPayloadSize.into());
    }

    let header_cost = cost::header_check(header.payload_size, transaction.data.num_signatures());
    if header.energy_amount < header_cost {
        return Err(FailureKind::DepositInsufficient.into());
    }
    if exec.remaining_energy() < header_cost {
        return Err(HeaderFailure::BlockEnergyExhausted);
    }

    let block_state = &*exec.block_state;
    let sender = block_state
        .account_by_address(&header.sender)
        .map_err(|_| FailureKind::UnknownAccount)?;

    if header.expiry < exec.chain_metadata.slot_time.to_transaction_time() {
        return Err(FailureKind::ExpiredTransaction.into());
    }

    if !has_valid_credential(block_state, &sender, &exec.chain_metadata) {
        return Err(FailureKind::NoValidCredential.into());
    }

    let deposit = cost::energy_to_ccd(&exec.chain_parameters.energy_rate, header.energy_amount);
    if available_amount(block_state, &sender, 0) < deposit {
        return Err(FailureKind::InsufficientFunds.into());
    }

    let next_nonce = block_state.account_nonce(&sender);
    if header.nonce != next_nonce {
        return Err(FailureKind::NonSequentialNonce(next_nonce).into());
    }

    let keys = block_state.account_verification_keys(&sender);
    let signature_valid = match exec.signature_cache.lookup(&transaction.hash, &keys) {
        Some(valid) => valid,
        None => verify_account_signature(
            exec.crypto,
            &keys,
            &transaction.data.sign_hash(),
            &transaction.data.signature,
        ),
    };
    if !signature_valid {
        return Err(FailureKind::IncorrectSignature.into());
    }

    Ok(TransactionContext {
        sender_address: block_state.account_canonical_address(&sender),
        sender_index: block_state.account_index(&sender),
        sender,
        hash: transaction.hash,
        header: header.clone(),
        header_cost,
    })
}
