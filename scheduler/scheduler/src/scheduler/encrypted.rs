//! Transactions on the encrypted balance of the sender.
//!
//! The input of a transaction spending encrypted amounts is the self amount combined
//! with the incoming amounts below the index named in the transaction. Once spent, those
//! incoming amounts are removed and the remaining amount becomes the new self amount.

use super::deposit::{with_deposit, ExecutionFrame};
use super::header::TransactionContext;
use super::{reject, BlockExecution, ExecutionError, TransactionExecutionError};
use crate::block_state_interface::{BlockStateOperations, BlockStateQuery};
use crate::cost;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::accounts::{EncryptedAmount, EncryptedAmountIndex};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::TransactionSummary;
use scheduler_types::types::primitives::{AccountAddress, Address, Amount};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::{
    EncryptedAmountTransferData, SecToPubAmountTransferData, TransactionType,
};

/// Combine the self amount of the sender with its incoming amounts below `index`.
fn input_amount<BSO: BlockStateQuery, CI, CV: CryptoVerifier>(
    frame: &ExecutionFrame<'_, BSO, CI, CV>,
    index: EncryptedAmountIndex,
) -> Result<EncryptedAmount, ExecutionError> {
    let encrypted = frame
        .block_state
        .account_encrypted_amount(&frame.transaction.sender);
    let Some(incoming) = encrypted.incoming_up_to(index) else {
        return reject(RejectReason::InvalidIndexOnEncryptedTransfer);
    };
    Ok(incoming
        .iter()
        .fold(encrypted.self_amount.clone(), |total, amount| {
            frame.crypto.aggregate_encrypted_amounts(&total, amount)
        }))
}

pub(super) fn handle_encrypted_amount_transfer<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    to: AccountAddress,
    data: EncryptedAmountTransferData,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::EncryptedAmountTransfer,
        |frame| {
            frame.tick(cost::ENCRYPTED_TRANSFER)?;
            if to == tc.sender_address {
                return reject(RejectReason::EncryptedAmountSelfTransfer(to));
            }
            let Ok(receiver) = frame.block_state.account_by_address(&to) else {
                return reject(RejectReason::InvalidAccountReference(to));
            };
            let input = input_amount(frame, data.index)?;
            let sender_key = frame.block_state.account_encryption_key(&tc.sender);
            let receiver_key = frame.block_state.account_encryption_key(&receiver);
            if !frame
                .crypto
                .verify_encrypted_transfer(&sender_key, &receiver_key, &input, &data)
            {
                return reject(RejectReason::InvalidEncryptedAmountTransferProof);
            }
            Ok((receiver, input))
        },
        |block_state, (receiver, input)| {
            block_state.replace_encrypted_amounts(
                &tc.sender,
                data.index,
                data.remaining_amount.clone(),
            );
            let new_index =
                block_state.add_incoming_encrypted_amount(&receiver, data.transfer_amount.clone());
            Ok(vec![
                Event::EncryptedAmountsRemoved {
                    account: tc.sender_address,
                    new_amount: data.remaining_amount.clone(),
                    input_amount: input,
                    up_to_index: data.index,
                },
                Event::NewEncryptedAmount {
                    account: to,
                    new_index,
                    encrypted_amount: data.transfer_amount.clone(),
                },
            ])
        },
    )
}

pub(super) fn handle_transfer_to_encrypted<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    amount: Amount,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::TransferToEncrypted,
        |frame| {
            frame.tick(cost::TRANSFER_TO_ENCRYPTED)?;
            if frame.available_amount(&tc.sender) < amount {
                return reject(RejectReason::AmountTooLarge(
                    Address::Account(tc.sender_address),
                    amount,
                ));
            }
            frame
                .changes
                .add_account_amount(tc.sender_index, -i128::from(amount.micro_ccd));
            let encrypted = frame
                .block_state
                .account_encrypted_amount(&tc.sender)
                .self_amount;
            let added = frame.crypto.encrypt_amount_with_zero_randomness(amount);
            Ok(frame.crypto.aggregate_encrypted_amounts(&encrypted, &added))
        },
        |block_state, new_amount| {
            block_state.set_self_encrypted_amount(&tc.sender, new_amount.clone());
            Ok(vec![Event::EncryptedSelfAmountAdded {
                account: tc.sender_address,
                new_amount,
                amount,
            }])
        },
    )
}

pub(super) fn handle_transfer_to_public<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    data: SecToPubAmountTransferData,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::TransferToPublic,
        |frame| {
            frame.tick(cost::TRANSFER_TO_PUBLIC)?;
            let input = input_amount(frame, data.index)?;
            let key = frame.block_state.account_encryption_key(&tc.sender);
            if !frame.crypto.verify_transfer_to_public(&key, &input, &data) {
                return reject(RejectReason::InvalidTransferToPublicProof);
            }
            frame.changes.add_account_amount(
                tc.sender_index,
                i128::from(data.transfer_amount.micro_ccd),
            );
            Ok(input)
        },
        |block_state, input| {
            block_state.replace_encrypted_amounts(
                &tc.sender,
                data.index,
                data.remaining_amount.clone(),
            );
            Ok(vec![
                Event::EncryptedAmountsRemoved {
                    account: tc.sender_address,
                    new_amount: data.remaining_amount.clone(),
                    input_amount: input,
                    up_to_index: data.index,
                },
                Event::AmountAddedByDecryption {
                    account: tc.sender_address,
                    amount: data.transfer_amount,
                },
            ])
        },
    )
}
