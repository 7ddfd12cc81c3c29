//! Transfers between accounts: simple transfers, transfers with a release schedule and
//! data registration.

use super::deposit::with_deposit;
use super::header::TransactionContext;
use super::{reject, BlockExecution, TransactionExecutionError};
use crate::block_state_interface::BlockStateOperations;
use crate::cost;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::TransactionSummary;
use scheduler_types::types::primitives::{AccountAddress, Address, Amount, Timestamp};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::TransactionType;

pub(super) fn handle_transfer<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    to: AccountAddress,
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
        TransactionType::Transfer,
        |frame| {
            frame.tick(cost::SIMPLE_TRANSFER)?;
            if frame.available_amount(&tc.sender) < amount {
                return reject(RejectReason::AmountTooLarge(
                    Address::Account(tc.sender_address),
                    amount,
                ));
            }
            let Ok(receiver) = frame.block_state.account_by_address(&to) else {
                return reject(RejectReason::InvalidAccountReference(to));
            };
            if !frame.has_valid_credential(&receiver) {
                return reject(RejectReason::ReceiverAccountNoCredential(to));
            }
            let receiver_index = frame.block_state.account_index(&receiver);
            frame
                .changes
                .transfer_between_accounts(tc.sender_index, receiver_index, amount);
            Ok(vec![Event::Transferred {
                from: Address::Account(tc.sender_address),
                amount,
                to,
            }])
        },
        |_, events| Ok(events),
    )
}

pub(super) fn handle_transfer_with_schedule<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    to: AccountAddress,
    schedule: Vec<(Timestamp, Amount)>,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::TransferWithSchedule,
        |frame| {
            frame.tick(cost::scheduled_transfer(schedule.len()))?;
            if to == tc.sender_address {
                return reject(RejectReason::ScheduledSelfTransfer(to));
            }
            if schedule.is_empty() || schedule.iter().any(|(_, amount)| *amount == Amount::ZERO) {
                return reject(RejectReason::ZeroScheduledAmount);
            }
            if schedule.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
                return reject(RejectReason::NonIncreasingSchedule);
            }
            if schedule
                .first()
                .map_or(false, |(first, _)| *first < frame.chain_metadata.slot_time)
            {
                return reject(RejectReason::FirstScheduledReleaseExpired);
            }
            let total = schedule
                .iter()
                .try_fold(Amount::ZERO, |total, (_, amount)| total.checked_add(*amount));
            let total = match total {
                Some(total) if total <= frame.available_amount(&tc.sender) => total,
                Some(total) => {
                    return reject(RejectReason::AmountTooLarge(
                        Address::Account(tc.sender_address),
                        total,
                    ))
                }
                None => {
                    return reject(RejectReason::AmountTooLarge(
                        Address::Account(tc.sender_address),
                        Amount::from_micro_ccd(u64::MAX),
                    ))
                }
            };
            let Ok(receiver) = frame.block_state.account_by_address(&to) else {
                return reject(RejectReason::InvalidAccountReference(to));
            };
            if !frame.has_valid_credential(&receiver) {
                return reject(RejectReason::ReceiverAccountNoCredential(to));
            }
            let receiver_index = frame.block_state.account_index(&receiver);
            frame
                .changes
                .transfer_between_accounts(tc.sender_index, receiver_index, total);
            Ok(receiver)
        },
        |block_state, receiver| {
            block_state.add_release_schedule(&receiver, &schedule);
            Ok(vec![Event::TransferredWithSchedule {
                from: tc.sender_address,
                to,
                amount: schedule.clone(),
            }])
        },
    )
}

pub(super) fn handle_register_data<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    data: Vec<u8>,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::RegisterData,
        |frame| frame.tick(cost::REGISTER_DATA),
        |_, ()| Ok(vec![Event::DataRegistered { data }]),
    )
}
