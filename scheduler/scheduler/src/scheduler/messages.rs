//! Processing of the actions requested by a contract.
//!
//! The actions tree is walked depth first, left to right, with an explicit work stack.
//! Messages to other contracts recurse into [`invoke_contract`], bounded by
//! [`MAX_CALL_DEPTH`]. All of it is charged to the energy of the one transaction.

use super::contracts::{invoke_contract, Invocation};
use super::deposit::ExecutionFrame;
use super::{reject, ExecutionError, TransactionExecutionError};
use crate::block_state_interface::BlockStateQuery;
use crate::changeset::ChangeSet;
use crate::cost;
use log::trace;
use scheduler_interface::contract_interpreter_interface::ContractInterpreter;
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_types::types::contracts::ActionsTree;
use scheduler_types::types::events::Event;
use scheduler_types::types::primitives::{AccountAddress, Address, Amount, ContractAddress};
use scheduler_types::types::reject_reasons::RejectReason;

/// Maximum number of nested `Send`s below the invocation made by the transaction, which
/// is at depth 0.
pub const MAX_CALL_DEPTH: usize = 128;

enum Work {
    Action(ActionsTree),
    /// The right branch of an `Or` whose left branch is executing, together with the
    /// changes and number of events from before the left branch.
    Fallback {
        snapshot: ChangeSet,
        events_len: usize,
        right: ActionsTree,
    },
}

/// Execute the actions requested by the contract at `self_address`, which runs at call
/// depth `depth`. Returns the events of the actions in order.
pub(super) fn fold_actions<BSO, CI, CV>(
    frame: &mut ExecutionFrame<'_, BSO, CI, CV>,
    self_address: ContractAddress,
    actions: ActionsTree,
    depth: usize,
) -> Result<Vec<Event>, ExecutionError>
where
    BSO: BlockStateQuery,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    let mut events = Vec::new();
    let mut stack = vec![Work::Action(actions)];
    while let Some(work) = stack.pop() {
        let action = match work {
            Work::Action(action) => action,
            // The left branch of the `Or` succeeded.
            Work::Fallback { .. } => continue,
        };
        let result = match action {
            ActionsTree::Accept => Ok(()),
            ActionsTree::And(left, right) => {
                stack.push(Work::Action(*right));
                stack.push(Work::Action(*left));
                Ok(())
            }
            ActionsTree::Or(left, right) => {
                stack.push(Work::Fallback {
                    snapshot: frame.changes.clone(),
                    events_len: events.len(),
                    right: *right,
                });
                stack.push(Work::Action(*left));
                Ok(())
            }
            ActionsTree::SimpleTransfer { to, amount } => {
                transfer_from_contract(frame, self_address, to, amount)
                    .map(|event| events.push(event))
            }
            ActionsTree::Send {
                to,
                receive_name,
                amount,
                parameter,
            } => {
                frame.tick(cost::INSTANCE_LOOKUP)?;
                trace!("Contract {} sends {} to {}", self_address, receive_name, to);
                let invocation = Invocation {
                    sender: Address::Contract(self_address),
                    target: to,
                    amount,
                    receive_name,
                    parameter,
                };
                invoke_contract(frame, invocation, depth + 1)
                    .map(|nested| events.extend(nested))
            }
        };

        match result {
            Ok(()) => {}
            // Running out of energy is never recovered from: nothing is left for a fallback.
            Err(ExecutionError::Reject(reason)) if reason != RejectReason::OutOfEnergy => {
                loop {
                    match stack.pop() {
                        Some(Work::Fallback {
                            snapshot,
                            events_len,
                            right,
                        }) => {
                            trace!(
                                "Left branch of contract {} rejected with {:?}, taking fallback",
                                self_address,
                                reason
                            );
                            frame.changes = snapshot;
                            events.truncate(events_len);
                            stack.push(Work::Action(right));
                            break;
                        }
                        Some(Work::Action(_)) => {}
                        None => return reject(reason),
                    }
                }
            }
            Err(err) => return Err(err),
        }
    }
    Ok(events)
}

fn transfer_from_contract<BSO, CI, CV>(
    frame: &mut ExecutionFrame<'_, BSO, CI, CV>,
    from: ContractAddress,
    to: AccountAddress,
    amount: Amount,
) -> Result<Event, ExecutionError>
where
    BSO: BlockStateQuery,
{
    frame.tick(cost::SIMPLE_TRANSFER)?;
    let instance = frame.block_state.instance_by_address(from).map_err(|err| {
        ExecutionError::Internal(TransactionExecutionError::StateInvariantBroken(
            err.to_string(),
        ))
    })?;
    if frame.instance_balance(&instance) < amount {
        return reject(RejectReason::AmountTooLarge(Address::Contract(from), amount));
    }
    let Ok(receiver) = frame.block_state.account_by_address(&to) else {
        return reject(RejectReason::InvalidAccountReference(to));
    };
    if !frame.has_valid_credential(&receiver) {
        return reject(RejectReason::ReceiverAccountNoCredential(to));
    }
    let amount_delta = i128::from(amount.micro_ccd);
    frame.changes.add_instance_amount(from, -amount_delta);
    let receiver_index = frame.block_state.account_index(&receiver);
    frame.changes.add_account_amount(receiver_index, amount_delta);
    Ok(Event::Transferred {
        from: Address::Contract(from),
        amount,
        to,
    })
}
