//! Smart contract transactions: deploying modules, creating instances and invoking them.

use super::deposit::{with_deposit, ExecutionFrame};
use super::header::TransactionContext;
use super::messages::{fold_actions, MAX_CALL_DEPTH};
use super::{reject, BlockExecution, ExecutionError, TransactionExecutionError};
use crate::block_state_interface::{BlockStateOperations, BlockStateQuery};
use crate::cost;
use log::trace;
use scheduler_interface::contract_interpreter_interface::{
    ContractInterpreter, InitContext, InterpreterOutcome, ReceiveContext,
};
use scheduler_interface::crypto_interface::CryptoVerifier;
use scheduler_interface::TransactionExecution;
use scheduler_types::types::contracts::{
    ContractEvent, InitName, ModuleInterface, NewInstance, Parameter, ReceiveName,
};
use scheduler_types::types::events::Event;
use scheduler_types::types::execution::TransactionSummary;
use scheduler_types::types::primitives::{Address, Amount, ContractAddress, Hash, ModuleRef};
use scheduler_types::types::reject_reasons::RejectReason;
use scheduler_types::types::transactions::TransactionType;

pub(super) fn handle_deploy_module<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    module: Vec<u8>,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::DeployModule,
        |frame| {
            frame.tick(cost::deploy_module(module.len() as u64))?;
            let module_ref = Hash::compute(&module);
            let Some(interface) = frame.interpreter.validate_module(module_ref, &module) else {
                return reject(RejectReason::ModuleNotWF);
            };
            if frame.block_state.module_interface(&module_ref).is_ok() {
                return reject(RejectReason::ModuleHashAlreadyExists(module_ref));
            }
            Ok(interface)
        },
        |block_state, interface| {
            let module_ref = interface.module_ref;
            block_state.put_module(interface);
            Ok(vec![Event::ModuleDeployed { module_ref }])
        },
    )
}

/// A contract instance to create once the init transaction succeeds.
struct PendingInstance {
    instance: NewInstance,
    events: Vec<ContractEvent>,
}

pub(super) fn handle_init_contract<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    amount: Amount,
    module_ref: ModuleRef,
    init_name: InitName,
    parameter: Parameter,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::InitContract,
        |frame| {
            frame.tick(cost::INIT_CONTRACT_BASE)?;
            if frame.available_amount(&tc.sender) < amount {
                return reject(RejectReason::AmountTooLarge(
                    Address::Account(tc.sender_address),
                    amount,
                ));
            }
            let Ok(module) = frame.block_state.module_interface(&module_ref) else {
                return reject(RejectReason::InvalidModuleReference(module_ref));
            };
            frame.tick(cost::lookup_module(module.size))?;
            let Some(receive_methods) = module.exposed.get(&init_name) else {
                return reject(RejectReason::InvalidInitMethod(module_ref, init_name.clone()));
            };

            let context = InitContext {
                origin: tc.sender_address,
                sender_policies: frame.sender_policies(),
            };
            let outcome = frame.interpreter.apply_init(
                &module,
                frame.chain_metadata,
                &context,
                &init_name,
                &parameter,
                amount,
                frame.energy.remaining_energy(),
            );
            let result = match outcome {
                InterpreterOutcome::Success {
                    result,
                    energy_used,
                } => {
                    frame.tick(energy_used)?;
                    result
                }
                InterpreterOutcome::Reject {
                    reason,
                    energy_used,
                } => {
                    frame.tick(energy_used)?;
                    return reject(RejectReason::RejectedInit {
                        reject_reason: reason,
                    });
                }
                InterpreterOutcome::Trap { energy_used } => {
                    frame.tick(energy_used)?;
                    return reject(RejectReason::RuntimeFailure);
                }
                InterpreterOutcome::OutOfEnergy => {
                    return Err(frame.energy.exhaust().into());
                }
            };
            frame.tick(cost::contract_state(result.state.0.len() as u64))?;

            frame
                .changes
                .add_account_amount(tc.sender_index, -i128::from(amount.micro_ccd));
            Ok(PendingInstance {
                instance: NewInstance {
                    owner: tc.sender_address,
                    amount,
                    state: result.state,
                    module_ref,
                    init_name: init_name.clone(),
                    receive_methods: receive_methods.clone(),
                },
                events: result.events,
            })
        },
        |block_state, pending| {
            let address = block_state.create_instance(pending.instance);
            Ok(vec![Event::ContractInitialized {
                module_ref,
                address,
                amount,
                init_name: init_name.clone(),
                events: pending.events,
            }])
        },
    )
}

pub(super) fn handle_update_contract<BSO, CI, CV>(
    exec: &mut BlockExecution<'_, BSO, CI, CV>,
    tc: &TransactionContext<BSO::Account>,
    amount: Amount,
    address: ContractAddress,
    receive_name: ReceiveName,
    message: Parameter,
) -> Result<Option<TransactionSummary>, TransactionExecutionError>
where
    BSO: BlockStateOperations,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    with_deposit(
        exec,
        tc,
        TransactionType::Update,
        |frame| {
            frame.tick(cost::UPDATE_CONTRACT_BASE)?;
            invoke_contract(
                frame,
                Invocation {
                    sender: Address::Account(tc.sender_address),
                    target: address,
                    amount,
                    receive_name,
                    parameter: message,
                },
                0,
            )
        },
        |_, events| Ok(events),
    )
}

/// A message to a receive function of a contract instance.
#[derive(Debug, Clone)]
pub(super) struct Invocation {
    /// The immediate sender, the account of the transaction or a contract.
    pub sender: Address,
    pub target: ContractAddress,
    pub amount: Amount,
    pub receive_name: ReceiveName,
    pub parameter: Parameter,
}

/// Invoke a contract instance and process the actions it requests.
///
/// The amount is moved from the sender to the instance and the new state of the instance
/// is staged before any action is processed, so nested calls see them.
///
/// Checks, in order: call depth, the instance exists, the sender can pay the amount, the
/// instance exposes the receive function, the owner of the instance has a valid
/// credential. Then the receive function runs.
pub(super) fn invoke_contract<BSO, CI, CV>(
    frame: &mut ExecutionFrame<'_, BSO, CI, CV>,
    invocation: Invocation,
    depth: usize,
) -> Result<Vec<Event>, ExecutionError>
where
    BSO: BlockStateQuery,
    CI: ContractInterpreter,
    CV: CryptoVerifier,
{
    if depth > MAX_CALL_DEPTH {
        return reject(RejectReason::MaxCallDepthExceeded);
    }
    let Ok(instance) = frame.block_state.instance_by_address(invocation.target) else {
        return reject(RejectReason::InvalidContractAddress(invocation.target));
    };

    let sender_balance = match invocation.sender {
        Address::Account(address) => match frame.block_state.account_by_address(&address) {
            Ok(account) => frame.available_amount(&account),
            Err(err) => {
                return Err(TransactionExecutionError::StateInvariantBroken(err.to_string()).into())
            }
        },
        Address::Contract(address) => match frame.block_state.instance_by_address(address) {
            Ok(sender_instance) => frame.instance_balance(&sender_instance),
            Err(err) => {
                return Err(TransactionExecutionError::StateInvariantBroken(err.to_string()).into())
            }
        },
    };
    if sender_balance < invocation.amount {
        return reject(RejectReason::AmountTooLarge(
            invocation.sender,
            invocation.amount,
        ));
    }

    if !instance.receive_methods.contains(&invocation.receive_name) {
        return reject(RejectReason::InvalidReceiveMethod(
            instance.module_ref,
            invocation.receive_name,
        ));
    }

    let owner_has_credential = frame
        .block_state
        .account_by_address(&instance.owner)
        .map_or(false, |owner| frame.has_valid_credential(&owner));
    if !owner_has_credential {
        return reject(RejectReason::ReceiverContractNoCredential(
            invocation.target,
        ));
    }

    let module = lookup_instance_module(frame, &instance.module_ref)?;
    frame.tick(cost::lookup_module(module.size))?;

    let context = ReceiveContext {
        invoker: frame.transaction.sender_address,
        self_address: instance.address,
        self_balance: frame.instance_balance(&instance),
        sender: invocation.sender,
        owner: instance.owner,
        sender_policies: frame.sender_policies(),
    };
    let state = frame.instance_state(&instance);
    let outcome = frame.interpreter.apply_receive(
        &module,
        frame.chain_metadata,
        &context,
        &invocation.receive_name,
        &invocation.parameter,
        invocation.amount,
        &state,
        frame.energy.remaining_energy(),
    );
    let result = match outcome {
        InterpreterOutcome::Success {
            result,
            energy_used,
        } => {
            frame.tick(energy_used)?;
            result
        }
        InterpreterOutcome::Reject {
            reason,
            energy_used,
        } => {
            frame.tick(energy_used)?;
            return reject(RejectReason::RejectedReceive {
                reject_reason: reason,
                contract_address: invocation.target,
                receive_name: invocation.receive_name,
                parameter: invocation.parameter,
            });
        }
        InterpreterOutcome::Trap { energy_used } => {
            frame.tick(energy_used)?;
            return reject(RejectReason::RuntimeFailure);
        }
        InterpreterOutcome::OutOfEnergy => return Err(frame.energy.exhaust().into()),
    };
    frame.tick(cost::contract_state(result.state.0.len() as u64))?;
    trace!(
        "Contract {} accepted {} with {} remaining",
        invocation.target,
        invocation.receive_name,
        frame.energy.remaining_energy()
    );

    let amount = i128::from(invocation.amount.micro_ccd);
    match invocation.sender {
        Address::Account(_) => frame
            .changes
            .add_account_amount(frame.transaction.sender_index, -amount),
        Address::Contract(sender) => frame.changes.add_instance_amount(sender, -amount),
    }
    frame.changes.add_instance_amount(invocation.target, amount);
    frame.changes.set_instance_state(invocation.target, result.state);

    let mut events = vec![Event::Updated {
        address: invocation.target,
        instigator: invocation.sender,
        amount: invocation.amount,
        message: invocation.parameter,
        receive_name: invocation.receive_name,
        events: result.events,
    }];
    events.extend(fold_actions(frame, invocation.target, result.actions, depth)?);
    Ok(events)
}

fn lookup_instance_module<BSO: BlockStateQuery, CI, CV>(
    frame: &ExecutionFrame<'_, BSO, CI, CV>,
    module_ref: &ModuleRef,
) -> Result<ModuleInterface, ExecutionError> {
    frame.block_state.module_interface(module_ref).map_err(|err| {
        ExecutionError::Internal(TransactionExecutionError::StateInvariantBroken(
            err.to_string(),
        ))
    })
}
