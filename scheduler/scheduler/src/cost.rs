//! The cost model: energy charged for checking and executing block items.
//!
//! Every function here is pure. Arithmetic saturates, so an absurdly large item is
//! priced at the maximum energy rather than wrapping to a cheap one.

use scheduler_types::types::parameters::ExchangeRate;
use scheduler_types::types::primitives::{Amount, Energy};
use scheduler_types::types::transactions::TRANSACTION_HEADER_SIZE;

/// Energy per signature checked in the header.
pub const SIGNATURE_COST: u64 = 100;
/// Energy per byte of the header and payload.
pub const TRANSACTION_BYTE_COST: u64 = 1;

pub const SIMPLE_TRANSFER: Energy = Energy(300);
pub const SCHEDULED_TRANSFER_PER_RELEASE: u64 = 364;
pub const ENCRYPTED_TRANSFER: Energy = Energy(27_000);
pub const TRANSFER_TO_ENCRYPTED: Energy = Energy(600);
pub const TRANSFER_TO_PUBLIC: Energy = Energy(14_850);
pub const ADD_BAKER: Energy = Energy(4_050);
pub const UPDATE_BAKER_KEYS: Energy = Energy(4_050);
pub const REMOVE_BAKER: Energy = Energy(300);
pub const UPDATE_BAKER_STAKE: Energy = Energy(300);
pub const UPDATE_BAKER_RESTAKE_EARNINGS: Energy = Energy(300);
pub const UPDATE_CREDENTIAL_KEYS_BASE: u64 = 500;
pub const UPDATE_CREDENTIAL_KEYS_PER_KEY: u64 = 100;
pub const REGISTER_DATA: Energy = Energy(300);
pub const INIT_CONTRACT_BASE: Energy = Energy(300);
pub const UPDATE_CONTRACT_BASE: Energy = Energy(300);
/// Looking up the target instance of a message sent by a contract.
pub const INSTANCE_LOOKUP: Energy = Energy(50);
/// Deploying a credential. Counted against the block, never charged to an account.
pub const DEPLOY_CREDENTIAL: Energy = Energy(54_000);

/// Cost of checking the header of an account transaction: a charge per signature and a
/// charge per byte of header and payload.
pub fn header_check(payload_size: u32, num_signatures: u32) -> Energy {
    let size = TRANSACTION_HEADER_SIZE.saturating_add(u64::from(payload_size));
    Energy(
        SIGNATURE_COST
            .saturating_mul(u64::from(num_signatures))
            .saturating_add(TRANSACTION_BYTE_COST.saturating_mul(size)),
    )
}

pub fn scheduled_transfer(num_releases: usize) -> Energy {
    Energy(SCHEDULED_TRANSFER_PER_RELEASE.saturating_mul(num_releases as u64))
}

pub fn update_credential_keys(num_keys: usize) -> Energy {
    Energy(
        UPDATE_CREDENTIAL_KEYS_BASE
            .saturating_add(UPDATE_CREDENTIAL_KEYS_PER_KEY.saturating_mul(num_keys as u64)),
    )
}

/// Cost of validating and storing a module of the given size.
pub fn deploy_module(module_size: u64) -> Energy {
    Energy(module_size / 10)
}

/// Cost of loading a module of the given size for execution.
pub fn lookup_module(module_size: u64) -> Energy {
    Energy(module_size / 50)
}

/// Cost of storing a contract state of the given size.
pub fn contract_state(state_size: u64) -> Energy {
    Energy((state_size / 100).saturating_add(1))
}

/// Convert energy to the amount charged for it: `ceil(energy * numerator / denominator)`.
///
/// Computed in 128 bits and saturating at the maximum amount, so the charge is monotone
/// in the energy.
pub fn energy_to_ccd(rate: &ExchangeRate, energy: Energy) -> Amount {
    let numerator = u128::from(energy.0) * u128::from(rate.numerator);
    let denominator = u128::from(rate.denominator.max(1));
    let charge = numerator / denominator + u128::from(numerator % denominator != 0);
    Amount::from_micro_ccd(u64::try_from(charge).unwrap_or(u64::MAX))
}
