//! Types used by the scheduler.

pub mod accounts;
pub mod contracts;
pub mod encoding;
pub mod events;
pub mod execution;
pub mod parameters;
pub mod primitives;
pub mod reject_reasons;
pub mod transactions;
pub mod updates;
