//! Types that are externally exposed by the transaction scheduler
//! as part of block execution and block building.
//!
//! The types follow the protocol data model: transactions and their binary
//! encoding, the outcomes of executing them (summaries, events, reject reasons
//! and failure kinds), and the ledger entities the scheduler reads and updates.

pub mod types;
