//! Personal budget ledger.
//!
//! Accounts carry a running balance that every transaction keeps in sync:
//! creating, editing, or deleting a transaction applies or reverses its
//! effect through the [`reconciler`]. A [`ledger::LedgerStore`] caches the
//! signed-in user's collections from live [`store`] subscriptions, and the
//! [`aggregation`] functions derive dashboards, budget progress, and a
//! calendar view from that cache.
//!
//! [`tracker::BudgetTracker`] wires it all to an [`auth`] provider.

extern crate alloc;

pub mod aggregation;
pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod ledger;
pub mod models;
pub mod reconciler;
pub mod store;
pub mod tracker;
