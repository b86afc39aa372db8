// src/core/mod.rs

//! The central module containing the core logic and data structures of replwarden.

pub mod api;
pub mod counter;
pub mod elector;
pub mod errors;
pub mod kafka;
pub mod membership;
pub mod metrics;
pub mod notifier;
pub mod reconcile;
pub mod zk;

pub use counter::SharedCounter;
pub use errors::ReplwardenError;
