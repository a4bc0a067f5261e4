//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod ledger;
pub(crate) mod parse;
pub(crate) mod reconcile;
pub(crate) mod resolve;
pub(crate) mod serve;
pub(crate) mod utid;
