// Meridian daemon library
// Exposes the ledger core for the node binaries and the integration tests

#![allow(clippy::type_complexity)]
#![allow(clippy::uninlined_format_args)]

extern crate log;

pub mod config;
pub mod core;
