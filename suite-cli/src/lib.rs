//! Suite deployment CLI library.
//!
//! The `suite` binary is a thin wrapper around these modules; keeping them in a
//! library lets integration tests drive manifests and simulated runs directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod host;
pub mod logging;
pub mod manifest;
pub mod output;
