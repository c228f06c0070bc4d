//! Library surface for the `hidra` binary: a thin CLI around `hidra-engine`
//! providing local, single-world operations (workspace init, running a
//! world, snapshot inspection). Grounded in the teacher's `shnn-cli`, minus
//! its async runtime and HTTP-facing subcommands, neither of which have a
//! counterpart in this crate's scope.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod config;
pub mod error;
pub mod workspace;

pub use commands::HidraCli;
pub use error::{CliError, CliResult};
