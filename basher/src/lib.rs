//! Run bash scripts that share a namespace with the Rust program running them.
//!
//! A host program registers scripts to source, variables to export and Rust
//! functions to expose, then runs a command in a bash child. Inside bash the
//! exposed functions look like ordinary shell functions; calling one re-executes
//! the host binary with a dispatch request, which the host answers through
//! [`Context::handle_funcs`] before doing anything else.
//!
//! The pieces, leaves first:
//! - [`runner`] spawns bash with a controlled environment and mirrors its exit code.
//! - [`envfile`] writes the file bash sources on start-up: the registered scripts
//!   followed by one forwarding shim per callback.
//! - [`Context`] owns the registry, runs commands and answers dispatch requests.
//! - [`protocol`] is the argv encoding of a dispatch request.

pub mod command;
pub mod config;
mod context;
pub mod env;
pub mod envfile;
mod error;
pub mod protocol;
pub mod runner;

pub use command::{Callback, ExitCode, UNKNOWN_CALLBACK};
pub use config::Config;
pub use context::{Context, HELP};
pub use env::Exports;
pub use envfile::EnvFile;
pub use error::{Error, Result};
pub use protocol::{DispatchRequest, Invocation};
