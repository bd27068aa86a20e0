//! gobuilder - keeps a Go source checkout pulled and rebuilt
//!
//! A polling daemon: on every cycle it pulls the checkout, compares the
//! revision the installed toolchain was built from against the checkout's
//! HEAD, and runs `make.bash` only when the two differ.
//!
//! # Modules
//!
//! - [`scheduler`] - the cycle and the interval loop around it
//! - [`sync`] - `git pull` in the checkout
//! - [`version`] - built revision vs checkout revision
//! - [`builder`] - `make.bash` with the bootstrap toolchain
//! - [`process`] - the command runner every collaborator shells out through
//! - [`config`] - immutable daemon configuration
//! - [`cli`] - command-line interface

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod scheduler;
pub mod sync;
pub mod version;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use builder::BuildInvoker;
pub use config::{BuilderConfig, MissedTicks};
pub use error::{BuilderError, CommandError};
pub use process::{CommandRunner, CommandSpec, SystemRunner};
pub use scheduler::{CycleOutcome, Scheduler};
pub use sync::Synchronizer;
pub use version::{VersionComparator, parse_version, revisions_differ};
