//! # CLI Behavior
//!
//! This is **one possible UI client** for officedesk, not the application
//! itself. It is the only place that knows about terminal I/O, exit codes and
//! output formatting.
//!
//! For the overall architecture, see the crate-level documentation of the
//! `officedesk` library.
//!
//! ## Commands
//!
//! - `list <entity>`: fetch and print a table; `--search`, `--where`,
//!   `--from` and `--to` filter client-side, `--in` asks the server
//! - `board <entity>`: group a workflow entity into its columns
//! - `create`, `update`, `move`, `delete`: single mutations
//! - `login`, `logout`: manage the stored bearer token
//! - `config [key] [value]`: show or change settings
//!
//! A 401 from the backend clears the stored token; the binary then points the
//! user at `officedesk login` instead of printing the raw failure.

mod commands;
mod render;
mod setup;
mod styles;

pub use commands::run;
pub use setup::Cli;
