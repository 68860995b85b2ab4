//! A small, embeddable interactive command shell.
//!
//! The host program registers named [`Command`]s on an [`App`] and calls
//! [`App::run`]. The shell then reads lines from the terminal, matches them
//! against command names by case-insensitive prefix, and hands the rest of
//! the line to the command's handler. Tab completion covers command names
//! and each command's static argument options, and input history is kept
//! across sessions in `~/.command_history`.
//!
//! Parsing arguments is left to the handlers: they receive the remainder of
//! the line as a single string.

mod app;
pub mod command;
pub mod completion;
mod config;
mod error;
pub mod history;
mod io_adapters;
pub mod logger;
mod registry;
pub mod terminal;

/// The shell itself. See [`App`] for the high-level API.
pub use app::App;
pub use command::{AppId, Command, CommandHandler, DefaultHandler};
pub use config::{CompletionStyle, HistoryPolicy, HistorySource, Settings};
pub use error::{Error, Result};
pub use io_adapters::MemWriter;
pub use registry::CommandRegistry;
