// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "reactions/mod.rs"]
pub mod reactions;

// Re-export command types for convenience
pub use commands::spending::{Context, Data, Error};
