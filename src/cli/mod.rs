//! CLI module for rfxgen - command-line interface.
//!
//! Single flat command: point it at a task prompt and it drives the
//! generate / check / feedback loop until the compiler accepts the code.

pub mod commands;

pub use commands::Cli;
