// Handlers for the CLI entry point. main.rs parses flags and dispatches here.

pub mod lookup;
