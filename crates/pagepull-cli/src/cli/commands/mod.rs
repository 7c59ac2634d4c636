//! CLI command handlers, one file per command.

mod check;
mod completions;
mod config;
mod fetch;

pub use check::run_check;
pub use completions::run_completions;
pub use config::run_config;
pub use fetch::run_fetch;
