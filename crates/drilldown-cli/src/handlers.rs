//! Command handlers for CLI subcommands

mod compile;
mod completions;
mod config;
mod reports;
mod utils;

pub use compile::handle_compile;
pub use completions::handle_completions;
pub use config::handle_config;
pub use reports::handle_reports;
