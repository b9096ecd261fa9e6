//! CLI command handlers, one file per command.

mod fetch;
mod schemes;
mod size;

pub use fetch::run_fetch;
pub use schemes::run_schemes;
pub use size::run_size;
