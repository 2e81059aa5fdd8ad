pub mod cli;
pub mod load_config;
pub mod zotero;

pub use cli::{run, Cli, Commands};
