//! Registry configuration and command-line argument definitions

pub mod cli;
mod schema;

pub use cli::{parse_args, Cli, Command, OutputFormat};
pub use schema::{RegistryConfig, StoreConfig};
