//! # Distro Node
//!
//! Single-process host for the distribution module: configuration, logging,
//! on-disk persistence and the `DistroNode` handle used by the CLI.

pub mod config;
pub mod genesis;
pub mod logging;
pub mod node;

pub use config::{ConfigError, LogFormat, LoggingConfig, NodeConfig};
pub use genesis::{load_genesis_file, parse_genesis, write_genesis_file};
pub use node::{rejection, DistroNode};
