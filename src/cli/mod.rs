//! Command-line interface.
//!
//! - [`args`]: clap argument parsing and execution-mode mapping
//! - [`config`]: deploy-target configuration with file discovery

pub mod args;
pub mod config;

pub use args::{Args, Commands, DeployInvocation, ExecutionMode};
pub use config::{ConfigDiscovery, ConfigError, DeployDefaults, TargetOverrides};
