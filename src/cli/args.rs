//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `deploy`: rebuild the image and replace the running container
//! - `show-config`: show configuration discovery information

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::config::TargetOverrides;

/// What the invocation asks the binary to do.
#[derive(Debug)]
pub enum ExecutionMode {
    Deploy(DeployInvocation),
    ShowConfig,
}

/// A resolved `deploy` invocation: flag overrides plus run options.
#[derive(Debug)]
pub struct DeployInvocation {
    pub overrides: TargetOverrides,
    pub config_override: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "redock")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rebuild and relaunch a single containerized service")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a fresh image, replace the running container, tail its logs
    Deploy {
        /// Service name, used for both the image tag and the container name
        #[arg(short = 's', long = "service")]
        service: Option<String>,
        /// Host port to publish the service on
        #[arg(long = "host-port")]
        host_port: Option<u16>,
        /// Container port the service listens on
        #[arg(long = "container-port")]
        container_port: Option<u16>,
        /// Build context directory
        #[arg(short = 'C', long = "context")]
        context: Option<PathBuf>,
        /// Environment file handed to the container at start
        #[arg(short = 'e', long = "env-file")]
        env_file: Option<PathBuf>,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(self) -> ExecutionMode {
        match self.command {
            Some(Commands::Deploy {
                service,
                host_port,
                container_port,
                context,
                env_file,
                config,
                verbose,
            }) => ExecutionMode::Deploy(DeployInvocation {
                overrides: TargetOverrides {
                    service,
                    host_port,
                    container_port,
                    context,
                    env_file,
                },
                config_override: config,
                verbose,
            }),
            Some(Commands::ShowConfig) => ExecutionMode::ShowConfig,
            // arg_required_else_help leaves this unreachable, but clap owns
            // that invariant, not us
            None => ExecutionMode::ShowConfig,
        }
    }
}
