//! # redock
//!
//! Rebuild-and-replace deployment for a single containerized service.
//! One invocation builds a fresh image from the service's build context,
//! tears down whatever container currently holds the service's name, starts
//! a new detached container on the fixed host port with environment taken
//! from an env file, and then tails the new container's output until the
//! operator interrupts or the container exits.
//!
//! ## Architecture Overview
//!
//! The crate is organized into three modules:
//!
//! - **[`engine`]**: the typed container-engine boundary. The
//!   [`engine::ContainerEngine`] trait captures the five capabilities the
//!   workflow needs (build, stop, remove, run, logs); [`engine::DockerEngine`]
//!   implements them over the Docker/Podman API socket via bollard.
//! - **[`deploy`]**: the four-stage workflow itself. [`deploy::Deployer`]
//!   drives Build → Reap → Launch → Tail strictly in order, failing fast with
//!   a per-stage error and exit code.
//! - **[`cli`]**: argument parsing and configuration discovery. A deploy
//!   target is assembled from CLI flags over an optional `redock.toml` over
//!   built-in defaults.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redock::{Deployer, DockerEngine, DeployTarget};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = DockerEngine::connect().await?;
//!     let target = DeployTarget {
//!         service: "svc".to_string(),
//!         host_port: 8000,
//!         container_port: 8000,
//!         context: ".".into(),
//!         env_file: ".env".into(),
//!     };
//!     let outcome = Deployer::new(engine, target).run().await?;
//!     println!("detached: {:?}", outcome);
//!     Ok(())
//! }
//! ```

/// Typed container-engine boundary.
///
/// Defines the capability set the workflow consumes and its production
/// implementation over the engine API socket.
pub mod engine;

/// The redeploy workflow.
///
/// Sequential Build → Reap → Launch → Tail stages with per-stage error
/// reporting and idempotent teardown.
pub mod deploy;

/// Command-line interface and configuration discovery.
pub mod cli;

// Re-export the engine boundary
pub use engine::{ContainerEngine, DockerEngine, EngineClient, EngineError, LogStream, RunSpec};

// Re-export the workflow types
pub use deploy::{DeployError, DeployTarget, Deployer, Outcome, Stage};

// Re-export configuration types
pub use cli::config::{ConfigDiscovery, ConfigError, DeployDefaults, TargetOverrides};
