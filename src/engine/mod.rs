//! Typed container-engine boundary.
//!
//! Every interaction with Docker/Podman goes through the [`ContainerEngine`]
//! trait rather than a shelled-out CLI, so failures arrive as structured
//! error kinds instead of exit codes to parse, and tests can substitute an
//! in-memory engine.
//!
//! ## Architecture
//!
//! - [`client`]: connection management for the engine API socket
//! - [`docker`]: the production [`ContainerEngine`] implementation
//! - [`envfile`]: client-side loading of the container env file

mod client;
mod docker;
mod envfile;

pub use client::EngineClient;
pub use docker::DockerEngine;
pub use envfile::read_env_file;

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// Container engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Engine API error with no more specific classification
    #[error("engine API error: {0}")]
    Api(#[from] bollard::errors::Error),

    /// No engine endpoint could be reached
    #[error("{0}")]
    Unavailable(String),

    /// Container not found
    #[error("container not found: {0}")]
    NotFound(String),

    /// Image referenced at launch does not exist
    #[error("image not found: {0}")]
    ImageMissing(String),

    /// Container name already taken
    #[error("container name already in use: {0}")]
    NameInUse(String),

    /// Host port already bound
    #[error("host port unavailable: {0}")]
    PortInUse(String),

    /// The engine reported a build failure
    #[error("image build failed: {0}")]
    BuildFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Byte stream of a container's combined stdout/stderr output.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// One container launch, fully specified.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Image to instantiate
    pub image: String,
    /// Container name
    pub name: String,
    /// Host port to publish on
    pub host_port: u16,
    /// Container port the service listens on
    pub container_port: u16,
    /// KEY=VALUE pairs, handed to the engine verbatim
    pub env: Vec<String>,
}

/// The capability set the redeploy workflow needs from a container engine.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Build an image from the `context` directory and tag it `tag`.
    /// Returns the image id behind the tag.
    async fn build(&self, context: &Path, tag: &str) -> Result<String>;

    /// Stop the named container. Returns [`EngineError::NotFound`] when no
    /// such container exists; stopping an already-stopped container is ok.
    async fn stop(&self, name: &str) -> Result<()>;

    /// Remove the named container. Returns [`EngineError::NotFound`] when no
    /// such container exists.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Create and start a detached container. Returns the container id.
    async fn run(&self, spec: &RunSpec) -> Result<String>;

    /// Attach to the named container's combined output stream, from the
    /// beginning, following new output while `follow` is set.
    async fn logs(&self, name: &str, follow: bool) -> Result<LogStream>;
}

/// Pull status and message out of an engine API server error, if that is
/// what `err` is.
pub(crate) fn server_status(err: &bollard::errors::Error) -> Option<(u16, &str)> {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}
