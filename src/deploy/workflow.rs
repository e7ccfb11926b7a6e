//! Workflow execution.
//!
//! [`Deployer`] drives the stages against any [`ContainerEngine`]; the
//! engine handle is passed in rather than reached for ambiently, so tests
//! run the whole workflow against an in-memory fake.

use futures::stream::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::deploy::{DeployError, DeployTarget, Outcome};
use crate::engine::{read_env_file, ContainerEngine, EngineError, LogStream, RunSpec};

/// Executes the redeploy workflow for one service.
pub struct Deployer<E> {
    engine: E,
    target: DeployTarget,
}

impl<E: ContainerEngine> Deployer<E> {
    /// Create a deployer for `target` backed by `engine`.
    pub fn new(engine: E, target: DeployTarget) -> Self {
        Self { engine, target }
    }

    /// Run the full workflow: Build → Reap → Launch → Tail.
    ///
    /// Blocks in the tail stage until the operator interrupts or the
    /// container exits.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; later stages are not attempted.
    pub async fn run(&self) -> Result<Outcome, DeployError> {
        let image = self.build().await?;
        self.reap().await?;
        self.launch(&image).await?;
        self.tail().await
    }

    /// Build a fresh image tagged with the service name.
    ///
    /// # Errors
    ///
    /// Any build failure is fatal: the workflow must not go on to replace a
    /// running container with a stale image.
    pub async fn build(&self) -> Result<String, DeployError> {
        info!(
            service = %self.target.service,
            context = %self.target.context.display(),
            "building image"
        );

        self.engine
            .build(&self.target.context, &self.target.service)
            .await
            .map_err(DeployError::Build)
    }

    /// Ensure no container holds the service name.
    ///
    /// Stop and remove both treat an absent container as success; the first
    /// deploy of a service has nothing to tear down. Only the not-found kind
    /// is tolerated: an unreachable engine or a refused stop aborts the run
    /// before launch can collide on the name or port.
    pub async fn reap(&self) -> Result<(), DeployError> {
        let name = &self.target.service;

        match self.engine.stop(name).await {
            Ok(()) => info!(container = %name, "stopped previous container"),
            Err(EngineError::NotFound(_)) => debug!(container = %name, "nothing to stop"),
            Err(e) => return Err(DeployError::Teardown(e)),
        }

        match self.engine.remove(name).await {
            Ok(()) => info!(container = %name, "removed previous container"),
            Err(EngineError::NotFound(_)) => debug!(container = %name, "nothing to remove"),
            Err(e) => return Err(DeployError::Teardown(e)),
        }

        Ok(())
    }

    /// Start a detached container from `image` under the service name.
    ///
    /// The env file is read here, once, so the container gets a snapshot of
    /// it as of launch time.
    pub async fn launch(&self, image: &str) -> Result<String, DeployError> {
        let env = read_env_file(&self.target.env_file)
            .map_err(|e| DeployError::Launch(EngineError::Io(e)))?;

        let spec = RunSpec {
            image: image.to_string(),
            name: self.target.service.clone(),
            host_port: self.target.host_port,
            container_port: self.target.container_port,
            env,
        };

        let id = self
            .engine
            .run(&spec)
            .await
            .map_err(DeployError::Launch)?;

        info!(
            container = %id,
            host_port = self.target.host_port,
            container_port = self.target.container_port,
            "launched container"
        );

        Ok(id)
    }

    /// Tail the container's combined output to stdout until Ctrl-C or the
    /// container exits. Interruption detaches only; the container keeps
    /// running.
    pub async fn tail(&self) -> Result<Outcome, DeployError> {
        let stream = self
            .engine
            .logs(&self.target.service, true)
            .await
            .map_err(DeployError::Tail)?;

        info!(container = %self.target.service, "tailing logs (Ctrl-C to detach)");

        let mut stdout = tokio::io::stdout();
        relay_logs(stream, &mut stdout, tokio::signal::ctrl_c()).await
    }
}

/// Relay a log stream to `sink`, one chunk at a time with no buffering,
/// until the stream ends or `shutdown` resolves. Shutdown wins when both
/// are ready; it detaches without touching the container.
pub async fn relay_logs<W, F>(
    mut stream: LogStream,
    sink: &mut W,
    shutdown: F,
) -> Result<Outcome, DeployError>
where
    W: AsyncWrite + Unpin,
    F: Future,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                debug!("log tail interrupted, detaching");
                return Ok(Outcome::Interrupted);
            }

            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    sink.write_all(&bytes)
                        .await
                        .map_err(|e| DeployError::Tail(EngineError::Io(e)))?;
                    sink.flush()
                        .await
                        .map_err(|e| DeployError::Tail(EngineError::Io(e)))?;
                }
                Some(Err(e)) => return Err(DeployError::Tail(e)),
                None => {
                    debug!("log stream ended, container exited");
                    return Ok(Outcome::ContainerExited);
                }
            }
        }
    }
}
