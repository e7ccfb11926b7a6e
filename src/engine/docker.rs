//! Production [`ContainerEngine`] implementation over the engine API.
//!
//! Builds stream the packed context to the image-build endpoint; container
//! lifecycle calls map API status codes onto the error kinds the workflow
//! branches on (404 not-found, 409 name conflict, port allocation failures).

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use bollard::service::{HostConfig, PortBinding};
use futures::stream::StreamExt;
use tracing::{debug, info};

use crate::engine::{
    server_status, ContainerEngine, EngineClient, EngineError, LogStream, Result, RunSpec,
};

/// Seconds the engine waits for a container to stop before killing it.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Container engine backed by the Docker/Podman API socket.
#[derive(Clone)]
pub struct DockerEngine {
    client: EngineClient,
}

impl DockerEngine {
    /// Connect to the local engine.
    ///
    /// # Errors
    ///
    /// Returns error if no engine endpoint is reachable.
    pub async fn connect() -> Result<Self> {
        let client = EngineClient::new().await?;
        Ok(Self { client })
    }

    /// Wrap an existing verified connection.
    pub fn with_client(client: EngineClient) -> Self {
        Self { client }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &EngineClient {
        &self.client
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn build(&self, context: &Path, tag: &str) -> Result<String> {
        info!("Building image {} from {}", tag, context.display());

        let archive = archive_context(context).await?;

        let options = bollard::image::BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut stream =
            self.client
                .docker()
                .build_image(options, None, Some(bollard::body_full(archive.into())));

        let mut stdout = std::io::stdout();
        while let Some(msg) = stream.next().await {
            let progress = msg?;
            if let Some(line) = progress.stream {
                // Raw build output belongs to the operator, not the log layer
                let _ = stdout.write_all(line.as_bytes());
                let _ = stdout.flush();
            }
            if let Some(error) = progress.error {
                return Err(EngineError::BuildFailed(error.trim().to_string()));
            }
        }

        let image_id = self.client.image_id(tag).await?;
        info!("Built image {} ({})", tag, image_id);
        Ok(image_id)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        debug!("Stopping container: {}", name);

        match self
            .client
            .docker()
            .stop_container(
                name,
                Some(bollard::container::StopContainerOptions {
                    t: STOP_TIMEOUT_SECS,
                }),
            )
            .await
        {
            Ok(()) => {
                info!("Stopped container: {}", name);
                Ok(())
            }
            Err(e) => match server_status(&e) {
                Some((404, _)) => Err(EngineError::NotFound(name.to_string())),
                // 304: container was not running, which is all stop asks for
                Some((304, _)) => Ok(()),
                _ => Err(EngineError::Api(e)),
            },
        }
    }

    async fn remove(&self, name: &str) -> Result<()> {
        debug!("Removing container: {}", name);

        match self
            .client
            .docker()
            .remove_container(
                name,
                Some(bollard::container::RemoveContainerOptions {
                    force: false,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => {
                info!("Removed container: {}", name);
                Ok(())
            }
            Err(e) => match server_status(&e) {
                Some((404, _)) => Err(EngineError::NotFound(name.to_string())),
                _ => Err(EngineError::Api(e)),
            },
        }
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        let options = bollard::container::CreateContainerOptions {
            name: spec.name.as_str(),
            ..Default::default()
        };

        let container_port = format!("{}/tcp", spec.container_port);

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            container_port.clone(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(spec.host_port.to_string()),
            }]),
        );

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(container_port, HashMap::new());

        let config = bollard::container::Config {
            image: Some(spec.image.clone()),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        debug!("Creating container: {}", spec.name);

        let created = self
            .client
            .docker()
            .create_container(Some(options), config)
            .await
            .map_err(|e| match server_status(&e) {
                Some((409, _)) => EngineError::NameInUse(spec.name.clone()),
                Some((404, _)) => EngineError::ImageMissing(spec.image.clone()),
                _ => EngineError::Api(e),
            })?;

        if let Err(e) = self
            .client
            .docker()
            .start_container(
                &created.id,
                None::<bollard::container::StartContainerOptions<String>>,
            )
            .await
        {
            return Err(match server_status(&e) {
                Some((_, msg)) if port_allocation_failure(msg) => {
                    EngineError::PortInUse(format!("{}: {}", spec.host_port, msg))
                }
                _ => EngineError::Api(e),
            });
        }

        info!(
            "Started container {} ({}) publishing {}->{}",
            spec.name, created.id, spec.host_port, spec.container_port
        );

        Ok(created.id)
    }

    async fn logs(&self, name: &str, follow: bool) -> Result<LogStream> {
        debug!("Attaching to logs of container: {}", name);

        let docker = self.client.docker().clone();
        let container = name.to_string();
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Vec<u8>>>(64);

        // Reader task owns the engine stream; dropping the receiver side
        // (operator detach) ends it without touching the container
        tokio::spawn(async move {
            let options = bollard::container::LogsOptions {
                stdout: true,
                stderr: true,
                follow,
                tail: "all".to_string(),
                ..Default::default()
            };

            let mut stream = docker.logs(&container, Some(options));
            while let Some(item) = stream.next().await {
                let chunk = match item {
                    Ok(chunk) => Ok(chunk.into_bytes().to_vec()),
                    Err(e) => Err(match server_status(&e) {
                        Some((404, _)) => EngineError::NotFound(container.clone()),
                        _ => EngineError::Api(e),
                    }),
                };
                let failed = chunk.is_err();
                if tx.send(chunk).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })))
    }
}

/// Pack a build context directory into a gzipped tar archive for the
/// image-build endpoint.
async fn archive_context(context: &Path) -> Result<Vec<u8>> {
    let context = context.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut archive = tar::Builder::new(encoder);
        archive.append_dir_all(".", &context)?;
        archive.into_inner()?.finish()
    })
    .await
    .map_err(|e| EngineError::Io(std::io::Error::other(e)))?
    .map_err(EngineError::Io)
}

/// Whether a start failure is the engine failing to bind the published port.
fn port_allocation_failure(message: &str) -> bool {
    message.contains("port is already allocated") || message.contains("address already in use")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_allocation_detection() {
        assert!(port_allocation_failure(
            "driver failed programming external connectivity on endpoint svc: \
             Bind for 0.0.0.0:8000 failed: port is already allocated"
        ));
        assert!(port_allocation_failure(
            "listen tcp4 0.0.0.0:8000: bind: address already in use"
        ));
        assert!(!port_allocation_failure("No such image: svc:latest"));
    }

    #[tokio::test]
    async fn test_archive_missing_context() {
        let err = archive_context(Path::new("/nonexistent/build/context"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[tokio::test]
    async fn test_archive_packs_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        let archive = archive_context(dir.path()).await.unwrap();
        // Gzip magic bytes
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    #[ignore] // Requires Docker/Podman to be running
    async fn test_stop_missing_container() {
        let engine = DockerEngine::connect().await.unwrap();
        let err = engine
            .stop("redock-test-no-such-container")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
