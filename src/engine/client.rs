//! Engine API connection management.
//!
//! Wraps the bollard client with a connection fallback chain and an upfront
//! ping, so the workflow starts from a verified socket.

use std::sync::Arc;

use bollard::Docker;
use tracing::{debug, info};

use crate::engine::{server_status, EngineError, Result};

/// Handle to a verified Docker/Podman API connection.
#[derive(Clone)]
pub struct EngineClient {
    docker: Arc<Docker>,
}

impl EngineClient {
    /// Connect to the engine and verify the connection with a ping.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] if no endpoint could be reached,
    /// or the ping failure otherwise.
    pub async fn new() -> Result<Self> {
        let docker = Self::connect().await?;

        let client = Self {
            docker: Arc::new(docker),
        };
        client.ping().await?;

        Ok(client)
    }

    /// Connect to Docker or Podman.
    ///
    /// Tries multiple connection strategies in order:
    /// 1. Local defaults (Unix socket or Windows named pipe, honoring DOCKER_HOST)
    /// 2. Rootless Podman socket
    /// 3. System Podman socket
    async fn connect() -> Result<Docker> {
        debug!("Attempting to connect to container engine...");

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container engine via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            if let Ok(home) = std::env::var("HOME") {
                let podman_socket = format!("unix://{}/run/podman/podman.sock", home);
                debug!("Trying Podman socket: {}", podman_socket);

                match Docker::connect_with_socket(&podman_socket, 120, bollard::API_DEFAULT_VERSION)
                {
                    Ok(docker) => {
                        info!("Connected to Podman via rootless socket");
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman rootless socket failed: {}", e);
                    }
                }
            }

            let system_socket = "unix:///run/podman/podman.sock";
            debug!("Trying system Podman socket: {}", system_socket);

            match Docker::connect_with_socket(system_socket, 120, bollard::API_DEFAULT_VERSION) {
                Ok(docker) => {
                    info!("Connected to Podman via system socket");
                    return Ok(docker);
                }
                Err(e) => {
                    debug!("Podman system socket failed: {}", e);
                }
            }
        }

        Err(EngineError::Unavailable(
            "Failed to connect to Docker or Podman. Please ensure a container engine is installed and running.".to_string()
        ))
    }

    /// Ping the engine to verify connectivity.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        debug!("Container engine ping successful");
        Ok(())
    }

    /// Get the underlying bollard client.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Resolve the image id currently behind a tag.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ImageMissing`] if the tag does not exist.
    pub async fn image_id(&self, tag: &str) -> Result<String> {
        let inspect = self.docker.inspect_image(tag).await.map_err(|e| {
            match server_status(&e) {
                Some((404, _)) => EngineError::ImageMissing(tag.to_string()),
                _ => EngineError::Api(e),
            }
        })?;

        inspect
            .id
            .ok_or_else(|| EngineError::ImageMissing(format!("{} has no image id", tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Docker/Podman to be running
    async fn test_client_connection() {
        let client = EngineClient::new().await.unwrap();
        client.ping().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_missing_image_id() {
        let client = EngineClient::new().await.unwrap();
        let err = client
            .image_id("redock-test-no-such-image:latest")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ImageMissing(_)));
    }
}
