//! The redeploy workflow.
//!
//! Four stages, strictly in order, each a thin call into the container
//! engine: Build the image, Reap the previous container, Launch a fresh one,
//! Tail its logs. A failure in any stage aborts the run; there is no retry
//! and no partial resume. The operator fixes the cause and re-invokes.

mod workflow;

pub use workflow::{relay_logs, Deployer};

use std::path::PathBuf;

use crate::engine::EngineError;

/// The workflow stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Image build
    Build,
    /// Teardown of the previous container
    Teardown,
    /// Launch of the new container
    Launch,
    /// Log tailing
    Tail,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Teardown => write!(f, "teardown"),
            Stage::Launch => write!(f, "launch"),
            Stage::Tail => write!(f, "tail"),
        }
    }
}

/// How a completed run ended. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operator interrupted the log tail; the container keeps running
    Interrupted,
    /// The container exited and its log stream ended
    ContainerExited,
}

/// A fatal failure in one of the workflow stages.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The image rebuild failed; nothing was torn down or launched
    #[error("build failed: {0}")]
    Build(EngineError),

    /// The previous container would not stop or remove (absence is not this)
    #[error("teardown failed: {0}")]
    Teardown(EngineError),

    /// The new container could not be created or started
    #[error("launch failed: {0}")]
    Launch(EngineError),

    /// The log stream could not be attached or broke mid-relay;
    /// the container itself is left running
    #[error("log tail failed: {0}")]
    Tail(EngineError),
}

impl DeployError {
    /// The stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::Build(_) => Stage::Build,
            DeployError::Teardown(_) => Stage::Teardown,
            DeployError::Launch(_) => Stage::Launch,
            DeployError::Tail(_) => Stage::Tail,
        }
    }

    /// Process exit code for this failure, distinct per stage so automation
    /// can tell the stages apart. 1 and 2 are left to setup and usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::Build(_) => 3,
            DeployError::Teardown(_) => 4,
            DeployError::Launch(_) => 5,
            DeployError::Tail(_) => 6,
        }
    }
}

/// One deployment target, fully resolved: the fixed service name plus the
/// port pair, build context, and env file it deploys with.
#[derive(Debug, Clone)]
pub struct DeployTarget {
    /// Name used for both the image tag and the container
    pub service: String,
    /// Host port to publish
    pub host_port: u16,
    /// Container port the service listens on
    pub container_port: u16,
    /// Build context directory
    pub context: PathBuf,
    /// Environment file read at launch time
    pub env_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_stage() {
        let errors = [
            DeployError::Build(EngineError::BuildFailed("x".into())),
            DeployError::Teardown(EngineError::Unavailable("x".into())),
            DeployError::Launch(EngineError::NameInUse("x".into())),
            DeployError::Tail(EngineError::NotFound("x".into())),
        ];

        let mut codes: Vec<i32> = errors.iter().map(DeployError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        // 0 is success, 1 setup, 2 usage
        assert!(codes.iter().all(|c| *c > 2));
    }

    #[test]
    fn test_stage_reported_in_message() {
        let err = DeployError::Launch(EngineError::PortInUse("8000".into()));
        assert_eq!(err.stage(), Stage::Launch);
        assert!(err.to_string().starts_with("launch failed"));
    }
}
