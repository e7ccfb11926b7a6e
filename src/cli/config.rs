//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./redock.toml or ./.redock/config.toml
//! 2. User config: ~/.redock/config.toml
//! 3. System config: /etc/redock/config.toml
//! 4. Built-in defaults
//!
//! CLI flags override whatever the discovered file provides; the service
//! name is the one value with no built-in default.

use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deploy::DeployTarget;

/// Main application directory name (hidden directory like .git, .vscode)
pub const REDOCK_DIR_NAME: &str = ".redock";

/// Configuration file name inside the hidden directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Plain configuration file name in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "redock.toml";

/// Default port on both sides of the mapping
pub const DEFAULT_PORT: u16 = 8000;

/// Default build context directory
pub const DEFAULT_CONTEXT: &str = ".";

/// Default environment file
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no service name given; pass --service or set `service` in redock.toml")]
    MissingService,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk deploy-target configuration. Every field is optional; anything
/// absent falls back to the built-in defaults at resolve time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployDefaults {
    pub service: Option<String>,
    pub host_port: Option<u16>,
    pub container_port: Option<u16>,
    pub context: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Per-invocation overrides collected from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    pub service: Option<String>,
    pub host_port: Option<u16>,
    pub container_port: Option<u16>,
    pub context: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

impl DeployDefaults {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve into a concrete [`DeployTarget`]: overrides win over file
    /// values, file values win over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingService`] when neither source names the
    /// service.
    pub fn resolve(self, overrides: TargetOverrides) -> Result<DeployTarget, ConfigError> {
        let service = overrides
            .service
            .or(self.service)
            .ok_or(ConfigError::MissingService)?;

        Ok(DeployTarget {
            service,
            host_port: overrides
                .host_port
                .or(self.host_port)
                .unwrap_or(DEFAULT_PORT),
            container_port: overrides
                .container_port
                .or(self.container_port)
                .unwrap_or(DEFAULT_PORT),
            context: overrides
                .context
                .or(self.context)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTEXT)),
            env_file: overrides
                .env_file
                .or(self.env_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE)),
        })
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load configuration: the explicit path when given, otherwise the first
    /// hit in the discovery hierarchy, otherwise built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<DeployDefaults, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading configuration from: {:?}", path);
            return DeployDefaults::from_toml_file(path);
        }

        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return DeployDefaults::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(DeployDefaults::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = Self::get_config_candidates();

        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.exists() && candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // 1. Current directory: ./redock.toml, ./.redock/config.toml
        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(LOCAL_CONFIG_FILE_NAME));
            candidates.push(current_dir.join(REDOCK_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        // 2. User config: ~/.redock/config.toml
        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(home_dir.join(REDOCK_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        // 3. System config: /etc/redock/config.toml (Unix-like systems)
        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/redock/config.toml"));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("redock")
                    .join("config.toml"),
            );
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(path) => println!("Active configuration: {:?}", path),
            None => println!("Active configuration: built-in defaults"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_need_only_a_service() {
        let target = DeployDefaults::default()
            .resolve(TargetOverrides {
                service: Some("svc".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(target.service, "svc");
        assert_eq!(target.host_port, DEFAULT_PORT);
        assert_eq!(target.container_port, DEFAULT_PORT);
        assert_eq!(target.context, PathBuf::from("."));
        assert_eq!(target.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn test_resolve_without_service_fails() {
        let err = DeployDefaults::default()
            .resolve(TargetOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingService));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let defaults = DeployDefaults {
            service: Some("from-file".to_string()),
            host_port: Some(9000),
            container_port: Some(9000),
            context: Some(PathBuf::from("srv")),
            env_file: None,
        };

        let target = defaults
            .resolve(TargetOverrides {
                service: Some("from-flag".to_string()),
                host_port: Some(8080),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(target.service, "from-flag");
        assert_eq!(target.host_port, 8080);
        assert_eq!(target.container_port, 9000);
        assert_eq!(target.context, PathBuf::from("srv"));
        assert_eq!(target.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redock.toml");
        fs::write(
            &path,
            "service = \"svc\"\nhost_port = 8000\ncontainer_port = 3000\nenv_file = \"prod.env\"\n",
        )
        .unwrap();

        let defaults = DeployDefaults::from_toml_file(&path).unwrap();
        assert_eq!(defaults.service.as_deref(), Some("svc"));
        assert_eq!(defaults.host_port, Some(8000));
        assert_eq!(defaults.container_port, Some(3000));
        assert_eq!(defaults.context, None);
        assert_eq!(defaults.env_file, Some(PathBuf::from("prod.env")));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = DeployDefaults::from_toml_file("/nonexistent/redock.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_toml_file_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redock.toml");
        fs::write(&path, "service = [not toml").unwrap();

        let err = DeployDefaults::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
