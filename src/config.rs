// Daemon configuration: defaults, then neurohub.toml, then environment

use crate::comm::CommConfig;
use crate::executor::ExecutorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Config file looked up in the base directory
pub const CONFIG_FILE: &str = "neurohub.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Cannot determine base directory: {0}")]
    BaseDir(std::io::Error),
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub comm: CommConfig,
    pub executor: ExecutorConfig,
}

/// Parse a variable through `lookup`, logging a warning if the value is present but invalid.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T {
    match lookup(name) {
        Some(v) => match v.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %v, "Invalid env var value, using default");
                default
            }
        },
        None => default,
    }
}

/// Make `path` absolute relative to `base`
fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl AppConfig {
    /// Load from `.env`, `NEUROHUB_BASE_DIR` (or the current directory),
    /// its `neurohub.toml` and `NEUROHUB_*` variables
    pub fn from_env() -> Result<(PathBuf, Self), ConfigError> {
        dotenvy::dotenv().ok();

        let base_dir = match std::env::var_os("NEUROHUB_BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().map_err(ConfigError::BaseDir)?,
        };

        let config = Self::load(&base_dir, |name| std::env::var(name).ok())?;
        Ok((base_dir, config))
    }

    /// Load `base_dir/neurohub.toml` if present, apply overrides from
    /// `lookup` and anchor relative paths at `base_dir`
    pub fn load(
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = base_dir.join(CONFIG_FILE);

        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::Read(path.clone(), e))?;
            let config: AppConfig =
                toml::from_str(&content).map_err(|e| ConfigError::Parse(path.clone(), e))?;
            debug!(path = %path.display(), "loaded config file");
            config
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            AppConfig::default()
        };

        config.apply_overrides(&lookup);

        config.comm.templates_dir = anchor(base_dir, &config.comm.templates_dir);
        config.comm.resources_file = anchor(base_dir, &config.comm.resources_file);
        config.executor.workflows_dir = anchor(base_dir, &config.executor.workflows_dir);

        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let comm = &mut self.comm;
        comm.listen_addr = parse_var(lookup, "NEUROHUB_LISTEN_ADDR", comm.listen_addr.clone());
        comm.listen_port = parse_var(lookup, "NEUROHUB_PORT", comm.listen_port);
        comm.templates_dir =
            parse_var(lookup, "NEUROHUB_TEMPLATES_DIR", comm.templates_dir.clone());
        comm.resources_file =
            parse_var(lookup, "NEUROHUB_RESOURCES_FILE", comm.resources_file.clone());
        comm.open_browser = parse_var(lookup, "NEUROHUB_OPEN_BROWSER", comm.open_browser);

        let exec = &mut self.executor;
        exec.workflows_dir =
            parse_var(lookup, "NEUROHUB_WORKFLOWS_DIR", exec.workflows_dir.clone());
        exec.shell = parse_var(lookup, "NEUROHUB_SHELL", exec.shell.clone());
        exec.allow_ad_hoc_commands =
            parse_var(lookup, "NEUROHUB_ALLOW_AD_HOC", exec.allow_ad_hoc_commands);
        exec.contain_workflows =
            parse_var(lookup, "NEUROHUB_CONTAIN_WORKFLOWS", exec.contain_workflows);
        exec.max_output_bytes =
            parse_var(lookup, "NEUROHUB_MAX_OUTPUT_BYTES", exec.max_output_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_anchored_at_base() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path(), no_env).unwrap();

        assert_eq!(config.comm.listen_addr, "127.0.0.1");
        assert_eq!(config.comm.listen_port, 8765);
        assert_eq!(config.comm.templates_dir, dir.path().join("templates"));
        assert_eq!(config.comm.resources_file, dir.path().join("resources.json"));
        assert_eq!(config.executor.workflows_dir, dir.path().join("workflows"));
        assert_eq!(config.executor.shell, "bash");
        assert!(config.executor.allow_ad_hoc_commands);
        assert!(config.executor.contain_workflows);
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
[comm]
listen_port = 9000
open_browser = false

[executor]
workflows_dir = "/srv/flows"
allow_ad_hoc_commands = false
"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            ("NEUROHUB_PORT", "9100"),
            ("NEUROHUB_SHELL", "sh"),
            ("NEUROHUB_CONTAIN_WORKFLOWS", "not-a-bool"),
        ]);
        let config =
            AppConfig::load(dir.path(), |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.comm.listen_port, 9100);
        assert!(!config.comm.open_browser);
        assert_eq!(config.executor.workflows_dir, PathBuf::from("/srv/flows"));
        assert!(!config.executor.allow_ad_hoc_commands);
        assert_eq!(config.executor.shell, "sh");
        // invalid value keeps the previous one
        assert!(config.executor.contain_workflows);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[comm\nlisten_port = ").unwrap();

        let err = AppConfig::load(dir.path(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_, _)));
    }
}
