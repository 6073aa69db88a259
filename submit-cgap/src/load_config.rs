/// `load_config` module: builds the [`PortalConfig`] for one invocation from an optional
/// YAML file and the process environment.
///
/// # Sources, lowest precedence first
/// - Built-in defaults (production server, known environments, polling every 15s for 8 tries)
/// - A YAML file given by `--config`, or by `$SUBMIT_CGAP_CONFIG` when the flag is absent.
///   Every key is optional:
///
///   ```yaml
///   production_server: https://cgap.hms.harvard.edu
///   default_env: fourfront-cgapdev
///   environments:
///     fourfront-cgapdev: http://fourfront-cgapdev.example.com
///   poll:
///     interval_secs: 15
///     max_tries: 8
///   aws_program: aws
///   ```
///
///   A given `environments` table replaces the built-in one entirely.
/// - `$SUBMIT_CGAP_DEFAULT_ENV`, which overrides `default_env`.
///
/// # Errors
/// Unreadable or unparsable files fail with an `anyhow::Error` naming the file.
/// A zero `poll.interval_secs` or `poll.max_tries` is rejected.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use submit_cgap_core::config::PortalConfig;
use tracing::{error, info};

pub const CONFIG_ENV_VAR: &str = "SUBMIT_CGAP_CONFIG";
pub const DEFAULT_ENV_VAR: &str = "SUBMIT_CGAP_DEFAULT_ENV";

pub fn load_config(path: Option<&Path>) -> Result<PortalConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| env_value(CONFIG_ENV_VAR).map(PathBuf::from));

    let mut config = match path {
        Some(path) => load_config_file(&path)?,
        None => {
            info!("No config file given, using built-in defaults");
            PortalConfig::default()
        }
    };

    if let Some(env) = env_value(DEFAULT_ENV_VAR) {
        info!(default_env = %env, "Default env taken from environment");
        config.default_env = Some(env);
    }
    if config.poll.max_tries == 0 {
        anyhow::bail!("poll.max_tries must be at least 1");
    }
    if config.poll.interval_secs == 0 {
        anyhow::bail!("poll.interval_secs must be at least 1");
    }

    config.trace_loaded();
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<PortalConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    // An empty file is valid YAML for "all defaults".
    if content.trim().is_empty() {
        return Ok(PortalConfig::default());
    }

    match serde_yaml::from_str::<PortalConfig>(&content) {
        Ok(config) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path))
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
