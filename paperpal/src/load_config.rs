/// `load_config` module: reads the optional YAML config file and applies environment overrides.
///
/// This is the only place where user-supplied YAML is parsed into the core [`Config`].
///
/// # Responsibilities
/// - Parse the file given with `--config` into [`Config`]; built-in defaults when no file is given
/// - Apply `PAPERPAL_BRIDGE_URL` and `PAPERPAL_K2PDFOPT` on top of the file
/// - Fail with a message naming the file and the YAML problem
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted schema:
///
/// ```yaml
/// bridge:
///   endpoint: "http://127.0.0.1:23119/paperpal"
///   timeout_secs: 30
/// ebook:
///   program: k2pdfopt
/// ```
use anyhow::Result;
use paperpal_core::config::Config;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const BRIDGE_URL_ENV: &str = "PAPERPAL_BRIDGE_URL";
pub const K2PDFOPT_ENV: &str = "PAPERPAL_K2PDFOPT";

/// Loads the config file if one is given, then applies environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config);
    config.trace_loaded();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file is a valid config with every default.
    if config_content.trim().is_empty() {
        return Ok(Config::default());
    }

    match serde_yaml::from_str(&config_content) {
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

fn apply_env_overrides(config: &mut Config) {
    if let Some(endpoint) = non_empty_var(BRIDGE_URL_ENV) {
        info!(env = BRIDGE_URL_ENV, %endpoint, "Bridge endpoint overridden from environment");
        config.bridge.endpoint = endpoint;
    }
    if let Some(program) = non_empty_var(K2PDFOPT_ENV) {
        info!(env = K2PDFOPT_ENV, %program, "k2pdfopt program overridden from environment");
        config.ebook.program = PathBuf::from(program);
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
