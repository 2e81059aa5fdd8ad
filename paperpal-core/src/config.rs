//! Typed configuration for the bridge endpoint and the PDF reflow tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_BRIDGE_ENDPOINT: &str = "http://127.0.0.1:23119/paperpal";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub ebook: EbookConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            endpoint = %self.bridge.endpoint,
            timeout_secs = self.bridge.timeout_secs,
            k2pdfopt = %self.ebook.program.display(),
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Where the reference-manager bridge listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// The PDF reflow tool used by `to-ebook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbookConfig {
    #[serde(default = "default_program")]
    pub program: PathBuf,
}

impl Default for EbookConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_BRIDGE_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_program() -> PathBuf {
    PathBuf::from("k2pdfopt")
}
