#![doc = "Reference-manager bridge for the CLI: implements the core `ReferenceManager` trait over HTTP against the Zotero bridge endpoint."]
//
//! # Zotero bridge client
//!
//! Every call is one `POST <endpoint>` whose JSON body names an action and
//! its options:
//!
//! ```json
//! {"action": "list", "options": {"collection": "thesis"}}
//! ```
//!
//! The bridge answers with a two-element array, `["ok", payload]` or
//! `["error", reason]`. A payload may also arrive as a JSON-encoded string,
//! which is decoded once more.
//!
//! - Construct [`ZoteroClient`] from the loaded [`BridgeConfig`].
//! - PDF paths in listed items are converted to local paths here, once.
//!
//! For the trait contract and item shape, see core's `contract` module.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use paperpal_core::config::BridgeConfig;
use paperpal_core::contract::{BridgeError, ReferenceManager, RemoteItem, Translator};
use serde::Serialize;
use serde_json::{json, Value};

pub struct ZoteroClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    action: &'a str,
    options: Value,
}

impl ZoteroClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                BridgeError::Transport(e.to_string())
            })?;
        tracing::info!(
            endpoint = %config.endpoint,
            timeout_secs = config.timeout_secs,
            "Initialized ZoteroClient"
        );
        Ok(ZoteroClient {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, action: &str, options: Value) -> Result<Value, BridgeError> {
        tracing::debug!(action, %options, endpoint = %self.endpoint, "Sending bridge request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&BridgeRequest { action, options })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(action, error = ?e, "Bridge request failed");
                BridgeError::Transport(e.to_string())
            })?;

        let (status, payload): (String, Value) = response.json().await.map_err(|e| {
            tracing::error!(action, error = ?e, "Bridge reply is not a [status, payload] pair");
            BridgeError::Decode(e.to_string())
        })?;

        let payload = unwrap_payload(payload);
        match status.as_str() {
            "ok" => Ok(payload),
            "error" => {
                tracing::error!(action, reason = %payload, "Bridge reported an error");
                Err(BridgeError::Remote { reason: payload })
            }
            other => Err(BridgeError::Decode(format!("unknown reply status {other:?}"))),
        }
    }
}

/// Payloads sent as JSON text are decoded; anything else is used as is.
fn unwrap_payload(payload: Value) -> Value {
    if let Value::String(text) = &payload {
        if let Ok(decoded) = serde_json::from_str(text) {
            return decoded;
        }
    }
    payload
}

fn export_options(collection: &str, translator: Translator, filename: &Path) -> Value {
    let mut options = json!({
        "collection": collection,
        "filename": filename.to_string_lossy(),
    });
    if translator != Translator::default() {
        options["translator"] = json!(translator.id());
    }
    options
}

#[async_trait]
impl ReferenceManager for ZoteroClient {
    async fn list(&self, collection: &str) -> Result<Vec<RemoteItem>, BridgeError> {
        let payload = self.send("list", json!({ "collection": collection })).await?;
        let items: Vec<RemoteItem> = serde_json::from_value(payload).map_err(|e| {
            tracing::error!(collection, error = ?e, "Unexpected item list from bridge");
            BridgeError::Decode(e.to_string())
        })?;
        tracing::info!(collection, items = items.len(), "Listed collection");
        Ok(items.into_iter().map(RemoteItem::with_local_pdf_path).collect())
    }

    async fn export_bibliography(
        &self,
        collection: &str,
        translator: Translator,
        filename: &Path,
    ) -> Result<(), BridgeError> {
        self.send(
            "exportBibliography",
            export_options(collection, translator, filename),
        )
        .await?;
        tracing::info!(collection, %translator, filename = %filename.display(), "Bridge exported bibliography");
        Ok(())
    }
}
