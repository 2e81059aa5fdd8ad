//! # contract: collaborator interfaces and shared records
//!
//! The core never talks to the reference manager or the filesystem directly.
//! It goes through the two traits defined here:
//! - [`ReferenceManager`]: the typed bridge to Zotero (list a collection,
//!   export a collection's bibliography to a file).
//! - [`FileStat`]: existence and modification-time queries used by the sync
//!   planner.
//!
//! Both traits are annotated for `mockall`, so tests and downstream crates can
//! build deterministic mocks (`MockReferenceManager`, `MockFileStat`) with the
//! `test-export-mocks` feature.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// One creator of a paper as the reference manager reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

/// A regular item (paper) in a reference-manager collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub title: String,
    /// Publication date as the reference manager displays it; only used in
    /// diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub cite_key: Option<String>,
    #[serde(default)]
    pub pdf_filename: Option<String>,
}

impl RemoteItem {
    /// Turn a `file://` URL with percent-escapes into a plain local path.
    /// Applied once, when the item is received from the bridge.
    pub fn with_local_pdf_path(mut self) -> Self {
        if let Some(original) = self.pdf_filename.take() {
            let stripped = original.strip_prefix("file://").unwrap_or(&original);
            let decoded = urlencoding::decode(stripped)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| stripped.to_string());
            self.pdf_filename = Some(decoded);
        }
        self
    }
}

/// Zotero export translators selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Translator {
    #[default]
    Bibtex,
    Biblatex,
    BetterBibtex,
    BetterBiblatex,
}

impl Translator {
    /// The reference manager's translator ID.
    pub fn id(&self) -> &'static str {
        match self {
            Translator::Bibtex => "9cb70025-a888-4a29-a210-93ec52da40d4",
            Translator::Biblatex => "b6e39b57-8942-4d11-8259-342c46ce395f",
            Translator::BetterBibtex | Translator::BetterBiblatex => {
                "f895aa0d-f28e-47fe-b247-2ea77c6ed583"
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Translator::Bibtex => "bibtex",
            Translator::Biblatex => "biblatex",
            Translator::BetterBibtex => "better-bibtex",
            Translator::BetterBiblatex => "better-biblatex",
        }
    }
}

impl fmt::Display for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Translator {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bibtex" => Ok(Translator::Bibtex),
            "biblatex" => Ok(Translator::Biblatex),
            "better-bibtex" => Ok(Translator::BetterBibtex),
            "better-biblatex" => Ok(Translator::BetterBiblatex),
            other => Err(BridgeError::UnknownTranslator(other.to_string())),
        }
    }
}

/// Failures talking to the reference manager.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The reference manager answered with an `"error"` status.
    #[error("reference manager reported an error: {reason}")]
    Remote { reason: serde_json::Value },
    #[error("could not reach the reference manager: {0}")]
    Transport(String),
    #[error("unexpected reply from the reference manager: {0}")]
    Decode(String),
    #[error("unknown translator {0:?}")]
    UnknownTranslator(String),
}

/// Typed bridge to the reference manager.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReferenceManager: Send + Sync {
    /// All regular items of the named collection, in the reference manager's
    /// order, with PDF paths already made local.
    async fn list(&self, collection: &str) -> Result<Vec<RemoteItem>, BridgeError>;

    /// Ask the reference manager to write the collection's bibliography to
    /// `filename` using `translator`.
    async fn export_bibliography(
        &self,
        collection: &str,
        translator: Translator,
        filename: &Path,
    ) -> Result<(), BridgeError>;
}

/// Filesystem metadata queries.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait FileStat {
    fn exists(&self, path: &Path) -> bool;

    /// Last modification time, or `None` if the file does not exist or the
    /// platform cannot tell.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// [`FileStat`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileStat for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Destination of a synced PDF: `<directory>/<cite_key>.pdf`.
///
/// Path separators and drive colons in the cite key become `_`, so the file
/// always lands directly inside `directory`.
pub fn destination_for(directory: &Path, cite_key: &str) -> PathBuf {
    let file_stem: String = cite_key
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    directory.join(format!("{file_stem}.pdf"))
}
