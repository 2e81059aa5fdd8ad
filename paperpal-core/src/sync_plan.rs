//! Decides which PDFs of a collection need to be (re)written locally.
//!
//! [`plan_sync`] walks the items of a collection once, in order, and yields a
//! [`SyncAction`] for every item whose `<directory>/<cite_key>.pdf` is missing
//! or older than the attachment. Items that cannot be synced are skipped with
//! a [`SkipWarning`]; the warning is logged and kept on the plan so callers can
//! report it after iterating.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::authors::format_authors;
use crate::contract::{destination_for, FileStat, RemoteItem};
use crate::year::extract_year;

/// One PDF to write: `source` is the attachment, `destination` is
/// `<directory>/<cite_key>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub item: RemoteItem,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Why an item was left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipWarning {
    MissingCiteKey {
        author: String,
        title: String,
        year: Option<u32>,
    },
    MissingPdf {
        cite_key: String,
    },
    UnresolvablePath {
        path: PathBuf,
    },
}

impl fmt::Display for SkipWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipWarning::MissingCiteKey {
                author,
                title,
                year,
            } => {
                write!(f, "Please generate a cite key for {author} \"{title}\"")?;
                match year {
                    Some(year) => write!(f, " {year}"),
                    None => write!(f, " n.d."),
                }
            }
            SkipWarning::MissingPdf { cite_key } => write!(f, "No PDF found for {cite_key}"),
            SkipWarning::UnresolvablePath { path } => {
                write!(f, "Cannot make sense of this path: {}. Skipping...", path.display())
            }
        }
    }
}

/// Lazy, single-pass plan over a collection. See [`plan_sync`].
pub struct SyncPlan<'a, I, F: ?Sized> {
    items: I,
    directory: PathBuf,
    stat: &'a F,
    skipped: Vec<SkipWarning>,
}

/// Plan the PDF sync of `items` into `directory`.
pub fn plan_sync<'a, I, F>(items: I, directory: impl Into<PathBuf>, stat: &'a F) -> SyncPlan<'a, I::IntoIter, F>
where
    I: IntoIterator<Item = RemoteItem>,
    F: FileStat + ?Sized,
{
    SyncPlan {
        items: items.into_iter(),
        directory: directory.into(),
        stat,
        skipped: Vec::new(),
    }
}

impl<'a, I, F: ?Sized> SyncPlan<'a, I, F> {
    /// Warnings for the items skipped so far.
    pub fn skipped(&self) -> &[SkipWarning] {
        &self.skipped
    }

    pub fn into_skipped(self) -> Vec<SkipWarning> {
        self.skipped
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl<'a, I, F> SyncPlan<'a, I, F>
where
    F: FileStat + ?Sized,
{
    fn skip(&mut self, warning: SkipWarning) {
        warn!(%warning, "Skipping item");
        self.skipped.push(warning);
    }

    /// The action for `item`, or `None` if it is skipped or already up to date.
    fn decide(&mut self, item: RemoteItem) -> Option<SyncAction> {
        let Some(cite_key) = item.cite_key.clone() else {
            self.skip(SkipWarning::MissingCiteKey {
                author: format_authors(&item.authors),
                title: item.title.clone(),
                year: item.date.as_deref().and_then(|d| extract_year(d).ok()),
            });
            return None;
        };

        let Some(pdf) = item.pdf_filename.as_deref() else {
            self.skip(SkipWarning::MissingPdf { cite_key });
            return None;
        };

        let source = PathBuf::from(pdf);
        if !self.stat.exists(&source) {
            self.skip(SkipWarning::UnresolvablePath { path: source });
            return None;
        }

        let destination = destination_for(&self.directory, &cite_key);
        // A missing destination sorts before every timestamp.
        let outdated = !self.stat.exists(&destination)
            || self.stat.modified(&source) > self.stat.modified(&destination);

        if !outdated {
            debug!(cite_key = %cite_key, destination = %destination.display(), "Destination is up to date");
            return None;
        }

        debug!(
            cite_key = %cite_key,
            source = %source.display(),
            destination = %destination.display(),
            "Planned sync action"
        );
        Some(SyncAction {
            item,
            source,
            destination,
        })
    }
}

impl<'a, I, F> Iterator for SyncPlan<'a, I, F>
where
    I: Iterator<Item = RemoteItem>,
    F: FileStat + ?Sized,
{
    type Item = SyncAction;

    fn next(&mut self) -> Option<SyncAction> {
        while let Some(item) = self.items.next() {
            if let Some(action) = self.decide(item) {
                return Some(action);
            }
        }
        None
    }
}
