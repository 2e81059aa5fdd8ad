//! Top-level workflows behind the `paperpal` subcommands.
//!
//! Each function drives one command end to end against the collaborator
//! traits in [`crate::contract`]:
//! - [`export_bibliography`]: have the reference manager write a collection's
//!   bibliography and move it into place
//! - [`copy_pdfs`]: copy every out-of-date PDF of a collection into a directory
//! - [`to_ebook`]: reflow every out-of-date PDF with `k2pdfopt`
//! - [`fix_bibliography_file`]: rewrite a `.bib` file as ASCII for IEEE/ACM
//!   templates
//!
//! # Error Handling
//! Workflows are fail-fast: the first bridge, I/O or tool failure is logged
//! and returned, and nothing after it runs. Items the sync planner cannot
//! handle are not failures; they come back in [`SyncReport::skipped`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::authors::format_authors;
use crate::contract::{BridgeError, FileStat, ReferenceManager, Translator};
use crate::fix::{fix_bibliography, FixError};
use crate::k2pdfopt::{K2pdfopt, Metadata};
use crate::sync_plan::{plan_sync, SkipWarning, SyncAction};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Fix {
        path: PathBuf,
        #[source]
        source: FixError,
    },
    #[error("could not launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("k2pdfopt failed for {cite_key}: {status}")]
    Tool { cite_key: String, status: ExitStatus },
}

impl WorkflowError {
    fn io(path: &Path, source: io::Error) -> Self {
        WorkflowError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a PDF sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub written: Vec<SyncedItem>,
    pub skipped: Vec<SkipWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedItem {
    pub cite_key: String,
    pub destination: PathBuf,
}

impl From<&SyncAction> for SyncedItem {
    fn from(action: &SyncAction) -> Self {
        SyncedItem {
            cite_key: action.item.cite_key.clone().unwrap_or_default(),
            destination: action.destination.clone(),
        }
    }
}

/// Export `collection` with `translator` and write the bibliography to
/// `destination`.
///
/// The reference manager writes into a temporary file first, so a failed
/// export never truncates an existing `destination`.
pub async fn export_bibliography<R>(
    manager: &R,
    collection: &str,
    translator: Translator,
    destination: &Path,
) -> Result<(), WorkflowError>
where
    R: ReferenceManager + ?Sized,
{
    info!(collection, %translator, destination = %destination.display(), "[EXPORT] Starting export");

    let scratch = NamedTempFile::new().map_err(|e| {
        error!(error = %e, "[EXPORT][ERROR] Could not create temporary file");
        WorkflowError::io(&std::env::temp_dir(), e)
    })?;

    if let Err(e) = manager
        .export_bibliography(collection, translator, scratch.path())
        .await
    {
        error!(collection, error = %e, "[EXPORT][ERROR] Reference manager export failed");
        return Err(e.into());
    }

    let text = fs::read_to_string(scratch.path()).map_err(|e| {
        error!(path = %scratch.path().display(), error = %e, "[EXPORT][ERROR] Could not read exported bibliography");
        WorkflowError::io(scratch.path(), e)
    })?;
    fs::write(destination, &text).map_err(|e| {
        error!(destination = %destination.display(), error = %e, "[EXPORT][ERROR] Could not write bibliography");
        WorkflowError::io(destination, e)
    })?;

    info!(collection, bytes = text.len(), destination = %destination.display(), "[EXPORT] Export complete");
    Ok(())
}

/// Copy the PDF of every item in `collection` whose `<directory>/<cite_key>.pdf`
/// is missing or stale.
pub async fn copy_pdfs<R, F>(
    manager: &R,
    stat: &F,
    collection: &str,
    directory: &Path,
) -> Result<SyncReport, WorkflowError>
where
    R: ReferenceManager + ?Sized,
    F: FileStat + ?Sized,
{
    info!(collection, directory = %directory.display(), "[COPY] Starting PDF copy");
    let items = list_collection(manager, collection).await?;
    ensure_directory(directory)?;

    let mut plan = plan_sync(items, directory, stat);
    let mut written = Vec::new();
    for action in plan.by_ref() {
        fs::copy(&action.source, &action.destination).map_err(|e| {
            error!(
                source = %action.source.display(),
                destination = %action.destination.display(),
                error = %e,
                "[COPY][ERROR] Copy failed"
            );
            WorkflowError::io(&action.destination, e)
        })?;
        info!(destination = %action.destination.display(), "[COPY] Copied");
        written.push(SyncedItem::from(&action));
    }

    let report = SyncReport {
        written,
        skipped: plan.into_skipped(),
    };
    info!(
        copied = report.written.len(),
        skipped = report.skipped.len(),
        "[COPY] PDF copy complete"
    );
    Ok(report)
}

/// Reflow the PDF of every out-of-date item in `collection` into `directory`,
/// tagging each output with the item's authors and title. `extra_args` are
/// passed to `k2pdfopt` unchanged.
pub async fn to_ebook<R, F>(
    manager: &R,
    stat: &F,
    tool: &K2pdfopt,
    collection: &str,
    directory: &Path,
    extra_args: &[String],
) -> Result<SyncReport, WorkflowError>
where
    R: ReferenceManager + ?Sized,
    F: FileStat + ?Sized,
{
    info!(
        collection,
        directory = %directory.display(),
        program = %tool.program().display(),
        "[EBOOK] Starting conversion"
    );
    let items = list_collection(manager, collection).await?;
    ensure_directory(directory)?;

    let mut plan = plan_sync(items, directory, stat);
    let mut written = Vec::new();
    for action in plan.by_ref() {
        let synced = SyncedItem::from(&action);
        let author = format_authors(&action.item.authors);
        let metadata = Metadata {
            author: Some(author.as_str()),
            title: Some(action.item.title.as_str()),
        };

        info!(cite_key = %synced.cite_key, source = %action.source.display(), "[EBOOK] Converting");
        let status = tool
            .convert(&action.source, &action.destination, &metadata, extra_args)
            .map_err(|e| {
                error!(program = %tool.program().display(), error = %e, "[EBOOK][ERROR] Could not launch k2pdfopt");
                WorkflowError::Launch {
                    program: tool.program().to_path_buf(),
                    source: e,
                }
            })?;
        if !status.success() {
            error!(cite_key = %synced.cite_key, %status, "[EBOOK][ERROR] k2pdfopt failed");
            return Err(WorkflowError::Tool {
                cite_key: synced.cite_key,
                status,
            });
        }
        written.push(synced);
    }

    let report = SyncReport {
        written,
        skipped: plan.into_skipped(),
    };
    info!(
        converted = report.written.len(),
        skipped = report.skipped.len(),
        "[EBOOK] Conversion complete"
    );
    Ok(report)
}

/// Read `source`, fix it, and write the ASCII result to `destination`.
pub fn fix_bibliography_file(source: &Path, destination: &Path) -> Result<(), WorkflowError> {
    info!(source = %source.display(), destination = %destination.display(), "[FIX] Fixing bibliography");

    let text = fs::read_to_string(source).map_err(|e| {
        error!(source = %source.display(), error = %e, "[FIX][ERROR] Could not read bibliography");
        WorkflowError::io(source, e)
    })?;
    let fixed = fix_bibliography(&text).map_err(|e| WorkflowError::Fix {
        path: source.to_path_buf(),
        source: e,
    })?;
    fs::write(destination, fixed).map_err(|e| {
        error!(destination = %destination.display(), error = %e, "[FIX][ERROR] Could not write bibliography");
        WorkflowError::io(destination, e)
    })?;

    info!(destination = %destination.display(), "[FIX] Bibliography written");
    Ok(())
}

async fn list_collection<R>(
    manager: &R,
    collection: &str,
) -> Result<Vec<crate::contract::RemoteItem>, WorkflowError>
where
    R: ReferenceManager + ?Sized,
{
    match manager.list(collection).await {
        Ok(items) => {
            info!(collection, items = items.len(), "Listed collection");
            Ok(items)
        }
        Err(e) => {
            error!(collection, error = %e, "Failed to list collection");
            Err(e.into())
        }
    }
}

fn ensure_directory(directory: &Path) -> Result<(), WorkflowError> {
    fs::create_dir_all(directory).map_err(|e| {
        error!(directory = %directory.display(), error = %e, "Could not create directory");
        WorkflowError::io(directory, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Author, LocalFs, MockReferenceManager, RemoteItem};
    use tempfile::tempdir;

    fn paper(cite_key: &str, pdf: &Path) -> RemoteItem {
        RemoteItem {
            authors: vec![
                Author {
                    first: Some("J.".into()),
                    last: Some("Lerch".into()),
                },
                Author {
                    first: Some("M.".into()),
                    last: Some("Mezini".into()),
                },
            ],
            title: "Finding Duplicates".into(),
            date: Some("2013".into()),
            cite_key: Some(cite_key.into()),
            pdf_filename: Some(pdf.to_string_lossy().into_owned()),
        }
    }

    #[tokio::test]
    async fn test_export_writes_what_the_bridge_exported() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("bibliography.bib");

        let mut manager = MockReferenceManager::new();
        manager
            .expect_export_bibliography()
            .withf(|collection, translator, _| {
                collection == "thesis" && *translator == Translator::Biblatex
            })
            .times(1)
            .returning(|_, _, filename| {
                fs::write(filename, "@article{k, title={T}}\n").unwrap();
                Ok(())
            });

        export_bibliography(&manager, "thesis", Translator::Biblatex, &destination)
            .await
            .unwrap();
        assert_eq!(
            fs::read_to_string(&destination).unwrap(),
            "@article{k, title={T}}\n"
        );
    }

    #[tokio::test]
    async fn test_export_error_leaves_destination_alone() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("bibliography.bib");
        fs::write(&destination, "old").unwrap();

        let mut manager = MockReferenceManager::new();
        manager.expect_export_bibliography().returning(|_, _, _| {
            Err(BridgeError::Remote {
                reason: serde_json::json!("no such collection"),
            })
        });

        let err = export_bibliography(&manager, "nope", Translator::Bibtex, &destination)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Bridge(BridgeError::Remote { .. })));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_copy_pdfs_copies_and_reports_skips() {
        let zotero = tempdir().unwrap();
        let source = zotero.path().join("a.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();
        let target = tempdir().unwrap();
        let directory = target.path().join("papers");

        let items = vec![
            paper("lerch2013", &source),
            RemoteItem {
                cite_key: Some("nopdf".into()),
                ..Default::default()
            },
        ];
        let mut manager = MockReferenceManager::new();
        manager
            .expect_list()
            .withf(|collection| collection == "thesis")
            .times(1)
            .returning(move |_| Ok(items.clone()));

        let report = copy_pdfs(&manager, &LocalFs, "thesis", &directory)
            .await
            .unwrap();

        let copied = directory.join("lerch2013.pdf");
        assert_eq!(fs::read(&copied).unwrap(), b"%PDF-1.4");
        assert_eq!(
            report.written,
            vec![SyncedItem {
                cite_key: "lerch2013".into(),
                destination: copied,
            }]
        );
        assert_eq!(
            report.skipped,
            vec![SkipWarning::MissingPdf {
                cite_key: "nopdf".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_copy_pdfs_stops_on_bridge_error() {
        let target = tempdir().unwrap();
        let mut manager = MockReferenceManager::new();
        manager
            .expect_list()
            .returning(|_| Err(BridgeError::Transport("connection refused".into())));

        let err = copy_pdfs(&manager, &LocalFs, "thesis", target.path())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Bridge(BridgeError::Transport(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_to_ebook_runs_tool_per_item() {
        let zotero = tempdir().unwrap();
        let source = zotero.path().join("a.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();
        let target = tempdir().unwrap();

        let items = vec![paper("lerch2013", &source)];
        let mut manager = MockReferenceManager::new();
        manager
            .expect_list()
            .returning(move |_| Ok(items.clone()));

        let report = to_ebook(
            &manager,
            &LocalFs,
            &K2pdfopt::new("true"),
            "thesis",
            target.path(),
            &[],
        )
        .await
        .unwrap();
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.written[0].cite_key, "lerch2013");
        assert!(report.skipped.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_to_ebook_fails_fast_on_tool_error() {
        let zotero = tempdir().unwrap();
        let first = zotero.path().join("a.pdf");
        let second = zotero.path().join("b.pdf");
        fs::write(&first, b"a").unwrap();
        fs::write(&second, b"b").unwrap();
        let target = tempdir().unwrap();

        let items = vec![paper("first", &first), paper("second", &second)];
        let mut manager = MockReferenceManager::new();
        manager
            .expect_list()
            .returning(move |_| Ok(items.clone()));

        let err = to_ebook(
            &manager,
            &LocalFs,
            &K2pdfopt::new("false"),
            "thesis",
            target.path(),
            &[],
        )
        .await
        .unwrap_err();
        match err {
            WorkflowError::Tool { cite_key, status } => {
                assert_eq!(cite_key, "first");
                assert!(!status.success());
            }
            other => panic!("expected a tool failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_to_ebook_reports_missing_program() {
        let zotero = tempdir().unwrap();
        let source = zotero.path().join("a.pdf");
        fs::write(&source, b"a").unwrap();
        let target = tempdir().unwrap();

        let items = vec![paper("lerch2013", &source)];
        let mut manager = MockReferenceManager::new();
        manager
            .expect_list()
            .returning(move |_| Ok(items.clone()));

        let err = to_ebook(
            &manager,
            &LocalFs,
            &K2pdfopt::new(zotero.path().join("no-such-k2pdfopt")),
            "thesis",
            target.path(),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Launch { .. }));
    }

    #[test]
    fn test_fix_bibliography_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("in.bib");
        let destination = dir.path().join("out.bib");
        fs::write(
            &source,
            "@article{vasic2009,\n  author = {Vasić, M.},\n  date = {2009-01},\n  doi = {10.1/x}\n}\n",
        )
        .unwrap();

        fix_bibliography_file(&source, &destination).unwrap();

        let fixed = fs::read_to_string(&destination).unwrap();
        assert!(fixed.is_ascii());
        assert!(fixed.contains("year = {2009}"));
        assert!(!fixed.contains("doi"));
    }

    #[test]
    fn test_fix_bibliography_file_names_the_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.bib");
        fs::write(&source, "@article{k, title = {unterminated\n").unwrap();

        let err = fix_bibliography_file(&source, &dir.path().join("out.bib")).unwrap_err();
        assert!(matches!(err, WorkflowError::Fix { .. }));
        assert!(err.to_string().contains("broken.bib"));
    }
}
