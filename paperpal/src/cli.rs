///
/// This module implements the full CLI interface for paperpal: command parsing,
/// argument validation, and the async entrypoint shared by `main` and the tests.
///
/// All bibliography and sync logic lives in the [`paperpal-core`] crate.
/// This module is strictly CLI glue: it loads the config, builds the Zotero
/// client and hands both to a core workflow.
///
/// ## Features
/// - Entry struct [`Cli`] defines the global `--config` option and the subcommands.
/// - Async entrypoint (`run`) for programmatic invocation and integration testing.
/// - Skipped items are reported as `warn` events on stderr.
///
/// [`paperpal-core`]: ../../paperpal-core/
use crate::load_config::load_config;
use crate::zotero::ZoteroClient;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use paperpal_core::contract::{LocalFs, Translator};
use paperpal_core::k2pdfopt::K2pdfopt;
use paperpal_core::workflow;
use std::path::PathBuf;

/// CLI for paperpal: utilities for a streamlined bibliography workflow.
#[derive(Parser, Debug)]
#[clap(
    name = "paperpal",
    version,
    about = "Utilities for a streamlined bibliography workflow"
)]
pub struct Cli {
    /// Path to a YAML config file (bridge endpoint, k2pdfopt location)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exports a collection as a BibTeX bibliography
    Export {
        #[clap(flatten)]
        translator: TranslatorChoice,
        /// Name of the collection to export
        collection: String,
        /// Name of the exported file
        #[clap(default_value = "bibliography.bib")]
        destination: PathBuf,
    },
    /// Copies PDFs from the collection to a directory
    Copy {
        /// Name of the collection
        collection: String,
        /// Destination of copied PDFs
        directory: PathBuf,
    },
    /// Reflows PDFs from the collection for an e-reader using k2pdfopt
    ToEbook {
        /// Name of the collection
        collection: String,
        /// Destination of translated PDFs
        directory: PathBuf,
        /// Remaining arguments are passed to k2pdfopt unchanged
        #[clap(trailing_var_arg = true, allow_hyphen_values = true, value_name = "...")]
        args: Vec<String>,
    },
    /// Fixes an existing .bib file for easier usage with IEEEtran.cls and sig-alternate.cls
    FixBibliography {
        /// Name of input file
        bibliography: PathBuf,
        /// Name of output file
        destination: PathBuf,
    },
}

/// At most one translator flag; BibTeX when none is given.
#[derive(Args, Debug, Default, Clone, Copy)]
#[group(multiple = false)]
pub struct TranslatorChoice {
    /// Use BibTeX as the translator (default)
    #[clap(long)]
    pub bibtex: bool,
    /// Use BibLaTeX as the translator
    #[clap(long)]
    pub biblatex: bool,
    /// Use Better BibTeX as the translator
    #[clap(long)]
    pub better_bibtex: bool,
    /// Use Better BibLaTeX as the translator
    #[clap(long)]
    pub better_biblatex: bool,
}

impl TranslatorChoice {
    pub fn translator(&self) -> Translator {
        if self.biblatex {
            Translator::Biblatex
        } else if self.better_bibtex {
            Translator::BetterBibtex
        } else if self.better_biblatex {
            Translator::BetterBiblatex
        } else {
            Translator::Bibtex
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            translator,
            collection,
            destination,
        } => {
            let translator = translator.translator();
            tracing::info!(command = "export", %collection, %translator, "Starting export");
            let client = ZoteroClient::new(&config.bridge)?;
            workflow::export_bibliography(&client, &collection, translator, &destination)
                .await
                .with_context(|| format!("Failed to export collection {collection:?}"))?;
            tracing::info!(command = "export", destination = %destination.display(), "Export complete");
        }
        Commands::Copy {
            collection,
            directory,
        } => {
            tracing::info!(command = "copy", %collection, "Starting PDF copy");
            let client = ZoteroClient::new(&config.bridge)?;
            let report = workflow::copy_pdfs(&client, &LocalFs, &collection, &directory)
                .await
                .with_context(|| format!("Failed to copy PDFs of collection {collection:?}"))?;
            tracing::info!(
                command = "copy",
                copied = report.written.len(),
                skipped = report.skipped.len(),
                "PDF copy complete"
            );
        }
        Commands::ToEbook {
            collection,
            directory,
            args,
        } => {
            tracing::info!(command = "to-ebook", %collection, ?args, "Starting conversion");
            let client = ZoteroClient::new(&config.bridge)?;
            let tool = K2pdfopt::new(config.ebook.program.clone());
            let report =
                workflow::to_ebook(&client, &LocalFs, &tool, &collection, &directory, &args)
                    .await
                    .with_context(|| {
                        format!("Failed to convert PDFs of collection {collection:?}")
                    })?;
            tracing::info!(
                command = "to-ebook",
                converted = report.written.len(),
                skipped = report.skipped.len(),
                "Conversion complete"
            );
        }
        Commands::FixBibliography {
            bibliography,
            destination,
        } => {
            tracing::info!(command = "fix-bibliography", source = %bibliography.display(), "Fixing bibliography");
            workflow::fix_bibliography_file(&bibliography, &destination).with_context(|| {
                format!("Failed to fix bibliography {}", bibliography.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_defaults() {
        let cli = Cli::try_parse_from(["paperpal", "export", "thesis"]).unwrap();
        match cli.command {
            Commands::Export {
                translator,
                collection,
                destination,
            } => {
                assert_eq!(translator.translator(), Translator::Bibtex);
                assert_eq!(collection, "thesis");
                assert_eq!(destination, PathBuf::from("bibliography.bib"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_export_translator_flags() {
        let cli =
            Cli::try_parse_from(["paperpal", "export", "--better-biblatex", "thesis", "refs.bib"])
                .unwrap();
        let Commands::Export { translator, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(translator.translator(), Translator::BetterBiblatex);

        assert!(
            Cli::try_parse_from(["paperpal", "export", "--bibtex", "--biblatex", "thesis"])
                .is_err(),
            "translator flags are mutually exclusive"
        );
    }

    #[test]
    fn test_to_ebook_passes_remaining_args() {
        let cli = Cli::try_parse_from([
            "paperpal", "to-ebook", "thesis", "kindle", "--", "-w", "758", "-h", "1024",
        ])
        .unwrap();
        let Commands::ToEbook { args, .. } = cli.command else {
            panic!("expected to-ebook");
        };
        assert_eq!(args, vec!["-w", "758", "-h", "1024"]);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "paperpal", "copy", "thesis", "papers", "--config", "paperpal.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("paperpal.yaml")));
    }
}
