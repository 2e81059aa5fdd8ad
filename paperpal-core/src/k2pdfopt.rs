//! Wrapper around the external `k2pdfopt` PDF reflow tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Flags that reflow a two-column paper for a Kindle Paperwhite.
const BASE_ARGS: [&str; 6] = ["-ui-", "-x", "-mode", "2col", "-dev", "kpw"];

/// Metadata written into the converted PDF.
#[derive(Debug, Clone, Default)]
pub struct Metadata<'a> {
    pub author: Option<&'a str>,
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct K2pdfopt {
    program: PathBuf,
}

impl Default for K2pdfopt {
    fn default() -> Self {
        Self::new("k2pdfopt")
    }
}

impl K2pdfopt {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one conversion:
    /// `-ui- -x -mode 2col -dev kpw [-author A] [-title T] <extra...> -o <dest> <source>`.
    pub fn args(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata<'_>,
        extra_args: &[String],
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = BASE_ARGS.iter().map(OsString::from).collect();

        if let Some(author) = metadata.author {
            args.push("-author".into());
            args.push(author.into());
        }
        if let Some(title) = metadata.title {
            args.push("-title".into());
            args.push(title.into());
        }

        args.extend(extra_args.iter().map(OsString::from));
        args.push("-o".into());
        args.push(destination.into());
        args.push(source.into());
        args
    }

    /// Run the conversion and wait for it. The exit status is the only result.
    pub fn convert(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata<'_>,
        extra_args: &[String],
    ) -> std::io::Result<ExitStatus> {
        let args = self.args(source, destination, metadata, extra_args);
        tracing::debug!(program = %self.program.display(), ?args, "Launching k2pdfopt");
        Command::new(&self.program).args(&args).status()
    }
}
