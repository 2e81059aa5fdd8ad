#![doc = "paperpal-core: bibliography and PDF sync logic for paperpal."]

//! This crate holds everything paperpal does that does not need a terminal or
//! a network socket: the BibTeX fixer, the sync planner that decides which
//! PDFs to (re)write, and the workflows that tie them to a reference manager.
//! The reference manager and the filesystem are reached through the traits in
//! [`contract`], so every workflow can run against mocks.
//!
//! # Usage
//! The `paperpal` CLI crate depends on this one and supplies the HTTP
//! [`contract::ReferenceManager`] implementation.

pub mod authors;
pub mod bibtex;
pub mod config;
pub mod contract;
pub mod fix;
pub mod k2pdfopt;
pub mod normalize;
pub mod sync_plan;
pub mod workflow;
pub mod year;

pub use fix::{fix_bibliography, FixError};
pub use year::{extract_year, YearNotFoundError};
