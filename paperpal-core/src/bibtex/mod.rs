//! BibTeX parsing, formatting and LaTeX encoding.
//!
//! The three pieces are independent: [`parse`] turns text into a
//! [`Bibliography`], callers mutate its entries, and [`format_bibliography`]
//! writes it back as ASCII via [`latex::encode`].

mod entry;
mod formatter;
pub mod latex;
mod parser;

pub use entry::{BibEntry, Bibliography, Block, Field, ValueKind};
pub use formatter::{format_bibliography, format_entry};
pub use parser::{parse, ParseError};
