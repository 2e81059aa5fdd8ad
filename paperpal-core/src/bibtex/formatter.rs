//! BibTeX formatting module
//!
//! Converts a [`Bibliography`] back to BibTeX text. Every value and block body
//! passes through [`latex::encode`], so the output is always ASCII.

use super::entry::{BibEntry, Bibliography, Block, ValueKind};
use super::latex;

/// Format a whole document, blocks separated by a blank line.
pub fn format_bibliography(bibliography: &Bibliography) -> String {
    let mut result = String::new();
    for block in &bibliography.blocks {
        result.push_str(&format_block(block));
        result.push_str("\n\n");
    }
    let trimmed_len = result.trim_end().len();
    result.truncate(trimmed_len);
    if !result.is_empty() {
        result.push('\n');
    }
    result
}

fn format_block(block: &Block) -> String {
    match block {
        Block::Entry(entry) => format_entry(entry),
        Block::String(body) => format!("@string{{{}}}", latex::encode(body)),
        Block::Preamble(body) => format!("@preamble{{{}}}", latex::encode(body)),
        Block::Comment(body) => format!("@comment{{{}}}", latex::encode(body)),
    }
}

/// Format a single entry.
pub fn format_entry(entry: &BibEntry) -> String {
    let mut result = String::new();

    result.push('@');
    result.push_str(&entry.entry_type);
    result.push('{');
    result.push_str(&entry.entry_key);

    for field in entry.fields() {
        result.push_str(",\n  ");
        result.push_str(&field.name);
        result.push_str(" = ");
        let value = latex::encode(&field.value);
        match field.kind {
            ValueKind::Bare => result.push_str(&value),
            ValueKind::Braced | ValueKind::Quoted => {
                result.push('{');
                result.push_str(&value);
                result.push('}');
            }
        }
    }

    result.push_str("\n}");
    result
}
