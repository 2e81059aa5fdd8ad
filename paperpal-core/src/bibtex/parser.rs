//! BibTeX parser built on nom.
//!
//! Handles the subset of the BibTeX family that reference managers export:
//! - regular entries with `{}` or `()` delimiters
//! - braced, quoted, numeric and macro field values, `#` concatenation
//! - nested braces in values
//! - `@string`, `@preamble` and `@comment` blocks (carried through verbatim)
//!
//! Unlike a lenient reader, any malformed block fails the whole parse with a
//! [`ParseError`] pointing at the offending position.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0, one_of},
    combinator::peek,
    sequence::tuple,
    IResult,
};
use tracing::debug;

use super::entry::{BibEntry, Bibliography, Block, ValueKind};

/// Malformed bibliography text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    fn at(input: &str, rest: &str, message: impl Into<String>) -> Self {
        let offset = input.len() - rest.len();
        let consumed = &input[..offset];
        let line = consumed.matches('\n').count() as u32 + 1;
        let column = match consumed.rfind('\n') {
            Some(pos) => consumed[pos + 1..].chars().count(),
            None => consumed.chars().count(),
        } as u32
            + 1;
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Parse a whole BibTeX document into its ordered blocks.
pub fn parse(input: &str) -> Result<Bibliography, ParseError> {
    let mut bibliography = Bibliography::default();
    let mut remaining = input;

    loop {
        // Anything outside an @-block is an implicit comment.
        remaining = match remaining.find('@') {
            Some(pos) => &remaining[pos..],
            None => break,
        };
        if block_header(remaining).is_err() {
            // An `@` in free text, such as an e-mail address.
            remaining = &remaining[1..];
            continue;
        }

        match parse_block(remaining) {
            Ok((rest, block)) => {
                bibliography.blocks.push(block);
                remaining = rest;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let kind = block_type(remaining).unwrap_or("");
                return Err(ParseError::at(
                    input,
                    e.input,
                    format!("malformed @{kind} block"),
                ));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ParseError::at(input, remaining, "unexpected end of input"));
            }
        }
    }

    debug!(blocks = bibliography.blocks.len(), "Parsed bibliography");
    Ok(bibliography)
}

fn block_type(input: &str) -> Option<&str> {
    block_header(input).ok().map(|(_, block_type)| block_type)
}

/// `@type` followed by the `{` or `(` that opens its body. Only this starts a
/// block; any other `@` belongs to the surrounding free text.
fn block_header(input: &str) -> IResult<&str, &str> {
    let (rest, (_, _, block_type, _)) = tuple((
        char('@'),
        multispace0,
        take_while1(|c: char| c.is_ascii_alphabetic()),
        multispace0,
    ))(input)?;
    let (rest, _) = peek(one_of("{("))(rest)?;
    Ok((rest, block_type))
}

fn parse_block(input: &str) -> IResult<&str, Block> {
    let (rest, block_type) = block_header(input)?;

    match block_type.to_lowercase().as_str() {
        "string" => {
            let (rest, body) = parse_delimited_body(rest)?;
            Ok((rest, Block::String(body.trim().to_string())))
        }
        "preamble" => {
            let (rest, body) = parse_delimited_body(rest)?;
            Ok((rest, Block::Preamble(body.trim().to_string())))
        }
        "comment" => {
            let (rest, body) = parse_delimited_body(rest)?;
            Ok((rest, Block::Comment(body.to_string())))
        }
        _ => {
            let (rest, entry) = parse_entry_body(rest, block_type)?;
            Ok((rest, Block::Entry(entry)))
        }
    }
}

/// Body of a `{...}` or `(...)` block, without the outer delimiters.
fn parse_delimited_body(input: &str) -> IResult<&str, &str> {
    if input.starts_with('{') {
        let (rest, content) = parse_braced_content(input)?;
        Ok((rest, &content[1..content.len() - 1]))
    } else {
        let (rest, _) = char('(')(input)?;
        match find_closing_paren(rest) {
            Some(pos) => Ok((&rest[pos + 1..], &rest[..pos])),
            None => Err(nom_error(input)),
        }
    }
}

/// Position of the `)` closing a block opened just before `input`, ignoring
/// parentheses inside braces. The body must have balanced braces so it can be
/// written back in `{}` form.
fn find_closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut chars = input.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return None,
            '}' => depth -= 1,
            ')' if depth == 0 => return Some(pos),
            '\\' => {
                chars.next();
            }
            _ => {}
        }
    }
    None
}

fn parse_entry_body<'a>(input: &'a str, entry_type: &str) -> IResult<&'a str, BibEntry> {
    let (rest, open) = nom::branch::alt((char('{'), char('(')))(input)?;
    let close = if open == '{' { '}' } else { ')' };
    let (rest, _) = multispace0(rest)?;
    let (rest, key) = take_while1(is_key_char)(rest)?;
    let (rest, _) = multispace0(rest)?;

    let mut entry = BibEntry::new(entry_type, key);

    let rest = match rest.strip_prefix(',') {
        Some(after_comma) => {
            let (rest, fields) = parse_fields(after_comma)?;
            for (name, value, kind) in fields {
                entry.push_field(name, value, kind);
            }
            rest
        }
        None => rest,
    };

    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(close)(rest)?;
    Ok((rest, entry))
}

fn parse_fields(input: &str) -> IResult<&str, Vec<(String, String, ValueKind)>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        if rest.starts_with('}') || rest.starts_with(')') {
            return Ok((rest, fields));
        }

        let (rest, field) = parse_single_field(rest)?;
        fields.push(field);

        let (rest, _) = multispace0(rest)?;
        match rest.strip_prefix(',') {
            Some(after_comma) => remaining = after_comma,
            None => return Ok((rest, fields)),
        }
    }
}

fn parse_single_field(input: &str) -> IResult<&str, (String, String, ValueKind)> {
    let (rest, name) = take_while1(is_name_char)(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, (value, kind)) = parse_field_value(rest)?;
    Ok((rest, (name.to_string(), value, kind)))
}

/// A value is one or more `#`-joined parts. A lone braced or quoted part keeps
/// only its content; anything else is kept as the raw expression.
fn parse_field_value(input: &str) -> IResult<&str, (String, ValueKind)> {
    let mut parts = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, part) = parse_value_part(remaining)?;
        parts.push(part);
        let (after_space, _) = multispace0(rest)?;
        match after_space.strip_prefix('#') {
            Some(after_hash) => {
                let (after_hash, _) = multispace0(after_hash)?;
                remaining = after_hash;
            }
            None => {
                remaining = rest;
                break;
            }
        }
    }

    if parts.len() == 1 {
        let (content, kind) = parts.remove(0);
        return Ok((remaining, (content.to_string(), kind)));
    }
    let raw = &input[..input.len() - remaining.len()];
    Ok((remaining, (raw.trim_end().to_string(), ValueKind::Bare)))
}

fn parse_value_part(input: &str) -> IResult<&str, (&str, ValueKind)> {
    if input.starts_with('{') {
        let (rest, content) = parse_braced_content(input)?;
        Ok((rest, (&content[1..content.len() - 1], ValueKind::Braced)))
    } else if input.starts_with('"') {
        let (rest, content) = parse_quoted_content(input)?;
        Ok((rest, (content, ValueKind::Quoted)))
    } else {
        let (rest, word) = take_while1(is_bare_char)(input)?;
        Ok((rest, (word, ValueKind::Bare)))
    }
}

/// Braced content including the outer braces, honouring nesting.
fn parse_braced_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom_error(input));
    }

    let mut depth = 0;
    let mut pos = 0;
    let bytes = input.as_bytes();

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            b'\\' => {
                // \{ and \} do not count towards nesting
                pos += 1;
            }
            _ => {}
        }
        pos += 1;
    }

    Err(nom_error(input))
}

/// Quoted content without the quotes. A `"` inside braces does not close.
fn parse_quoted_content(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('"')(input)?;
    let mut depth = 0i32;
    let bytes = rest.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' if depth == 0 => return Ok((&rest[pos + 1..], &rest[..pos])),
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(nom_error(input))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, ',' | '{' | '}' | '(' | ')' | '"' | '#' | '%' | '=' | '\'')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '+')
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, ',' | '{' | '}' | '(' | ')' | '"' | '#' | '=')
}

fn nom_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
}
