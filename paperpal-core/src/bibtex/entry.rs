//! BibTeX entry data structures

/// How a field value was written in the source document.
///
/// Braced and quoted values are both written back braced. Bare values
/// (numbers, `@string` macros such as `jan`, `#` concatenations) are written
/// back exactly as they were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Braced,
    Quoted,
    Bare,
}

/// A single field (key-value pair). `value` holds the text between the
/// delimiters, or the raw expression for [`ValueKind::Bare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub kind: ValueKind,
}

/// A parsed bibliography entry such as `@inproceedings{vasic2009, ...}`.
///
/// Field names are stored lower-case and looked up case-insensitively. Field
/// order is the order of the source document, with newly set fields appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub entry_type: String,
    pub entry_key: String,
    fields: Vec<Field>,
}

impl BibEntry {
    pub fn new(entry_type: impl Into<String>, entry_key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            entry_key: entry_key.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field as read from a document. A later duplicate replaces the
    /// earlier value in place.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>, kind: ValueKind) {
        let name = name.into().to_lowercase();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.kind = kind;
            }
            None => self.fields.push(Field { name, value, kind }),
        }
    }

    /// Set a field to a braced value, overwriting any existing one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.push_field(name, value, ValueKind::Braced);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        let name = name.to_lowercase();
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos).value)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// True for the informally typed web references whose URL is kept.
    pub fn is_web_reference(&self) -> bool {
        matches!(self.entry_type.as_str(), "online" | "misc")
    }
}

/// Any top-level block of a BibTeX document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Entry(BibEntry),
    /// `@string{name = value}`; the body is kept as written.
    String(String),
    /// `@preamble{...}`; the body is kept as written.
    Preamble(String),
    /// `@comment{...}`; the body is kept as written.
    Comment(String),
}

/// An ordered BibTeX document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    pub blocks: Vec<Block>,
}

impl Bibliography {
    pub fn entries(&self) -> impl Iterator<Item = &BibEntry> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Entry(e) => Some(e),
            _ => None,
        })
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut BibEntry> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Entry(e) => Some(e),
            _ => None,
        })
    }
}
