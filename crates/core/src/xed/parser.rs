//! XED block-format tokenizer.
//!
//! Turns raw lines into a lazy sequence of flat [`XedRecord`]s. The grammar:
//! 1. **Blocks:** A line holding only `{` opens a record and a line holding only `}` closes it.
//! 2. **Fields:** `KEY : value` (upper-case key) sets a field; a later line with the same key
//!    overwrites it. An empty `PATTERN` value takes the next line as its value.
//! 3. **Noise:** Blank lines, `#` comments, and lines matching no rule are skipped.
//!
//! Records without `ICLASS` are dropped. A record still open at end of input is yielded.
//! Nothing here fails on malformed text; only opening a file can return an error. Readers are
//! decoded line by line with invalid UTF-8 replaced, and [`LossyLines`] keeps count of the lines
//! that needed it.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::Result;

#[allow(clippy::unwrap_used)]
static FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z_]+)\s*:\s*(.*)$").unwrap());

/// One flat key/value block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XedRecord {
    fields: BTreeMap<String, String>,
}

impl XedRecord {
    /// Builds a record from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw field value, present even when empty.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Field value, treating an empty value as absent.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|v| !v.is_empty())
    }

    /// Field value or `""`.
    pub fn field_or_empty(&self, key: &str) -> &str {
        self.raw(key).unwrap_or_default()
    }

    /// The `ICLASS` mnemonic.
    pub fn iclass(&self) -> &str {
        self.field_or_empty("ICLASS")
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Lazy, restartable sequence of XED records over a line source.
///
/// Cloning the iterator before consumption gives an independent pass over the same input.
#[derive(Debug, Clone)]
pub struct XedBlocks<I> {
    lines: I,
}

impl<I, S> XedBlocks<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    /// Wraps a line iterator.
    pub const fn new(lines: I) -> Self {
        Self { lines }
    }

    /// The underlying line source.
    pub const fn lines(&self) -> &I {
        &self.lines
    }

    /// Reads fields until the closing brace or end of input.
    fn read_block(&mut self) -> Option<XedRecord> {
        let mut fields = BTreeMap::new();

        while let Some(raw) = self.lines.next() {
            let line = raw.as_ref().trim();
            if line == "}" {
                break;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(caps) = FIELD.captures(line) else {
                continue;
            };
            let key = caps[1].to_owned();
            let mut value = caps[2].trim().to_owned();

            if key == "PATTERN" && value.is_empty() {
                match self.lines.next() {
                    Some(next) if next.as_ref().trim() == "}" => {
                        let _ = fields.insert(key, value);
                        break;
                    }
                    Some(next) => value = next.as_ref().trim().to_owned(),
                    None => {}
                }
            }
            let _ = fields.insert(key, value);
        }

        fields.contains_key("ICLASS").then_some(XedRecord { fields })
    }
}

impl<I, S> Iterator for XedBlocks<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = XedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            if raw.as_ref().trim() != "{" {
                continue;
            }
            if let Some(record) = self.read_block() {
                return Some(record);
            }
        }
    }
}

/// Parses records from an in-memory string.
pub fn parse_str(text: &str) -> XedBlocks<std::str::Lines<'_>> {
    XedBlocks::new(text.lines())
}

/// Line source over a reader that never stops on undecodable bytes.
///
/// Invalid UTF-8 is replaced with `U+FFFD` and the line is counted. An I/O error ends the
/// sequence and is kept for the caller.
#[derive(Debug)]
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    replaced: usize,
    error: Option<io::Error>,
}

impl<R: BufRead> LossyLines<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            replaced: 0,
            error: None,
        }
    }

    /// Lines read so far that contained invalid UTF-8.
    pub const fn replaced_lines(&self) -> usize {
        self.replaced
    }

    /// The read error that ended the sequence, if any.
    pub const fn read_error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let mut line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(text) => text.to_owned(),
                    Cow::Owned(text) => {
                        self.replaced += 1;
                        text
                    }
                };
                let len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(len);
                Some(line)
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

/// Parses records from a buffered reader.
pub fn from_reader<R: BufRead>(reader: R) -> XedBlocks<LossyLines<R>> {
    XedBlocks::new(LossyLines::new(reader))
}

/// Opens a file and parses it lazily; one record is held in memory at a time.
pub fn parse_file(path: &Path) -> Result<XedBlocks<LossyLines<BufReader<File>>>> {
    let file = File::open(path)?;
    Ok(from_reader(BufReader::new(file)))
}
