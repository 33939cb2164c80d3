//! Importer for an Intel XED source tree.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::BufReader;
use std::iter;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Importer, SourceItem, SourceItems};
use crate::common::Result;
use crate::model::ArchMetadata;
use crate::xed::{self, LossyLines, XedBlocks, XedRecord, tables::EXTENSION_DIRS};

/// Main instruction table inside `datafiles/`.
pub const MAIN_ISA_FILE: &str = "xed-isa.txt";
/// Suffix of per-extension instruction tables.
pub const EXTENSION_FILE_SUFFIX: &str = ".xed.txt";
/// Version marker file name.
pub const VERSION_FILE: &str = "VERSION";

/// Imports `x86_32` and `x86_64` instructions from XED datafiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct XedImporter;

impl XedImporter {
    /// Creates the importer.
    pub const fn new() -> Self {
        Self
    }

    /// `source_dir/datafiles` when it exists, else `source_dir` itself.
    pub fn datafiles_dir(source_dir: &Path) -> PathBuf {
        let nested = source_dir.join("datafiles");
        if nested.is_dir() { nested } else { source_dir.to_path_buf() }
    }

    /// Instruction tables in import order: the main table, then each known extension
    /// directory's `*.xed.txt` files sorted by name.
    pub fn instruction_files(datafiles_dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let main = datafiles_dir.join(MAIN_ISA_FILE);
        if main.is_file() {
            files.push(main);
        }

        for dir in EXTENSION_DIRS {
            let Ok(entries) = fs::read_dir(datafiles_dir.join(dir)) else {
                continue;
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file()
                        && path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .is_some_and(|name| name.ends_with(EXTENSION_FILE_SUFFIX))
                })
                .collect();
            found.sort();
            files.extend(found);
        }
        files
    }
}

fn read_version(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let version = text.trim();
    (!version.is_empty()).then(|| version.to_owned())
}

fn convert(record: &XedRecord) -> Vec<SourceItem> {
    match xed::classify(record) {
        Ok(instructions) => instructions.into_iter().map(SourceItem::Record).collect(),
        Err(e) => vec![SourceItem::Rejected {
            reason: format!("{}: {e}", record.iclass()),
        }],
    }
}

/// Items of one instruction file.
///
/// After the last record comes a warning when some lines held invalid UTF-8, and an error when a
/// read failure cut the file short.
struct FileItems {
    path: PathBuf,
    blocks: XedBlocks<LossyLines<BufReader<File>>>,
    pending: VecDeque<SourceItem>,
    finished: bool,
}

impl FileItems {
    fn trailer(&self) -> Vec<SourceItem> {
        let lines = self.blocks.lines();
        let mut items = Vec::new();
        let replaced = lines.replaced_lines();
        if replaced > 0 {
            warn!(file = %self.path.display(), lines = replaced, "invalid UTF-8 replaced");
            items.push(SourceItem::Skipped {
                reason: format!("{}: {replaced} line(s) with invalid UTF-8", self.path.display()),
            });
        }
        if let Some(e) = lines.read_error() {
            warn!(file = %self.path.display(), error = %e, "instruction file read failed");
            items.push(SourceItem::Rejected {
                reason: format!("{}: {e}", self.path.display()),
            });
        }
        items
    }
}

impl Iterator for FileItems {
    type Item = SourceItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.blocks.next() {
                Some(record) => self.pending.extend(convert(&record)),
                None => {
                    self.finished = true;
                    let trailer = self.trailer();
                    self.pending.extend(trailer);
                }
            }
        }
    }
}

fn file_items(path: PathBuf) -> SourceItems {
    match xed::parse_file(&path) {
        Ok(blocks) => {
            info!(file = %path.display(), "processing instruction file");
            Box::new(FileItems {
                path,
                blocks,
                pending: VecDeque::new(),
                finished: false,
            })
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cannot open instruction file");
            Box::new(iter::once(SourceItem::Rejected {
                reason: format!("{}: {e}", path.display()),
            }))
        }
    }
}

impl Importer for XedImporter {
    fn isa_name(&self) -> &str {
        "x86_32,x86_64"
    }

    /// Reads `VERSION` from the source directory, then from its parent.
    fn source_version(&self, source_dir: &Path) -> Option<String> {
        read_version(&source_dir.join(VERSION_FILE)).or_else(|| {
            source_dir
                .parent()
                .and_then(|parent| read_version(&parent.join(VERSION_FILE)))
        })
    }

    fn records(&self, source_dir: &Path) -> Result<SourceItems> {
        let datafiles = Self::datafiles_dir(source_dir);
        let files = Self::instruction_files(&datafiles);
        debug!(count = files.len(), dir = %datafiles.display(), "instruction files found");
        if files.is_empty() {
            warn!(dir = %datafiles.display(), "no XED instruction files found");
        }
        Ok(Box::new(files.into_iter().flat_map(file_items)))
    }

    fn metadata(&self, source_dir: &Path) -> Result<ArchMetadata> {
        xed::metadata::build_metadata(&Self::datafiles_dir(source_dir))
    }
}
