//! Importer for ARM's machine-readable AArch64 release.

use std::fs::File;
use std::io::BufReader;
use std::iter;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{Importer, OpenedSource, SourceItem, SourceItems};
use crate::arm::{self, ArmWalker, INSTRUCTIONS_FILE, walker};
use crate::common::Result;
use crate::model::{ArchMetadata, ISA_AARCH64};

/// Only the version block of the document, for standalone version lookups.
#[derive(Deserialize)]
struct DocumentHeader {
    #[serde(rename = "_meta", default)]
    meta: Option<Value>,
}

/// Imports AArch64 instructions from `Instructions.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArmImporter;

impl ArmImporter {
    /// Creates the importer.
    pub const fn new() -> Self {
        Self
    }

    /// Location of the instruction document inside a source directory.
    pub fn instructions_path(source_dir: &Path) -> PathBuf {
        source_dir.join(INSTRUCTIONS_FILE)
    }
}

impl Importer for ArmImporter {
    fn isa_name(&self) -> &str {
        ISA_AARCH64
    }

    fn source_version(&self, source_dir: &Path) -> Option<String> {
        let file = File::open(Self::instructions_path(source_dir)).ok()?;
        let header: DocumentHeader = serde_json::from_reader(BufReader::new(file)).ok()?;
        let mut document = Map::new();
        let _ = document.insert("_meta".to_owned(), header.meta?);
        walker::source_version(&Value::Object(document))
    }

    fn records(&self, source_dir: &Path) -> Result<SourceItems> {
        Ok(self.open_source(source_dir)?.items)
    }

    /// Loads the document once, reads `_meta` from it, then walks it. A missing document yields
    /// one warning item; an undecodable one yields one rejected item.
    fn open_source(&self, source_dir: &Path) -> Result<OpenedSource> {
        let path = Self::instructions_path(source_dir);
        if !path.is_file() {
            warn!(file = %path.display(), "instruction document not found");
            return Ok(OpenedSource {
                source_version: None,
                items: Box::new(iter::once(SourceItem::Skipped {
                    reason: format!("{} not found", path.display()),
                })),
            });
        }

        let document = match arm::load_document(&path) {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cannot decode instruction document");
                return Ok(OpenedSource {
                    source_version: None,
                    items: Box::new(iter::once(SourceItem::Rejected {
                        reason: format!("{}: {e}", path.display()),
                    })),
                });
            }
        };
        info!(file = %path.display(), "processing instruction document");

        let source_version = walker::source_version(&document);
        let items = ArmWalker::from_document(document).map(|item| match item {
            Ok(instruction) => SourceItem::Record(instruction),
            Err(skipped) => SourceItem::Skipped {
                reason: format!("{}: {}", skipped.name, skipped.reason),
            },
        });
        Ok(OpenedSource {
            source_version,
            items: Box::new(items),
        })
    }

    fn metadata(&self, _source_dir: &Path) -> Result<ArchMetadata> {
        Ok(arm::metadata::build_metadata())
    }
}
