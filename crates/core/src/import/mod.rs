//! Import drivers.
//!
//! An [`Importer`] turns one vendor source directory into a lazy stream of [`SourceItem`]s and
//! an [`ArchMetadata`] bundle. [`import_from_source`] drains that stream into a
//! [`CatalogSink`] (normally the [`Store`]) and handles the run bookkeeping:
//! 1. **Validation:** Records missing a required field are counted as errors and skipped.
//! 2. **Persistence:** Failed upserts are counted as errors; the run continues.
//! 3. **Progress:** A log line every `progress_interval` records.
//! 4. **Metadata:** Architecture, register, and addressing-mode rows unless `skip_metadata` is set.
//! 5. **Audit:** Exactly one import-run row per attempt, including fatal failures.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::common::{IsaError, Result};
use crate::config::ImportConfig;
use crate::model::{ArchMetadata, ImportRun, Instruction};
use crate::stats::ImportStats;
use crate::store::{MetadataCounts, Store};

/// ARM `Instructions.json` importer.
pub mod arm;
/// XED datafiles importer.
pub mod xed;

pub use arm::ArmImporter;
pub use xed::XedImporter;

/// Version reported by the built-in importers.
pub const IMPORTER_VERSION: &str = "1.0.0";

/// One item pulled from an importer's record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// A converted record ready to persist.
    Record(Instruction),
    /// A source record that failed conversion; counted as an error.
    Rejected {
        /// Failure description.
        reason: String,
    },
    /// A node or file passed over without conversion; counted as a warning.
    Skipped {
        /// Why it was passed over.
        reason: String,
    },
}

/// Lazy record stream produced by an importer.
pub type SourceItems = Box<dyn Iterator<Item = SourceItem>>;

/// An opened source: its vendor version and its record stream.
pub struct OpenedSource {
    /// Vendor data version, when known.
    pub source_version: Option<String>,
    /// Items still to be pulled.
    pub items: SourceItems,
}

impl fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedSource")
            .field("source_version", &self.source_version)
            .finish_non_exhaustive()
    }
}

/// A vendor-format importer.
pub trait Importer {
    /// ISA name recorded in the audit log (may cover several architectures).
    fn isa_name(&self) -> &str;

    /// Importer code version.
    fn importer_version(&self) -> &str {
        IMPORTER_VERSION
    }

    /// Vendor data version found in the source directory, if any.
    fn source_version(&self, source_dir: &Path) -> Option<String>;

    /// Opens the record stream. Errors here abort the run.
    fn records(&self, source_dir: &Path) -> Result<SourceItems>;

    /// Version and record stream together, as the import driver consumes them.
    ///
    /// Importers that find the version while loading the records override this to read the
    /// source once.
    fn open_source(&self, source_dir: &Path) -> Result<OpenedSource> {
        let source_version = self.source_version(source_dir);
        Ok(OpenedSource {
            source_version,
            items: self.records(source_dir)?,
        })
    }

    /// Builds the architecture metadata bundle for this source.
    fn metadata(&self, source_dir: &Path) -> Result<ArchMetadata>;
}

/// Destination of an import run.
pub trait CatalogSink {
    /// Inserts or replaces one instruction by natural key.
    fn upsert_instruction(&mut self, instruction: &Instruction) -> Result<i64>;

    /// Writes an architecture metadata bundle.
    fn persist_metadata(&mut self, metadata: &ArchMetadata) -> Result<MetadataCounts>;

    /// Appends the audit row for a run.
    fn record_import_run(&mut self, run: &ImportRun) -> Result<i64>;
}

impl CatalogSink for Store {
    fn upsert_instruction(&mut self, instruction: &Instruction) -> Result<i64> {
        Self::upsert_instruction(self, instruction)
    }

    fn persist_metadata(&mut self, metadata: &ArchMetadata) -> Result<MetadataCounts> {
        Self::persist_metadata(self, metadata)
    }

    fn record_import_run(&mut self, run: &ImportRun) -> Result<i64> {
        Self::record_import_run(self, run)
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Importer ISA name.
    pub isa: String,
    /// Whether the run completed.
    pub success: bool,
    /// Wall-clock duration.
    pub duration_seconds: f64,
    /// Record counters.
    #[serde(rename = "counts")]
    pub stats: ImportStats,
    /// Vendor data version, when known.
    pub source_version: Option<String>,
    /// Fatal error message for failed runs.
    pub error: Option<String>,
    /// Whether architecture metadata was written.
    pub metadata_imported: bool,
    /// Metadata rows written, when imported.
    pub metadata: Option<MetadataCounts>,
}

struct RunContext<'a> {
    isa: &'a str,
    importer_version: &'a str,
    source_dir: &'a Path,
    started: Instant,
}

impl RunContext<'_> {
    fn audit_row(
        &self,
        stats: &ImportStats,
        source_version: Option<String>,
        error: Option<&IsaError>,
    ) -> ImportRun {
        ImportRun {
            id: None,
            isa: self.isa.to_owned(),
            source_path: self.source_dir.display().to_string(),
            timestamp: Utc::now(),
            instruction_count: stats.instructions_inserted,
            source_version,
            importer_version: self.importer_version.to_owned(),
            duration_seconds: self.started.elapsed().as_secs_f64(),
            success: error.is_none(),
            error_message: error.map(ToString::to_string),
        }
    }

    /// Writes the failed audit row and hands the fatal error back.
    fn abort<S: CatalogSink + ?Sized>(
        &self,
        sink: &mut S,
        stats: &ImportStats,
        fatal: IsaError,
    ) -> Result<ImportSummary> {
        error!(error = %fatal, "import aborted");
        let _ = sink.record_import_run(&self.audit_row(stats, None, Some(&fatal)))?;
        Err(fatal)
    }
}

/// Runs one importer against one source directory.
///
/// # Arguments
///
/// * `importer` - Format-specific importer.
/// * `sink` - Destination for records, metadata, and the audit row.
/// * `source_dir` - Vendor source directory.
/// * `config` - Progress interval and metadata switch.
///
/// # Returns
///
/// A summary for completed runs, even when individual records failed. A missing source
/// directory or an unopenable record stream returns the error after writing a failed audit row.
/// A failure while writing the audit row itself is propagated.
pub fn import_from_source<I, S>(
    importer: &I,
    sink: &mut S,
    source_dir: &Path,
    config: &ImportConfig,
) -> Result<ImportSummary>
where
    I: Importer + ?Sized,
    S: CatalogSink + ?Sized,
{
    let span = info_span!("import", isa = importer.isa_name());
    let _guard = span.enter();
    let ctx = RunContext {
        isa: importer.isa_name(),
        importer_version: importer.importer_version(),
        source_dir,
        started: Instant::now(),
    };
    let mut stats = ImportStats::new();

    if !source_dir.is_dir() {
        return ctx.abort(sink, &stats, IsaError::SourceNotFound(source_dir.to_path_buf()));
    }
    info!(source = %source_dir.display(), "starting import");

    let OpenedSource {
        source_version,
        items: records,
    } = match importer.open_source(source_dir) {
        Ok(opened) => opened,
        Err(fatal) => return ctx.abort(sink, &stats, fatal),
    };

    for item in records {
        match item {
            SourceItem::Record(instruction) => {
                stats.instructions_processed += 1;
                persist_record(sink, &instruction, &mut stats);
                if config.progress_interval > 0
                    && stats.instructions_processed % config.progress_interval == 0
                {
                    info!(
                        processed = stats.instructions_processed,
                        inserted = stats.instructions_inserted,
                        errors = stats.errors,
                        "import progress"
                    );
                }
            }
            SourceItem::Rejected { reason } => {
                stats.errors += 1;
                warn!(%reason, "record rejected");
            }
            SourceItem::Skipped { reason } => {
                stats.warnings += 1;
                debug!(%reason, "source item skipped");
            }
        }
    }

    let metadata = if config.skip_metadata {
        None
    } else {
        import_metadata(importer, sink, source_dir, &mut stats)
    };

    let run = ctx.audit_row(&stats, source_version.clone(), None);
    let _ = sink.record_import_run(&run)?;
    info!(
        inserted = stats.instructions_inserted,
        duration = run.duration_seconds,
        summary = %stats.summary(),
        "import completed"
    );

    Ok(ImportSummary {
        isa: run.isa,
        success: true,
        duration_seconds: run.duration_seconds,
        stats,
        source_version,
        error: None,
        metadata_imported: metadata.is_some(),
        metadata,
    })
}

fn persist_record<S: CatalogSink + ?Sized>(
    sink: &mut S,
    instruction: &Instruction,
    stats: &mut ImportStats,
) {
    if let Err(e) = instruction.validate() {
        stats.errors += 1;
        warn!(error = %e, "record failed validation");
        return;
    }
    match sink.upsert_instruction(instruction) {
        Ok(_) => stats.instructions_inserted += 1,
        Err(e) => {
            stats.errors += 1;
            error!(
                isa = %instruction.isa,
                mnemonic = %instruction.mnemonic,
                error = %e,
                "failed to persist record"
            );
        }
    }
}

fn import_metadata<I, S>(
    importer: &I,
    sink: &mut S,
    source_dir: &Path,
    stats: &mut ImportStats,
) -> Option<MetadataCounts>
where
    I: Importer + ?Sized,
    S: CatalogSink + ?Sized,
{
    let result = importer
        .metadata(source_dir)
        .and_then(|metadata| sink.persist_metadata(&metadata));
    match result {
        Ok(counts) => {
            info!(
                architectures = counts.architectures,
                registers = counts.registers,
                addressing_modes = counts.addressing_modes,
                "architecture metadata imported"
            );
            Some(counts)
        }
        Err(e) => {
            stats.errors += 1;
            error!(error = %e, "architecture metadata import failed");
            None
        }
    }
}
