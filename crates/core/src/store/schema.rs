//! Catalog schema.
//!
//! `instruction_search` is an external-content FTS5 table over `instructions`. The three triggers
//! keep it in step with every insert, update, and delete inside the writing statement's own
//! transaction.
//!
//! `variant_key` is `variant` with `NULL` stored as `''`, so the unique index treats a missing
//! variant as one distinct value.

use rusqlite::Connection;

use crate::common::Result;

/// Schema version stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS instructions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    isa TEXT NOT NULL,
    mnemonic TEXT NOT NULL,
    variant TEXT,
    variant_key TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    extension TEXT NOT NULL,
    isa_set TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    syntax TEXT NOT NULL DEFAULT '',
    operands_json TEXT NOT NULL DEFAULT '[]',
    encoding_json TEXT,
    flags_affected_json TEXT NOT NULL DEFAULT '[]',
    cpuid_features_json TEXT NOT NULL DEFAULT '[]',
    attributes_json TEXT NOT NULL DEFAULT '[]',
    cpl INTEGER,
    added_version TEXT,
    deprecated INTEGER NOT NULL DEFAULT 0,
    UNIQUE(isa, mnemonic, variant_key)
);

CREATE INDEX IF NOT EXISTS idx_instructions_isa ON instructions(isa);
CREATE INDEX IF NOT EXISTS idx_instructions_mnemonic ON instructions(mnemonic);
CREATE INDEX IF NOT EXISTS idx_instructions_category ON instructions(isa, category);
CREATE INDEX IF NOT EXISTS idx_instructions_extension ON instructions(isa, extension);

CREATE VIRTUAL TABLE IF NOT EXISTS instruction_search USING fts5(
    isa,
    mnemonic,
    description,
    category,
    extension,
    content='instructions',
    content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS instructions_ai AFTER INSERT ON instructions BEGIN
    INSERT INTO instruction_search(rowid, isa, mnemonic, description, category, extension)
    VALUES (new.id, new.isa, new.mnemonic, new.description, new.category, new.extension);
END;

CREATE TRIGGER IF NOT EXISTS instructions_ad AFTER DELETE ON instructions BEGIN
    INSERT INTO instruction_search(instruction_search, rowid, isa, mnemonic, description, category, extension)
    VALUES ('delete', old.id, old.isa, old.mnemonic, old.description, old.category, old.extension);
END;

CREATE TRIGGER IF NOT EXISTS instructions_au AFTER UPDATE ON instructions BEGIN
    INSERT INTO instruction_search(instruction_search, rowid, isa, mnemonic, description, category, extension)
    VALUES ('delete', old.id, old.isa, old.mnemonic, old.description, old.category, old.extension);
    INSERT INTO instruction_search(rowid, isa, mnemonic, description, category, extension)
    VALUES (new.id, new.isa, new.mnemonic, new.description, new.category, new.extension);
END;

CREATE TABLE IF NOT EXISTS import_metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    isa TEXT NOT NULL,
    source_path TEXT NOT NULL,
    import_date TEXT NOT NULL,
    instruction_count INTEGER NOT NULL DEFAULT 0,
    source_version TEXT,
    importer_version TEXT NOT NULL,
    import_duration_seconds REAL NOT NULL DEFAULT 0,
    success INTEGER NOT NULL,
    error_message TEXT
);

CREATE TABLE IF NOT EXISTS architectures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    isa_name TEXT NOT NULL UNIQUE,
    word_size INTEGER NOT NULL,
    endianness TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    machine_mode TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS architecture_registers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    architecture_id INTEGER NOT NULL REFERENCES architectures(id),
    register_name TEXT NOT NULL,
    register_class TEXT NOT NULL,
    width_bits INTEGER NOT NULL,
    encoding_id INTEGER,
    is_main_register INTEGER NOT NULL DEFAULT 0,
    parent_register_id INTEGER REFERENCES architecture_registers(id),
    aliases_json TEXT NOT NULL DEFAULT '[]',
    calling_convention_preserved INTEGER,
    register_purpose TEXT,
    UNIQUE(architecture_id, register_name)
);

CREATE INDEX IF NOT EXISTS idx_registers_arch ON architecture_registers(architecture_id);
CREATE INDEX IF NOT EXISTS idx_registers_parent ON architecture_registers(parent_register_id);
CREATE INDEX IF NOT EXISTS idx_registers_purpose ON architecture_registers(register_purpose);

CREATE TABLE IF NOT EXISTS architecture_addressing_modes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    architecture_id INTEGER NOT NULL REFERENCES architectures(id),
    mode_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    example_syntax TEXT NOT NULL DEFAULT '',
    UNIQUE(architecture_id, mode_name)
);
";

/// Creates all tables, indexes, and triggers if missing.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}
