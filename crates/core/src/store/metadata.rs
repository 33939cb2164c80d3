//! Architecture, register, and addressing-mode persistence.
//!
//! Metadata bundles arrive with arena indices; [`Store::persist_metadata`] rewrites them to row
//! ids. Register families are stored as `parent_register_id` links and resolved back into a
//! family with a bounded walk plus a recursive query.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::{debug, warn};

use super::{Store, decode_list};
use crate::abi::{self, Preservation};
use crate::common::Result;
use crate::model::{
    AddressingMode, AddressingModeRecord, ArchMetadata, Architecture, ArchitectureRecord,
    Endianness, Register, RegisterIndex, RegisterRecord,
};

/// Longest parent chain followed before giving up on a malformed forest.
const MAX_FAMILY_DEPTH: usize = 16;

const REGISTER_COLUMNS: &str = "r.id, r.architecture_id, r.register_name, r.register_class, \
     r.width_bits, r.encoding_id, r.is_main_register, r.parent_register_id, r.aliases_json, \
     r.calling_convention_preserved, r.register_purpose";

/// Rows written by one [`Store::persist_metadata`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetadataCounts {
    /// Architectures upserted.
    pub architectures: usize,
    /// Registers upserted.
    pub registers: usize,
    /// Addressing modes upserted.
    pub addressing_modes: usize,
}

/// A register row enriched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterView {
    /// Stored register row.
    #[serde(flatten)]
    pub register: RegisterRecord,
    /// User-facing register type.
    pub register_type: &'static str,
    /// Calling-convention classification, override applied.
    pub preservation: Preservation,
    /// Name of the family root, for sub-registers.
    pub parent_name: Option<String>,
}

fn architecture_from_row(row: &Row<'_>) -> rusqlite::Result<ArchitectureRecord> {
    let endianness: String = row.get(3)?;
    Ok(ArchitectureRecord {
        id: row.get(0)?,
        architecture: Architecture {
            isa_name: row.get(1)?,
            word_size: row.get(2)?,
            endianness: Endianness::parse(&endianness),
            description: row.get(4)?,
            machine_mode: row.get(5)?,
        },
    })
}

fn register_from_row(row: &Row<'_>) -> rusqlite::Result<RegisterRecord> {
    let aliases: String = row.get(8)?;
    Ok(RegisterRecord {
        id: row.get(0)?,
        architecture_id: row.get(1)?,
        register_name: row.get(2)?,
        register_class: row.get(3)?,
        width_bits: row.get(4)?,
        encoding_id: row.get(5)?,
        is_main_register: row.get(6)?,
        parent_register_id: row.get(7)?,
        aliases: decode_list(&aliases),
        calling_convention_preserved: row.get(9)?,
        register_purpose: row.get(10)?,
    })
}

fn addressing_mode_from_row(row: &Row<'_>) -> rusqlite::Result<AddressingModeRecord> {
    Ok(AddressingModeRecord {
        id: row.get(0)?,
        architecture_id: row.get(1)?,
        mode_name: row.get(2)?,
        description: row.get(3)?,
        example_syntax: row.get(4)?,
    })
}

fn write_architecture(conn: &Connection, architecture: &Architecture) -> Result<i64> {
    Ok(conn.query_row(
        "INSERT INTO architectures (isa_name, word_size, endianness, description, machine_mode)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(isa_name) DO UPDATE SET
             word_size = excluded.word_size,
             endianness = excluded.endianness,
             description = excluded.description,
             machine_mode = excluded.machine_mode
         RETURNING id",
        params![
            architecture.isa_name,
            architecture.word_size,
            architecture.endianness.as_str(),
            architecture.description,
            architecture.machine_mode,
        ],
        |row| row.get(0),
    )?)
}

fn write_register(
    conn: &Connection,
    architecture_id: i64,
    register: &Register,
    parent_register_id: Option<i64>,
) -> Result<i64> {
    let aliases = serde_json::to_string(&register.aliases)?;
    Ok(conn.query_row(
        "INSERT INTO architecture_registers (
             architecture_id, register_name, register_class, width_bits, encoding_id,
             is_main_register, parent_register_id, aliases_json, calling_convention_preserved,
             register_purpose
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(architecture_id, register_name) DO UPDATE SET
             register_class = excluded.register_class,
             width_bits = excluded.width_bits,
             encoding_id = excluded.encoding_id,
             is_main_register = excluded.is_main_register,
             parent_register_id = excluded.parent_register_id,
             aliases_json = excluded.aliases_json,
             calling_convention_preserved = excluded.calling_convention_preserved,
             register_purpose = excluded.register_purpose
         RETURNING id",
        params![
            architecture_id,
            register.register_name,
            register.register_class,
            register.width_bits,
            register.encoding_id,
            register.is_main_register,
            parent_register_id,
            aliases,
            register.calling_convention_preserved,
            register.register_purpose,
        ],
        |row| row.get(0),
    )?)
}

fn write_addressing_mode(
    conn: &Connection,
    architecture_id: i64,
    mode: &AddressingMode,
) -> Result<i64> {
    Ok(conn.query_row(
        "INSERT INTO architecture_addressing_modes (architecture_id, mode_name, description, example_syntax)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(architecture_id, mode_name) DO UPDATE SET
             description = excluded.description,
             example_syntax = excluded.example_syntax
         RETURNING id",
        params![architecture_id, mode.mode_name, mode.description, mode.example_syntax],
        |row| row.get(0),
    )?)
}

/// Number of parent links above `index`, bounded by [`MAX_FAMILY_DEPTH`].
fn depth(metadata: &ArchMetadata, index: RegisterIndex) -> usize {
    let mut current = index;
    let mut depth = 0;
    while depth < MAX_FAMILY_DEPTH {
        match metadata.registers.get(current.0).and_then(|r| r.parent) {
            Some(parent) => {
                current = parent;
                depth += 1;
            }
            None => break,
        }
    }
    depth
}

impl Store {
    /// Inserts or replaces an architecture by `isa_name`.
    pub fn upsert_architecture(&mut self, architecture: &Architecture) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = write_architecture(&tx, architecture)?;
        tx.commit()?;
        Ok(id)
    }

    /// Inserts or replaces a register by `(architecture_id, register_name)`.
    ///
    /// The register's arena fields (`architecture`, `parent`) are ignored; the row ids passed
    /// here are stored instead.
    pub fn upsert_register(
        &mut self,
        architecture_id: i64,
        register: &Register,
        parent_register_id: Option<i64>,
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = write_register(&tx, architecture_id, register, parent_register_id)?;
        tx.commit()?;
        Ok(id)
    }

    /// Inserts or replaces an addressing mode by `(architecture_id, mode_name)`.
    pub fn upsert_addressing_mode(
        &mut self,
        architecture_id: i64,
        mode: &AddressingMode,
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = write_addressing_mode(&tx, architecture_id, mode)?;
        tx.commit()?;
        Ok(id)
    }

    /// Writes a whole metadata bundle in one transaction.
    ///
    /// Architectures go first, then registers ordered so that every parent precedes its
    /// children, then addressing modes. Records whose placeholders do not resolve are skipped
    /// with a warning.
    pub fn persist_metadata(&mut self, metadata: &ArchMetadata) -> Result<MetadataCounts> {
        let tx = self.conn.transaction()?;
        let mut counts = MetadataCounts::default();

        let mut arch_ids = Vec::with_capacity(metadata.architectures.len());
        for architecture in &metadata.architectures {
            arch_ids.push(write_architecture(&tx, architecture)?);
            counts.architectures += 1;
        }

        let mut order: Vec<RegisterIndex> =
            (0..metadata.registers.len()).map(RegisterIndex).collect();
        order.sort_by_key(|&index| depth(metadata, index));

        let mut register_ids: Vec<Option<i64>> = vec![None; metadata.registers.len()];
        for index in order {
            let register = &metadata.registers[index.0];
            let Some(&arch_id) = arch_ids.get(register.architecture.0) else {
                warn!(register = %register.register_name, "register references unknown architecture");
                continue;
            };
            let parent_id = register
                .parent
                .and_then(|parent| register_ids.get(parent.0).copied().flatten());
            if register.parent.is_some() && parent_id.is_none() {
                warn!(register = %register.register_name, "parent register unresolved; storing as root");
            }
            register_ids[index.0] = Some(write_register(&tx, arch_id, register, parent_id)?);
            counts.registers += 1;
        }

        for mode in &metadata.addressing_modes {
            let Some(&arch_id) = arch_ids.get(mode.architecture.0) else {
                warn!(mode = %mode.mode_name, "addressing mode references unknown architecture");
                continue;
            };
            let _ = write_addressing_mode(&tx, arch_id, mode)?;
            counts.addressing_modes += 1;
        }

        tx.commit()?;
        debug!(?counts, "persisted architecture metadata");
        Ok(counts)
    }

    /// Looks up an architecture by key.
    pub fn get_architecture(&self, isa_name: &str) -> Result<Option<ArchitectureRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, isa_name, word_size, endianness, description, machine_mode
                 FROM architectures WHERE isa_name = ?1",
                params![isa_name],
                architecture_from_row,
            )
            .optional()?)
    }

    /// All architectures, ordered by key.
    pub fn list_architectures(&self) -> Result<Vec<ArchitectureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, isa_name, word_size, endianness, description, machine_mode
             FROM architectures ORDER BY isa_name",
        )?;
        let rows = stmt
            .query_map([], architecture_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Registers of one architecture, ordered by class and then name.
    pub fn architecture_registers(&self, isa_name: &str) -> Result<Vec<RegisterRecord>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM architecture_registers r
             JOIN architectures a ON a.id = r.architecture_id
             WHERE a.isa_name = ?1
             ORDER BY r.register_class, r.register_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![isa_name], register_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Addressing modes of one architecture, ordered by name.
    pub fn addressing_modes(&self, isa_name: &str) -> Result<Vec<AddressingModeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.architecture_id, m.mode_name, m.description, m.example_syntax
             FROM architecture_addressing_modes m
             JOIN architectures a ON a.id = m.architecture_id
             WHERE a.isa_name = ?1
             ORDER BY m.mode_name",
        )?;
        let rows = stmt
            .query_map(params![isa_name], addressing_mode_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Looks up a register by architecture and case-insensitive name.
    pub fn register(&self, isa_name: &str, register_name: &str) -> Result<Option<RegisterRecord>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM architecture_registers r
             JOIN architectures a ON a.id = r.architecture_id
             WHERE a.isa_name = ?1 AND r.register_name = ?2 COLLATE NOCASE"
        );
        Ok(self
            .conn
            .query_row(&sql, params![isa_name, register_name], register_from_row)
            .optional()?)
    }

    /// Looks up a register by row id.
    pub fn register_by_id(&self, register_id: i64) -> Result<Option<RegisterRecord>> {
        let sql = format!("SELECT {REGISTER_COLUMNS} FROM architecture_registers r WHERE r.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![register_id], register_from_row)
            .optional()?)
    }

    /// Resolves the family a register belongs to.
    ///
    /// Walks parent links to the root (at most [`MAX_FAMILY_DEPTH`] steps), then returns the root
    /// and all its descendants, widest first. An unknown id yields an empty family.
    pub fn register_family(&self, register_id: i64) -> Result<Vec<RegisterRecord>> {
        let mut root = register_id;
        for _ in 0..MAX_FAMILY_DEPTH {
            let parent: Option<Option<i64>> = self
                .conn
                .query_row(
                    "SELECT parent_register_id FROM architecture_registers WHERE id = ?1",
                    params![root],
                    |row| row.get(0),
                )
                .optional()?;
            match parent {
                None => return Ok(Vec::new()),
                Some(Some(parent)) if parent != root => root = parent,
                Some(_) => break,
            }
        }

        let sql = format!(
            "WITH RECURSIVE family(id) AS (
                 SELECT ?1
                 UNION
                 SELECT c.id FROM architecture_registers c JOIN family f ON c.parent_register_id = f.id
             )
             SELECT {REGISTER_COLUMNS} FROM architecture_registers r
             WHERE r.id IN (SELECT id FROM family)
             ORDER BY r.width_bits DESC, r.register_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![root], register_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Registers of one architecture with calling convention, type, and parent name resolved.
    pub fn register_views(&self, isa_name: &str) -> Result<Vec<RegisterView>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS}, p.register_name FROM architecture_registers r
             JOIN architectures a ON a.id = r.architecture_id
             LEFT JOIN architecture_registers p ON p.id = r.parent_register_id
             WHERE a.isa_name = ?1
             ORDER BY r.register_class, r.register_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![isa_name], |row| {
                Ok((register_from_row(row)?, row.get::<_, Option<String>>(11)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|(register, parent_name)| RegisterView {
                register_type: abi::register_type(&register.register_class),
                preservation: abi::preservation(
                    isa_name,
                    &register.register_name,
                    register.calling_convention_preserved,
                ),
                parent_name,
                register,
            })
            .collect())
    }
}
