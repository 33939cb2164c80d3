//! Instruction upserts, lookups, listing, and full-text search.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::{Page, PageRequest, SortOrder, Store, decode_json, decode_list, to_count, to_sql_int};
use crate::common::Result;
use crate::model::Instruction;

const COLUMNS: &str = "isa, mnemonic, variant, category, extension, isa_set, description, syntax, \
     operands_json, encoding_json, flags_affected_json, cpuid_features_json, attributes_json, \
     cpl, added_version, deprecated";

const UPSERT: &str = "
INSERT INTO instructions (
    isa, mnemonic, variant, variant_key, category, extension, isa_set, description, syntax,
    operands_json, encoding_json, flags_affected_json, cpuid_features_json, attributes_json,
    cpl, added_version, deprecated
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
ON CONFLICT(isa, mnemonic, variant_key) DO UPDATE SET
    variant = excluded.variant,
    category = excluded.category,
    extension = excluded.extension,
    isa_set = excluded.isa_set,
    description = excluded.description,
    syntax = excluded.syntax,
    operands_json = excluded.operands_json,
    encoding_json = excluded.encoding_json,
    flags_affected_json = excluded.flags_affected_json,
    cpuid_features_json = excluded.cpuid_features_json,
    attributes_json = excluded.attributes_json,
    cpl = excluded.cpl,
    added_version = excluded.added_version,
    deprecated = excluded.deprecated
RETURNING id";

const SEARCH_JOIN: &str = "instructions \
     JOIN (SELECT rowid AS rid, rank AS score FROM instruction_search \
           WHERE instruction_search MATCH ?1) s ON s.rid = instructions.id \
     WHERE (?2 IS NULL OR instructions.isa = ?2)";

fn instruction_from_row(row: &Row<'_>) -> rusqlite::Result<Instruction> {
    let operands: String = row.get(8)?;
    let encoding: Option<String> = row.get(9)?;
    let flags: String = row.get(10)?;
    let cpuid: String = row.get(11)?;
    let attributes: String = row.get(12)?;
    let cpl: Option<i64> = row.get(13)?;

    Ok(Instruction {
        isa: row.get(0)?,
        mnemonic: row.get(1)?,
        variant: row.get(2)?,
        category: row.get(3)?,
        extension: row.get(4)?,
        isa_set: row.get(5)?,
        description: row.get(6)?,
        syntax: row.get(7)?,
        operands: decode_json(&operands, 8)?,
        encoding: encoding.as_deref().map(|text| decode_json(text, 9)).transpose()?,
        flags_affected: decode_list(&flags),
        cpuid_features: decode_list(&cpuid),
        cpl: cpl.and_then(|value| u8::try_from(value).ok()),
        attributes: decode_list(&attributes),
        added_version: row.get(14)?,
        deprecated: row.get(15)?,
    })
}

/// Builds an FTS5 match expression: every whitespace term becomes a quoted phrase.
///
/// Terms without a single alphanumeric character cannot match any token and are dropped.
/// Returns `None` when nothing searchable remains.
pub fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

impl Store {
    /// Inserts or replaces an instruction by `(isa, mnemonic, variant)`.
    ///
    /// The row id survives replacement, and the search index is updated in the same transaction.
    ///
    /// # Returns
    ///
    /// The row id, or a validation error if a required field is empty.
    pub fn upsert_instruction(&mut self, instruction: &Instruction) -> Result<i64> {
        instruction.validate()?;
        let operands = serde_json::to_string(&instruction.operands)?;
        let encoding = instruction
            .encoding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let flags = serde_json::to_string(&instruction.flags_affected)?;
        let cpuid = serde_json::to_string(&instruction.cpuid_features)?;
        let attributes = serde_json::to_string(&instruction.attributes)?;

        let tx = self.conn.transaction()?;
        let id: i64 = tx.query_row(
            UPSERT,
            params![
                instruction.isa,
                instruction.mnemonic,
                instruction.variant,
                instruction.variant_key(),
                instruction.category,
                instruction.extension,
                instruction.isa_set,
                instruction.description,
                instruction.syntax,
                operands,
                encoding,
                flags,
                cpuid,
                attributes,
                instruction.cpl,
                instruction.added_version,
                instruction.deprecated,
            ],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Looks up one instruction by natural key; `variant = None` matches the null variant only.
    pub fn get_instruction(
        &self,
        isa: &str,
        mnemonic: &str,
        variant: Option<&str>,
    ) -> Result<Option<Instruction>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM instructions WHERE isa = ?1 AND mnemonic = ?2 AND variant_key = ?3"
        );
        Ok(self
            .conn
            .query_row(
                &sql,
                params![isa, mnemonic, variant.unwrap_or_default()],
                instruction_from_row,
            )
            .optional()?)
    }

    /// Deletes one instruction by natural key. The search index follows.
    ///
    /// # Returns
    ///
    /// `true` if a row was removed.
    pub fn delete_instruction(
        &mut self,
        isa: &str,
        mnemonic: &str,
        variant: Option<&str>,
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM instructions WHERE isa = ?1 AND mnemonic = ?2 AND variant_key = ?3",
            params![isa, mnemonic, variant.unwrap_or_default()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Lists one ISA's instructions in the requested order.
    pub fn list_instructions(
        &self,
        isa: &str,
        request: PageRequest,
        order: SortOrder,
    ) -> Result<Page<Instruction>> {
        let (page, size) = self.normalize(request);
        let total = self.instruction_count(Some(isa))?;

        let sql = format!(
            "SELECT {COLUMNS} FROM instructions WHERE isa = ?1 ORDER BY {} LIMIT ?2 OFFSET ?3",
            order.clause()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let offset = to_sql_int(Page::<Instruction>::offset(page, size));
        let items = stmt
            .query_map(params![isa, size, offset], instruction_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Page::new(items, total, page, size))
    }

    /// Ranked full-text search over isa, mnemonic, description, category, and extension.
    ///
    /// A blank query lists `isa` by mnemonic, or returns an empty page when no ISA is given.
    /// The default page size for search is the configured search limit.
    pub fn search(
        &self,
        query: &str,
        isa: Option<&str>,
        request: PageRequest,
    ) -> Result<Page<Instruction>> {
        let request = PageRequest {
            page_size: request.page_size.or(Some(self.query.search_limit)),
            ..request
        };
        if query.trim().is_empty() {
            return match isa {
                Some(isa) => self.list_instructions(isa, request, SortOrder::default()),
                None => {
                    let (page, size) = self.normalize(request);
                    Ok(Page::empty(page, size))
                }
            };
        }

        let (page, size) = self.normalize(request);
        let Some(expression) = match_expression(query) else {
            return Ok(Page::empty(page, size));
        };
        debug!(%expression, ?isa, page, size, "full-text search");

        let total = self.count_matches(&expression, isa)?;
        let sql = format!(
            "SELECT {COLUMNS} FROM {SEARCH_JOIN} \
             ORDER BY s.score, instructions.mnemonic, instructions.id LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let offset = to_sql_int(Page::<Instruction>::offset(page, size));
        let items = stmt
            .query_map(params![expression, isa, size, offset], instruction_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Page::new(items, total, page, size))
    }

    /// Number of rows [`Store::search`] would page over for the same arguments.
    pub fn search_count(&self, query: &str, isa: Option<&str>) -> Result<u64> {
        if query.trim().is_empty() {
            return match isa {
                Some(isa) => self.instruction_count(Some(isa)),
                None => Ok(0),
            };
        }
        match match_expression(query) {
            Some(expression) => self.count_matches(&expression, isa),
            None => Ok(0),
        }
    }

    fn count_matches(&self, expression: &str, isa: Option<&str>) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {SEARCH_JOIN}");
        let count: i64 = self
            .conn
            .query_row(&sql, params![expression, isa], |row| row.get(0))?;
        Ok(to_count(count))
    }

    /// Distinct ISA keys present, sorted.
    pub fn supported_isas(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT isa FROM instructions ORDER BY isa")?;
        let isas = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(isas)
    }

    /// Instruction count for one ISA, or for the whole catalog.
    pub fn instruction_count(&self, isa: Option<&str>) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM instructions WHERE ?1 IS NULL OR isa = ?1",
            params![isa],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    /// Groups one ISA's mnemonics by lower-cased category.
    ///
    /// Each group is sorted and holds each mnemonic once, however many variants it has.
    pub fn instruction_groups(&self, isa: &str) -> Result<BTreeMap<String, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, mnemonic FROM instructions WHERE isa = ?1")?;
        let rows = stmt.query_map(params![isa], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rows {
            let (category, mnemonic) = row?;
            let _ = groups
                .entry(category.to_lowercase())
                .or_default()
                .insert(mnemonic);
        }
        Ok(groups
            .into_iter()
            .map(|(category, mnemonics)| (category, mnemonics.into_iter().collect()))
            .collect())
    }
}
