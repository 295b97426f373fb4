//! Table namespace: declared name → canonical identifier.

use shipdsl_ir::canonical_id;

use crate::lexer;

/// One `table` statement, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// 1-based declaration order.
    pub seq: usize,
    pub name: String,
    pub id: String,
    pub line: usize,
}

/// Immutable symbol table built in a single scan over the source.
///
/// The Nth `table` statement always receives sequence N. A name declared
/// twice keeps both entries (the validator reports it) but lookups resolve
/// to the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMap {
    entries: Vec<MapEntry>,
}

impl ModelMap {
    pub fn build(source: &str) -> Self {
        let mut entries = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if lexer::is_blank_or_comment(line) {
                continue;
            }
            if let Some(name) = lexer::table_header(&lexer::tokenize(line)) {
                let seq = entries.len() + 1;
                entries.push(MapEntry {
                    seq,
                    name: name.to_string(),
                    id: canonical_id(seq, name),
                    line: idx + 1,
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical id for a declared name. Exact matches win; otherwise the
    /// first case-insensitive match is used.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
            .map(|e| e.id.as_str())
    }

    /// Canonical id for a storage name (`s012_port`).
    pub fn by_table(&self, table: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(table))
            .map(|e| e.id.as_str())
    }
}
