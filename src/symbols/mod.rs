//! # symbol - Interned, Unicode symbolic atoms (aka identifiers)
//!
//! Ion symbols may have text that is unknown. That is, there is no binding to a (potentially
//! empty) sequence of text. This can happen as a result of not having access to a shared symbol
//! table being imported, or having a symbol table (shared or local) that contains a null slot.
//!
//! A processor encountering a symbol with unknown text and a valid SID other than $0 MAY produce
//! an error because this means that the context of the data is missing. Here that error is only
//! raised when the text is actually requested.

pub mod catalog;
pub(crate) mod local;
pub mod stream;

use crate::error::SymbolError;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const ION_SYMBOL_ID: usize = 1;
pub const ION_1_0_SYMBOL_ID: usize = 2;
pub const ION_SYMBOL_TABLE_SYMBOL_ID: usize = 3;
pub const NAME_SYMBOL_ID: usize = 4;
pub const VERSION_SYMBOL_ID: usize = 5;
pub const IMPORTS_SYMBOL_ID: usize = 6;
pub const SYMBOLS_SYMBOL_ID: usize = 7;
pub const MAX_ID_SYMBOL_ID: usize = 8;
pub const ION_SHARED_SYMBOL_TABLE_SYMBOL_ID: usize = 9;

pub const SYSTEM_SYMBOL_TEXT: [&str; 9] = [
    "$ion",
    "$ion_1_0",
    "$ion_symbol_table",
    "name",
    "version",
    "imports",
    "symbols",
    "max_id",
    "$ion_shared_symbol_table",
];

pub(crate) static SYSTEM_SYMBOL_IDS: phf::Map<&'static str, usize> = phf_map! {
    "$ion" => 1,
    "$ion_1_0" => 2,
    "$ion_symbol_table" => 3,
    "name" => 4,
    "version" => 5,
    "imports" => 6,
    "symbols" => 7,
    "max_id" => 8,
    "$ion_shared_symbol_table" => 9,
};

lazy_static! {
    /// The `$ion` version 1 system symbol table, implicitly the first import of every local table.
    pub static ref SYSTEM_SYMBOL_TABLE_V1: Arc<SymbolTable> = Arc::new(SymbolTable::system());
}

/// ## SymbolToken
///
/// A (text, symbol id) pair. Tokens produced by readers carry the local id they were read with
/// and, when the active table knows it, the text. Tokens handed to writers usually carry only
/// text.
///
/// ### SymbolToken equivalence
///
/// SymbolTokens with the same text are equivalent and the id is ignored. When either side has
/// undefined text the ids are compared, so the special symbol zero (`$0`) is equivalent only to
/// other tokens representing symbol zero.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct SymbolToken {
    text: Option<String>,
    local_sid: Option<usize>,
}

impl SymbolToken {
    pub fn new(text: Option<String>, local_sid: Option<usize>) -> Self {
        SymbolToken { text, local_sid }
    }

    /// Special symbol zero, unknown text in any symbol table.
    pub fn zero() -> Self {
        SymbolToken {
            text: None,
            local_sid: Some(0),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn local_sid(&self) -> Option<usize> {
        self.local_sid
    }

    pub fn is_zero(&self) -> bool {
        self.text.is_none() && self.local_sid == Some(0)
    }

    /// The text of this token for callers that need it. Symbol zero has no text but is not an
    /// error; any other id without text is.
    pub fn text_or_error(&self) -> Result<Option<&str>, SymbolError> {
        match (&self.text, self.local_sid) {
            (Some(text), _) => Ok(Some(text.as_str())),
            (None, Some(0)) => Ok(None),
            (None, Some(sid)) => Err(SymbolError::UnknownSymbolText(sid)),
            (None, None) => Err(SymbolError::EmptyToken),
        }
    }
}

impl PartialEq for SymbolToken {
    fn eq(&self, other: &Self) -> bool {
        match (&self.text, &other.text) {
            (Some(text), Some(other_text)) => text == other_text,
            _ => self.local_sid == other.local_sid,
        }
    }
}

impl From<&str> for SymbolToken {
    fn from(text: &str) -> Self {
        SymbolToken::new(Some(text.to_owned()), None)
    }
}

impl From<String> for SymbolToken {
    fn from(text: String) -> Self {
        SymbolToken::new(Some(text), None)
    }
}

impl From<usize> for SymbolToken {
    fn from(sid: usize) -> Self {
        SymbolToken::new(None, Some(sid))
    }
}

impl From<&SymbolToken> for SymbolToken {
    fn from(token: &SymbolToken) -> Self {
        token.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    System,
    Shared,
    Local,
    /// Stands in for an import the catalog could not supply exactly, sized by the import's
    /// declared max_id.
    Substitute,
}

/// ## SymbolTable
///
/// Stores a symbol mapping used to convert encountered Symbols back into text.
///
/// ### Semantics
///
/// Each import (including the implicit system table import of a local table) allocates a
/// contiguous, non-overlapping sequence of symbol IDs. The system symbols start at 1, each import
/// starts one past the end of the previous import, and the local symbols start immediately after
/// the last import.
///
/// When mapping from symbol ID to string, there is no ambiguity. Any symbol ID above the table's
/// max_id MUST raise an error.
///
/// When mapping from string to symbol ID, there may be multiple assigned IDs; implementations
/// MUST select the lowest known ID. Put another way, string-to-SID mappings have the following
/// precedence:
///
/// The system table is always consulted first.
/// Each imported table is consulted in the order of import.
/// Local symbols are last.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    kind: TableKind,
    name: Option<String>,
    version: u32,
    // For local tables the system table is always at index 0.
    imports: Vec<Arc<SymbolTable>>,
    import_max_id: usize,
    symbols: Vec<Option<String>>,
    index: HashMap<String, usize>,
    read_only: bool,
    // Substitute tables only: the declared size and the table lending its text, if any.
    declared_max_id: usize,
    source: Option<Arc<SymbolTable>>,
}

impl SymbolTable {
    fn system() -> Self {
        let mut table = SymbolTable::empty(TableKind::System, Some("$ion".to_owned()), 1);
        for text in SYSTEM_SYMBOL_TEXT.iter() {
            table.push(Some((*text).to_owned()));
        }
        table.read_only = true;
        table
    }

    fn empty(kind: TableKind, name: Option<String>, version: u32) -> Self {
        SymbolTable {
            kind,
            name,
            version,
            imports: vec![],
            import_max_id: 0,
            symbols: vec![],
            index: HashMap::new(),
            read_only: false,
            declared_max_id: 0,
            source: None,
        }
    }

    /// A named, versioned table that local tables can import.
    pub fn shared<I, S>(name: impl Into<String>, version: u32, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = SymbolTable::empty(TableKind::Shared, Some(name.into()), version.max(1));
        for text in symbols {
            table.push(Some(text.into()));
        }
        table.read_only = true;
        table
    }

    /// A local table importing the system table followed by `imports`, with no local symbols.
    pub fn local(imports: Vec<Arc<SymbolTable>>) -> Self {
        let mut table = SymbolTable::empty(TableKind::Local, None, 1);
        table.imports.push(Arc::clone(&SYSTEM_SYMBOL_TABLE_V1));
        table.imports.extend(imports);
        table.import_max_id = table.imports.iter().map(|import| import.max_id()).sum();
        table
    }

    /// A table occupying exactly `max_id` ids, taking whatever text `source` has for them.
    /// Lookups go through to `source`; ids past its end have no text.
    pub fn substitute(
        name: impl Into<String>,
        version: u32,
        max_id: usize,
        source: Option<Arc<SymbolTable>>,
    ) -> Self {
        let mut table = SymbolTable::empty(TableKind::Substitute, Some(name.into()), version);
        table.declared_max_id = max_id;
        table.source = source;
        table.read_only = true;
        table
    }

    fn push(&mut self, text: Option<String>) -> usize {
        self.symbols.push(text);
        let sid = self.max_id();
        if let Some(text) = &self.symbols[self.symbols.len() - 1] {
            // Later duplicates keep the lowest id.
            self.index
                .entry(text.clone())
                .or_insert(self.symbols.len() - 1);
        }
        sid
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn max_id(&self) -> usize {
        match self.kind {
            TableKind::Substitute => self.declared_max_id,
            _ => self.import_max_id + self.symbols.len(),
        }
    }

    /// Number of ids allocated to imports, the system table included.
    pub fn import_max_id(&self) -> usize {
        self.import_max_id
    }

    /// The imports that appear in the table's `imports` list; the implicit system import of a
    /// local table is not one of them.
    pub fn imports(&self) -> &[Arc<SymbolTable>] {
        match self.kind {
            TableKind::Local => &self.imports[1..],
            _ => &self.imports,
        }
    }

    /// Symbols declared by this table itself, in id order. `None` marks a gap.
    /// Always empty for a substitute table, whose text lives in its source.
    pub fn symbols(&self) -> &[Option<String>] {
        &self.symbols
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn make_read_only(&mut self) {
        self.read_only = true;
    }

    pub fn is_system(&self) -> bool {
        self.kind == TableKind::System
    }

    pub fn find_sid(&self, text: &str) -> Option<usize> {
        if self.kind == TableKind::Substitute {
            return self
                .source
                .as_ref()
                .and_then(|source| source.find_sid(text))
                .filter(|sid| *sid <= self.declared_max_id);
        }
        let mut offset = 0;
        for import in &self.imports {
            if let Some(sid) = import.find_sid(text) {
                return Some(offset + sid);
            }
            offset += import.max_id();
        }
        self.index
            .get(text)
            .map(|index| self.import_max_id + index + 1)
    }

    pub fn find_text(&self, sid: usize) -> Option<&str> {
        if sid == 0 || sid > self.max_id() {
            return None;
        }
        if self.kind == TableKind::Substitute {
            return self.source.as_ref().and_then(|source| source.find_text(sid));
        }
        let mut offset = 0;
        for import in &self.imports {
            let import_max_id = import.max_id();
            if sid <= offset + import_max_id {
                return import.find_text(sid - offset);
            }
            offset += import_max_id;
        }
        self.symbols[sid - self.import_max_id - 1].as_deref()
    }

    /// A token for `sid` carrying its text when known. Only ids above max_id are an error.
    pub fn resolve(&self, sid: usize) -> Result<SymbolToken, SymbolError> {
        if sid == 0 {
            return Ok(SymbolToken::zero());
        }
        if sid > self.max_id() {
            return Err(SymbolError::AboveMaxId {
                max_id: self.max_id(),
                symbol_id: sid,
            });
        }
        Ok(SymbolToken::new(
            self.find_text(sid).map(str::to_owned),
            Some(sid),
        ))
    }

    /// Returns the lowest id for `text`, assigning the next local id if the table has none.
    pub fn intern(&mut self, text: &str) -> Result<usize, SymbolError> {
        match self.find_sid(text) {
            Some(sid) => Ok(sid),
            None => self.add_symbol(Some(text.to_owned())),
        }
    }

    /// Appends a symbol (or a gap) at the next id, even if the text is already present.
    pub fn add_symbol(&mut self, text: Option<String>) -> Result<usize, SymbolError> {
        if self.read_only {
            return Err(SymbolError::ReadOnlyTable(
                text.unwrap_or_else(|| "$0".to_owned()),
            ));
        }
        Ok(self.push(text))
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.version == other.version
            && self.max_id() == other.max_id()
            && self.imports == other.imports
            && self.symbols == other.symbols
    }
}
