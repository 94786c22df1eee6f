use crate::symbols::SymbolTable;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Shared symbol tables available for resolving the imports of local symbol tables.
pub trait Catalog {
    fn get_table(&self, name: &str, version: u32) -> Option<Arc<SymbolTable>>;

    /// The table with the given name and the greatest version available.
    fn get_latest(&self, name: &str) -> Option<Arc<SymbolTable>>;
}

#[derive(Debug, Default)]
pub struct SimpleCatalog {
    tables: HashMap<String, BTreeMap<u32, Arc<SymbolTable>>>,
}

impl SimpleCatalog {
    pub fn new() -> Self {
        SimpleCatalog::default()
    }

    /// Registers a shared table under its name and version. Tables without a name are ignored.
    pub fn insert(&mut self, table: Arc<SymbolTable>) {
        if let Some(name) = table.name() {
            self.tables
                .entry(name.to_owned())
                .or_insert_with(BTreeMap::new)
                .insert(table.version(), Arc::clone(&table));
        }
    }
}

impl Catalog for SimpleCatalog {
    fn get_table(&self, name: &str, version: u32) -> Option<Arc<SymbolTable>> {
        self.tables
            .get(name)
            .and_then(|versions| versions.get(&version))
            .cloned()
    }

    fn get_latest(&self, name: &str) -> Option<Arc<SymbolTable>> {
        self.tables
            .get(name)
            .and_then(|versions| versions.values().next_back())
            .cloned()
    }
}
