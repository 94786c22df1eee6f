use crate::error::Result;
use crate::ion_types::IonType;
use crate::reader::raw::RawBinaryReader;
use crate::reader::{read_value, IonReader};
use crate::symbols::catalog::{Catalog, SimpleCatalog};
use crate::symbols::local::build_local_table;
use crate::symbols::{
    SymbolTable, SymbolToken, ION_1_0_SYMBOL_ID, ION_SYMBOL_TABLE_SYMBOL_ID, SYSTEM_SYMBOL_TABLE_V1,
};
use crate::types::{Data, Decimal, Integer, Timestamp};
use itertools::Itertools;
use log::{debug, trace};
use std::io::Read;
use std::sync::Arc;

/// Reads user values from a binary Ion stream.
///
/// Version markers and local symbol tables at the top level are consumed as they are reached:
/// a version marker resets the symbol table to the system table, and a struct annotated with
/// `$ion_symbol_table` installs a new local table. Imports are resolved through the catalog.
pub struct BinaryReader<R> {
    raw: RawBinaryReader<R>,
    catalog: Arc<dyn Catalog>,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(source: R) -> Self {
        BinaryReader::with_catalog(source, Arc::new(SimpleCatalog::new()))
    }

    pub fn with_catalog(source: R, catalog: Arc<dyn Catalog>) -> Self {
        BinaryReader {
            raw: RawBinaryReader::new(source),
            catalog,
        }
    }

    /// The table currently in effect, shareable past the life of the reader.
    pub fn symbol_table_handle(&self) -> Arc<SymbolTable> {
        Arc::clone(self.raw.shared_symbol_table())
    }

    pub fn position(&self) -> usize {
        self.raw.position()
    }

    pub fn into_inner(self) -> R {
        self.raw.into_inner()
    }

    /// An unannotated `$ion_1_0` symbol value at the top level acts as a version marker.
    fn is_version_symbol(&mut self) -> Result<bool> {
        if self.raw.is_null() || !self.raw.annotation_ids().is_empty() {
            return Ok(false);
        }
        Ok(self.raw.read_symbol_id()? == ION_1_0_SYMBOL_ID)
    }

    fn load_local_table(&mut self) -> Result<()> {
        let encountered = match read_value(&mut self.raw)?.value {
            Data::Struct(fields) => fields,
            _ => None,
        };
        let table = build_local_table(
            self.raw.shared_symbol_table(),
            &encountered,
            self.catalog.as_ref(),
        )?;
        trace!(
            "local symbols: [{}]",
            table
                .symbols()
                .iter()
                .map(|text| text.as_deref().unwrap_or("$0"))
                .join(", ")
        );
        self.raw.set_symbol_table(Arc::new(table));
        Ok(())
    }
}

impl<R: Read> IonReader for BinaryReader<R> {
    fn next(&mut self) -> Result<Option<IonType>> {
        loop {
            let ion_type = match self.raw.next()? {
                Some(ion_type) => ion_type,
                None => return Ok(None),
            };
            if self.raw.depth() > 0 {
                return Ok(Some(ion_type));
            }
            match ion_type {
                IonType::Symbol if self.raw.is_version_marker() => {
                    debug!(
                        "version marker at offset {}, resetting symbol table",
                        self.raw.position() - 4
                    );
                    self.raw
                        .set_symbol_table(Arc::clone(&SYSTEM_SYMBOL_TABLE_V1));
                }
                IonType::Symbol if self.is_version_symbol()? => {
                    debug!("$ion_1_0 symbol at offset {}, resetting symbol table", self.raw.position());
                    self.raw
                        .set_symbol_table(Arc::clone(&SYSTEM_SYMBOL_TABLE_V1));
                }
                IonType::Struct
                    if self.raw.annotation_ids().first() == Some(&ION_SYMBOL_TABLE_SYMBOL_ID) =>
                {
                    self.load_local_table()?;
                }
                _ => return Ok(Some(ion_type)),
            }
        }
    }

    fn ion_type(&self) -> Option<IonType> {
        self.raw.ion_type()
    }

    fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    fn depth(&self) -> usize {
        self.raw.depth()
    }

    fn step_in(&mut self) -> Result<()> {
        self.raw.step_in()
    }

    fn step_out(&mut self) -> Result<()> {
        self.raw.step_out()
    }

    fn field_name(&self) -> Result<Option<SymbolToken>> {
        self.raw.field_name()
    }

    fn annotations(&self) -> Result<Vec<SymbolToken>> {
        self.raw.annotations()
    }

    fn symbol_table(&self) -> &SymbolTable {
        self.raw.symbol_table()
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.raw.read_bool()
    }

    fn read_integer(&mut self) -> Result<Integer> {
        self.raw.read_integer()
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.raw.read_f64()
    }

    fn read_decimal(&mut self) -> Result<Decimal> {
        self.raw.read_decimal()
    }

    fn read_timestamp(&mut self) -> Result<Timestamp> {
        self.raw.read_timestamp()
    }

    fn read_symbol(&mut self) -> Result<SymbolToken> {
        self.raw.read_symbol()
    }

    fn read_string(&mut self) -> Result<String> {
        self.raw.read_string()
    }

    fn read_lob(&mut self) -> Result<Vec<u8>> {
        self.raw.read_lob()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, SymbolError};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const LOCAL_FOO: &str = "e98183d687b483666f6f";

    fn reader(hex: &str) -> BinaryReader<Cursor<Vec<u8>>> {
        BinaryReader::new(Cursor::new(hex::decode(hex).unwrap()))
    }

    #[test]
    fn version_markers_are_not_values() {
        let mut reader = reader("e00100ea2101e00100ea");
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 1);
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn local_symbol_table_is_installed() {
        let mut reader = reader(&format!("e00100ea{}710a", LOCAL_FOO));
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.read_symbol().unwrap().text(), Some("foo"));
        assert_eq!(reader.symbol_table().max_id(), 10);
    }

    #[test]
    fn version_marker_resets_the_table() {
        let mut reader = reader(&format!("e00100ea{}710ae00100ea710a", LOCAL_FOO));
        reader.next().unwrap();
        assert_eq!(reader.read_symbol().unwrap().text(), Some("foo"));
        reader.next().unwrap();
        assert!(matches!(
            reader.read_symbol(),
            Err(Error::Symbol(SymbolError::AboveMaxId {
                max_id: 9,
                symbol_id: 10
            }))
        ));
    }

    #[test]
    fn ion_1_0_symbol_resets_the_table() {
        let mut reader = reader(&format!("e00100ea{}710a71022101710a", LOCAL_FOO));
        reader.next().unwrap();
        assert_eq!(reader.read_symbol().unwrap().text(), Some("foo"));
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 1);
        assert_eq!(reader.symbol_table().max_id(), 9);
        reader.next().unwrap();
        assert!(matches!(
            reader.read_symbol(),
            Err(Error::Symbol(SymbolError::AboveMaxId {
                max_id: 9,
                symbol_id: 10
            }))
        ));
    }

    #[test]
    fn annotated_or_nested_ion_1_0_symbols_are_user_data() {
        // name::$ion_1_0 [$ion_1_0] null.symbol
        let mut reader = reader("e00100eae481847102b271027f");
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.annotations().unwrap(), vec![SymbolToken::from("name")]);
        assert_eq!(reader.read_symbol().unwrap().text(), Some("$ion_1_0"));
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.read_symbol().unwrap().local_sid(), Some(2));
        reader.step_out().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert!(reader.is_null());
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn appended_symbols_follow_the_current_table() {
        // $ion_symbol_table::{ imports: $ion_symbol_table, symbols: ["bar"] }
        let append = "ec8183d986710387b483626172";
        let mut reader = reader(&format!("e00100ea{}{}710b710a", LOCAL_FOO, append));
        reader.next().unwrap();
        assert_eq!(reader.read_symbol().unwrap().text(), Some("bar"));
        reader.next().unwrap();
        assert_eq!(reader.read_symbol().unwrap().text(), Some("foo"));
    }

    #[test]
    fn nested_symbol_table_structs_are_user_data() {
        let mut reader = reader("b4e38183d0");
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
        assert_eq!(
            reader.annotations().unwrap()[0].text(),
            Some("$ion_symbol_table")
        );
        reader.step_out().unwrap();
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn imports_come_from_the_catalog() {
        let mut catalog = SimpleCatalog::new();
        catalog.insert(Arc::new(SymbolTable::shared("colors", 1, vec!["red", "green"])));
        // $ion_symbol_table::{ imports: [{ name: "colors", version: 1, max_id: 2 }] } $11
        let stream = concat!(
            "e00100ea",
            "ee978183",
            "de9386",
            "be90",
            "de8e",
            "8486636f6c6f7273",
            "852101",
            "882102",
            "710b"
        );
        let mut reader =
            BinaryReader::with_catalog(Cursor::new(hex::decode(stream).unwrap()), Arc::new(catalog));
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.read_symbol().unwrap().text(), Some("green"));
        assert_eq!(reader.symbol_table_handle().imports().len(), 1);
    }
}
