use crate::error::{Error, Result, UsageError};
use crate::ion_types::IonType;
use crate::reader::IonReader;
use crate::symbols::{
    SymbolTable, SymbolToken, TableKind, IMPORTS_SYMBOL_ID, ION_SHARED_SYMBOL_TABLE_SYMBOL_ID,
    ION_SYMBOL_TABLE_SYMBOL_ID, MAX_ID_SYMBOL_ID, NAME_SYMBOL_ID, SYMBOLS_SYMBOL_ID,
    SYSTEM_SYMBOL_TABLE_V1, SYSTEM_SYMBOL_TEXT, VERSION_SYMBOL_ID,
};
use crate::types::{Decimal, Integer, Timestamp};
use crate::writer::{copy_value, IonWriter};
use std::sync::{PoisonError, RwLock};

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    BeforeTable,
    OnTable,
    InTable,
    OnName,
    OnVersion,
    OnMaxId,
    OnImports,
    InImports,
    OnImport,
    InImport,
    OnImportName,
    OnImportVersion,
    OnImportMaxId,
    AfterImportFields,
    AfterImports,
    OnSymbols,
    InSymbols,
    OnSymbol,
    AfterSymbols,
    AfterTableFields,
    AfterTable,
}

const TABLE_FIELDS: [State; 5] = [
    State::OnName,
    State::OnVersion,
    State::OnMaxId,
    State::OnImports,
    State::OnSymbols,
];

#[derive(Clone, Debug)]
struct ImportDescriptor {
    name: String,
    version: u32,
    max_id: usize,
}

/// Presents a symbol table as the single struct that declares it:
///
/// ```text
/// $ion_symbol_table::{
///   name: "...",
///   version: 1,
///   max_id: 12,
///   imports: [{ name: "...", version: 1, max_id: 2 }],
///   symbols: ["foo", null.string, "bar"],
/// }
/// ```
///
/// Shared tables are annotated `$ion_shared_symbol_table`. Local tables have neither name nor
/// version, and empty imports or symbols lists are left out. After `step_out` the cursor stays
/// on the container it left, so the following `next` moves past it.
pub struct SymbolTableReader {
    state: State,
    shared: bool,
    name: Option<String>,
    version: u32,
    max_id: usize,
    imports: Vec<ImportDescriptor>,
    symbols: Vec<Option<String>>,
    import_index: usize,
    symbol_index: usize,
}

impl SymbolTableReader {
    pub fn new(table: &SymbolTable) -> Self {
        let imports = match table.kind() {
            TableKind::System => vec![],
            _ => table
                .imports()
                .iter()
                .map(|import| ImportDescriptor {
                    name: import.name().unwrap_or_default().to_owned(),
                    version: import.version(),
                    max_id: import.max_id(),
                })
                .collect(),
        };
        SymbolTableReader {
            state: State::BeforeTable,
            shared: table.kind() != TableKind::Local,
            name: table.name().map(str::to_owned),
            version: table.version(),
            max_id: table.max_id(),
            imports,
            symbols: table.symbols().to_vec(),
            import_index: 0,
            symbol_index: 0,
        }
    }

    /// Snapshots a table that other threads may be adding symbols to. The lock is held only while
    /// the snapshot is taken.
    pub fn from_shared(table: &RwLock<SymbolTable>) -> Self {
        let table = table.read().unwrap_or_else(PoisonError::into_inner);
        SymbolTableReader::new(&table)
    }

    fn has_field(&self, field: State) -> bool {
        match field {
            State::OnName | State::OnVersion => self.name.is_some(),
            State::OnMaxId => true,
            State::OnImports => !self.imports.is_empty(),
            State::OnSymbols => !self.symbols.is_empty(),
            _ => false,
        }
    }

    fn next_table_field(&self, after: Option<State>) -> State {
        let start = match after {
            Some(field) => TABLE_FIELDS
                .iter()
                .position(|candidate| *candidate == field)
                .map_or(TABLE_FIELDS.len(), |index| index + 1),
            None => 0,
        };
        TABLE_FIELDS[start..]
            .iter()
            .copied()
            .find(|field| self.has_field(*field))
            .unwrap_or(State::AfterTableFields)
    }

    fn import(&self) -> Option<&ImportDescriptor> {
        self.imports.get(self.import_index)
    }

    fn mismatch(&self, expected: IonType) -> Error {
        UsageError::TypeMismatch {
            expected,
            found: self.ion_type(),
        }
        .into()
    }
}

fn system_token(sid: usize) -> SymbolToken {
    SymbolToken::new(Some(SYSTEM_SYMBOL_TEXT[sid - 1].to_owned()), Some(sid))
}

impl IonReader for SymbolTableReader {
    fn next(&mut self) -> Result<Option<IonType>> {
        self.state = match self.state {
            State::BeforeTable => State::OnTable,
            State::OnTable | State::AfterTable => State::AfterTable,
            State::InTable => self.next_table_field(None),
            field @ State::OnName
            | field @ State::OnVersion
            | field @ State::OnMaxId
            | field @ State::OnImports
            | field @ State::OnSymbols => self.next_table_field(Some(field)),
            State::AfterTableFields => State::AfterTableFields,
            State::InImports if self.imports.is_empty() => State::AfterImports,
            State::InImports => {
                self.import_index = 0;
                State::OnImport
            }
            State::OnImport if self.import_index + 1 < self.imports.len() => {
                self.import_index += 1;
                State::OnImport
            }
            State::OnImport | State::AfterImports => State::AfterImports,
            State::InImport => State::OnImportName,
            State::OnImportName => State::OnImportVersion,
            State::OnImportVersion => State::OnImportMaxId,
            State::OnImportMaxId | State::AfterImportFields => State::AfterImportFields,
            State::InSymbols if self.symbols.is_empty() => State::AfterSymbols,
            State::InSymbols => {
                self.symbol_index = 0;
                State::OnSymbol
            }
            State::OnSymbol if self.symbol_index + 1 < self.symbols.len() => {
                self.symbol_index += 1;
                State::OnSymbol
            }
            State::OnSymbol | State::AfterSymbols => State::AfterSymbols,
        };
        Ok(self.ion_type())
    }

    fn ion_type(&self) -> Option<IonType> {
        match self.state {
            State::OnTable | State::OnImport => Some(IonType::Struct),
            State::OnImports | State::OnSymbols => Some(IonType::List),
            State::OnName | State::OnImportName | State::OnSymbol => Some(IonType::String),
            State::OnVersion | State::OnMaxId | State::OnImportVersion | State::OnImportMaxId => {
                Some(IonType::Int)
            }
            State::BeforeTable
            | State::InTable
            | State::InImports
            | State::InImport
            | State::AfterImportFields
            | State::AfterImports
            | State::InSymbols
            | State::AfterSymbols
            | State::AfterTableFields
            | State::AfterTable => None,
        }
    }

    fn is_null(&self) -> bool {
        self.state == State::OnSymbol
            && matches!(self.symbols.get(self.symbol_index), Some(None))
    }

    fn depth(&self) -> usize {
        match self.state {
            State::BeforeTable | State::OnTable | State::AfterTable => 0,
            State::InTable
            | State::OnName
            | State::OnVersion
            | State::OnMaxId
            | State::OnImports
            | State::OnSymbols
            | State::AfterTableFields => 1,
            State::InImports
            | State::OnImport
            | State::AfterImports
            | State::InSymbols
            | State::OnSymbol
            | State::AfterSymbols => 2,
            State::InImport
            | State::OnImportName
            | State::OnImportVersion
            | State::OnImportMaxId
            | State::AfterImportFields => 3,
        }
    }

    fn step_in(&mut self) -> Result<()> {
        self.state = match self.state {
            State::OnTable => State::InTable,
            State::OnImports => State::InImports,
            State::OnImport => State::InImport,
            State::OnSymbols => State::InSymbols,
            _ => {
                return Err(match self.ion_type() {
                    Some(ion_type) => UsageError::NotAContainer(ion_type),
                    None => UsageError::NoContainerToStepInto,
                }
                .into())
            }
        };
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        self.state = match self.depth() {
            0 => return Err(UsageError::StepOutAtTopLevel.into()),
            1 => State::AfterTable,
            2 => match self.state {
                State::InSymbols | State::OnSymbol | State::AfterSymbols => State::OnSymbols,
                _ => State::OnImports,
            },
            _ => State::OnImport,
        };
        Ok(())
    }

    fn field_name(&self) -> Result<Option<SymbolToken>> {
        let sid = match self.state {
            State::OnName | State::OnImportName => NAME_SYMBOL_ID,
            State::OnVersion | State::OnImportVersion => VERSION_SYMBOL_ID,
            State::OnMaxId | State::OnImportMaxId => MAX_ID_SYMBOL_ID,
            State::OnImports => IMPORTS_SYMBOL_ID,
            State::OnSymbols => SYMBOLS_SYMBOL_ID,
            _ => return Ok(None),
        };
        Ok(Some(system_token(sid)))
    }

    fn annotations(&self) -> Result<Vec<SymbolToken>> {
        Ok(match self.state {
            State::OnTable if self.shared => vec![system_token(ION_SHARED_SYMBOL_TABLE_SYMBOL_ID)],
            State::OnTable => vec![system_token(ION_SYMBOL_TABLE_SYMBOL_ID)],
            _ => vec![],
        })
    }

    fn symbol_table(&self) -> &SymbolTable {
        &SYSTEM_SYMBOL_TABLE_V1
    }

    fn read_bool(&mut self) -> Result<bool> {
        Err(self.mismatch(IonType::Bool))
    }

    fn read_integer(&mut self) -> Result<Integer> {
        let value = match self.state {
            State::OnVersion => i64::from(self.version),
            State::OnMaxId => self.max_id as i64,
            State::OnImportVersion => self.import().map_or(1, |import| i64::from(import.version)),
            State::OnImportMaxId => self.import().map_or(0, |import| import.max_id as i64),
            _ => return Err(self.mismatch(IonType::Int)),
        };
        Ok(Integer::I64(value))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Err(self.mismatch(IonType::Float))
    }

    fn read_decimal(&mut self) -> Result<Decimal> {
        Err(self.mismatch(IonType::Decimal))
    }

    fn read_timestamp(&mut self) -> Result<Timestamp> {
        Err(self.mismatch(IonType::Timestamp))
    }

    fn read_symbol(&mut self) -> Result<SymbolToken> {
        Err(self.mismatch(IonType::Symbol))
    }

    fn read_string(&mut self) -> Result<String> {
        let value = match self.state {
            State::OnName => self.name.clone(),
            State::OnImportName => self.import().map(|import| import.name.clone()),
            State::OnSymbol => self.symbols.get(self.symbol_index).cloned().flatten(),
            _ => None,
        };
        value.ok_or_else(|| self.mismatch(IonType::String))
    }

    fn read_lob(&mut self) -> Result<Vec<u8>> {
        Err(self.mismatch(IonType::Blob))
    }
}

impl SymbolTable {
    /// Writes the struct that declares this table.
    pub fn write_to<W: IonWriter + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let mut reader = SymbolTableReader::new(self);
        reader.next()?;
        copy_value(&mut reader, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_value;
    use crate::types::{Data, Struct, Value};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn project(table: &SymbolTable) -> Value {
        let mut reader = SymbolTableReader::new(table);
        assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
        let value = read_value(&mut reader).unwrap();
        assert_eq!(reader.next().unwrap(), None);
        value
    }

    fn fields(value: &Value) -> &Struct {
        match &value.value {
            Data::Struct(Some(fields)) => fields,
            other => panic!("expected a struct, got {:?}", other),
        }
    }

    fn texts(value: Option<&Value>) -> Vec<Option<String>> {
        match value.map(|value| &value.value) {
            Some(Data::List(Some(list))) => list
                .values
                .iter()
                .map(|value| match &value.value {
                    Data::String(text) => text.clone(),
                    other => panic!("expected a string, got {:?}", other),
                })
                .collect(),
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn local_table_projection() {
        let mut table = SymbolTable::local(vec![]);
        table.intern("foo").unwrap();
        table.add_symbol(None).unwrap();
        table.intern("bar").unwrap();

        let value = project(&table);
        assert!(value.has_annotation("$ion_symbol_table"));
        let table_struct = fields(&value);
        let names: Vec<_> = table_struct
            .fields
            .iter()
            .map(|(name, _)| name.text().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["max_id", "symbols"]);
        assert_eq!(
            table_struct.get("max_id").map(|value| &value.value),
            Some(&Data::Int(Some(Integer::I64(12))))
        );
        assert_eq!(
            texts(table_struct.get("symbols")),
            vec![Some("foo".to_owned()), None, Some("bar".to_owned())]
        );
    }

    #[test]
    fn local_table_with_imports() {
        let colors = Arc::new(SymbolTable::shared("colors", 2, vec!["red", "green"]));
        let mut table = SymbolTable::local(vec![colors]);
        table.intern("blue").unwrap();

        let value = project(&table);
        let table_struct = fields(&value);
        let imports = match table_struct.get("imports").map(|value| &value.value) {
            Some(Data::List(Some(list))) => list.values.clone(),
            other => panic!("expected imports, got {:?}", other),
        };
        assert_eq!(imports.len(), 1);
        let import = fields(&imports[0]);
        assert_eq!(
            import.get("name").map(|value| &value.value),
            Some(&Data::String(Some("colors".to_owned())))
        );
        assert_eq!(
            import.get("version").map(|value| &value.value),
            Some(&Data::Int(Some(Integer::I64(2))))
        );
        assert_eq!(
            import.get("max_id").map(|value| &value.value),
            Some(&Data::Int(Some(Integer::I64(2))))
        );
        assert_eq!(texts(table_struct.get("symbols")), vec![Some("blue".to_owned())]);
    }

    #[test]
    fn shared_tables_carry_name_and_version() {
        let table = SymbolTable::shared("colors", 3, vec!["red"]);
        let value = project(&table);
        assert!(value.has_annotation("$ion_shared_symbol_table"));
        let table_struct = fields(&value);
        assert_eq!(
            table_struct.get("name").map(|value| &value.value),
            Some(&Data::String(Some("colors".to_owned())))
        );
        assert_eq!(
            table_struct.get("version").map(|value| &value.value),
            Some(&Data::Int(Some(Integer::I64(3))))
        );
    }

    #[test]
    fn stepping_out_early_skips_the_rest() {
        let mut table = SymbolTable::local(vec![]);
        table.intern("a").unwrap();
        table.intern("b").unwrap();
        let mut reader = SymbolTableReader::new(&table);
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert_eq!(reader.depth(), 2);
        assert_eq!(reader.next().unwrap(), Some(IonType::String));
        assert_eq!(reader.read_string().unwrap(), "a");
        reader.step_out().unwrap();
        assert_eq!(reader.next().unwrap(), None);
        reader.step_out().unwrap();
        assert_eq!(reader.depth(), 0);
        assert_eq!(reader.next().unwrap(), None);
        assert!(matches!(
            reader.step_out(),
            Err(Error::Usage(UsageError::StepOutAtTopLevel))
        ));
    }

    #[test]
    fn snapshot_of_a_locked_table() {
        let table = RwLock::new(SymbolTable::local(vec![]));
        table.write().unwrap().intern("first").unwrap();
        let mut reader = SymbolTableReader::from_shared(&table);
        table.write().unwrap().intern("second").unwrap();

        reader.next().unwrap();
        let value = read_value(&mut reader).unwrap();
        assert_eq!(
            texts(fields(&value).get("symbols")),
            vec![Some("first".to_owned())]
        );
    }

    #[test]
    fn typed_reads_of_the_wrong_type_fail() {
        let mut reader = SymbolTableReader::new(&SYSTEM_SYMBOL_TABLE_V1);
        reader.next().unwrap();
        assert!(matches!(
            reader.read_string(),
            Err(Error::Usage(UsageError::TypeMismatch {
                expected: IonType::String,
                found: Some(IonType::Struct)
            }))
        ));
    }
}
