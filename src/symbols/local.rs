use crate::error::SymbolError;
use crate::symbols::catalog::Catalog;
use crate::symbols::{SymbolTable, TableKind};
use crate::types::{Data, List, Struct, Value};
use log::debug;
use std::sync::Arc;

/// # Local Symbol Tables
///
/// A local symbol table defines symbols through two mechanisms, both of which are optional.
///
/// First, it imports the symbols from one or more shared symbol tables,
/// offsetting symbol IDs appropriately so they do not overlap.
/// Instead of importing the symbols from shared symbol tables,
/// a local symbol table may import the current symbol table.
///
/// Second, it defines local symbols similarly to shared tables.
///
/// When immediately following an explicit system ID, a top-level struct whose first annotation is
/// $ion_symbol_table is interpreted as a local symbol table. If the struct is null (null.struct)
/// then it is treated as if it were an empty struct.
///
/// The imports field should be the symbol $ion_symbol_table or a list of import structs.
///
/// The symbols field should be a list of strings. If the field is missing or has any other type,
/// it is treated as if it were an empty list.
///
/// Null elements in the symbols list declare unknown symbol text (“gaps”) for its SID within the
/// sequence. Any element of the list that is not a string must be interpreted as if it were null.
///
/// Any other field (including, for example, name or version) is ignored.
pub(crate) fn build_local_table(
    current: &SymbolTable,
    encountered: &Option<Struct>,
    catalog: &dyn Catalog,
) -> Result<SymbolTable, SymbolError> {
    let empty = Struct { fields: vec![] };
    let Struct { fields } = encountered.as_ref().unwrap_or(&empty);

    let imports_field = unique_field(fields, "imports")?;
    let symbols_field = unique_field(fields, "symbols")?;

    let mut table = match imports_field.map(|value| &value.value) {
        Some(Data::Symbol(Some(token))) if token.text() == Some("$ion_symbol_table") => {
            // Appending to the system table is the same as starting a fresh local table.
            match current.kind() {
                TableKind::Local => {
                    let mut table = current.clone();
                    table.read_only = false;
                    table
                }
                _ => SymbolTable::local(vec![]),
            }
        }
        Some(Data::List(Some(List { values }))) => {
            SymbolTable::local(handle_imports(values, catalog)?)
        }
        _ => SymbolTable::local(vec![]),
    };

    if let Some(Value {
        value: Data::List(Some(List { values })),
        ..
    }) = symbols_field
    {
        for value in values {
            let text = match &value.value {
                Data::String(Some(text)) => Some(text.clone()),
                _ => None,
            };
            table.add_symbol(text)?;
        }
    }

    debug!(
        "installed local symbol table with {} imports and max_id {}",
        table.imports().len(),
        table.max_id()
    );
    Ok(table)
}

fn unique_field<'a>(
    fields: &'a [(crate::symbols::SymbolToken, Value)],
    name: &str,
) -> Result<Option<&'a Value>, SymbolError> {
    let mut matches = fields
        .iter()
        .filter(|(token, _)| token.text() == Some(name))
        .map(|(_, value)| value);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(SymbolError::InvalidSymbolTable(match name {
            "imports" => "duplicate imports field",
            _ => "duplicate symbols field",
        }));
    }
    Ok(first)
}

/// Import structs in an import list are processed in order as follows:
///
/// If no name field is defined, or if it is not a non-empty string, the import clause is ignored.
/// If the name field is "$ion", the import clause is ignored.
/// If no version field is defined, or if it is null, not an int, or less than 1, act as if it is 1.
/// If a max_id field is defined but is null, not an int, or less than zero, act as if it is undefined.
/// Select a shared symbol table instance as follows:
/// Query the catalog to retrieve the specified table by name and version.
/// If an exact match is not found:
/// If max_id is undefined, implementations MUST raise an error and halt processing.
/// Otherwise query the catalog to retrieve the table with the given name and the greatest version available.
/// If no table has been selected, substitute a dummy table containing max_id undefined symbols.
/// If max_id is undefined, set it to the largest symbol ID of the selected table (which will necessarily be an exact match).
/// Allocate the next max_id symbol IDs to this imported symbol table.
///
/// Each element of the list must be a struct; each element that is null or is not a struct is
/// ignored.
fn handle_imports(
    imports: &[Value],
    catalog: &dyn Catalog,
) -> Result<Vec<Arc<SymbolTable>>, SymbolError> {
    let mut tables = vec![];
    for import in imports {
        let fields = match &import.value {
            Data::Struct(Some(Struct { fields })) => fields,
            _ => continue,
        };

        let name = match field(fields, "name") {
            Some(Data::String(Some(name))) if !name.is_empty() && name != "$ion" => name,
            _ => continue,
        };

        let version = match field(fields, "version") {
            Some(Data::Int(Some(version))) => match version.as_i64() {
                Some(version) if version < 1 => 1,
                Some(version) if version <= i64::from(u32::max_value()) => version as u32,
                Some(_) => {
                    return Err(SymbolError::InvalidSymbolTable(
                        "import version out of range",
                    ))
                }
                // A BigInt version is either hugely negative or hugely positive.
                None if version.to_bigint().sign() == num_bigint::Sign::Minus => 1,
                None => {
                    return Err(SymbolError::InvalidSymbolTable(
                        "import version out of range",
                    ))
                }
            },
            _ => 1,
        };

        let max_id = match field(fields, "max_id") {
            Some(Data::Int(Some(max_id))) => match max_id.as_i64() {
                Some(max_id) if max_id < 0 => None,
                Some(max_id) if max_id <= i64::from(i32::max_value()) => Some(max_id as usize),
                None if max_id.to_bigint().sign() == num_bigint::Sign::Minus => None,
                _ => {
                    return Err(SymbolError::InvalidSymbolTable(
                        "import max_id out of range",
                    ))
                }
            },
            _ => None,
        };

        let table = match (catalog.get_table(name, version), max_id) {
            (Some(table), None) => table,
            (Some(table), Some(max_id)) if max_id == table.max_id() => table,
            (Some(table), Some(max_id)) => Arc::new(SymbolTable::substitute(
                name.as_str(),
                version,
                max_id,
                Some(table),
            )),
            (None, None) => return Err(SymbolError::UndefinedMaxId(name.clone())),
            (None, Some(max_id)) => {
                let latest = catalog.get_latest(name);
                Arc::new(SymbolTable::substitute(
                    name.as_str(),
                    version,
                    max_id,
                    latest,
                ))
            }
        };
        debug!(
            "import {} version {} occupies {} symbol ids",
            name,
            version,
            table.max_id()
        );
        tables.push(table);
    }
    Ok(tables)
}

fn field<'a>(fields: &'a [(crate::symbols::SymbolToken, Value)], name: &str) -> Option<&'a Data> {
    fields
        .iter()
        .find(|(token, _)| token.text() == Some(name))
        .map(|(_, value)| &value.value)
}
