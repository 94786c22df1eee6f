use crate::binary::BVM_1_0;
use crate::error::{Result, SymbolError, UsageError};
use crate::ion_types::IonType;
use crate::symbols::{
    SymbolTable, SymbolToken, TableKind, IMPORTS_SYMBOL_ID, ION_SYMBOL_TABLE_SYMBOL_ID,
    MAX_ID_SYMBOL_ID, NAME_SYMBOL_ID, SYMBOLS_SYMBOL_ID, SYSTEM_SYMBOL_IDS, VERSION_SYMBOL_ID,
};
use crate::types::{Decimal, Integer, Timestamp};
use crate::writer::raw::RawBinaryWriter;
use crate::writer::IonWriter;
use log::debug;
use std::io::{self, Write};
use std::sync::Arc;

/// Progress of the local symbol table being written alongside the user values.
#[derive(Clone, Copy, Debug, PartialEq)]
enum SymbolState {
    /// Only system symbols have been used; no local table is needed yet.
    SystemSymbols,
    /// The table struct is open and its imports are written.
    LocalSymbolsWithImportsOnly,
    /// The `symbols` list is open.
    LocalSymbols,
    /// A local table has been written out. New symbols append a new one.
    LocalSymbolsFlushed,
}

/// Configures a [`BinaryWriter`].
#[derive(Debug, Default)]
pub struct WriterBuilder {
    imports: Vec<Arc<SymbolTable>>,
}

impl WriterBuilder {
    pub fn new() -> Self {
        WriterBuilder::default()
    }

    /// Shared tables whose symbols the writer may refer to without defining them locally.
    pub fn with_imports(mut self, imports: Vec<Arc<SymbolTable>>) -> Self {
        self.imports = imports;
        self
    }

    pub fn build<W: Write>(self, sink: W) -> Result<BinaryWriter<W>> {
        if let Some(import) = self
            .imports
            .iter()
            .find(|import| import.kind() != TableKind::Shared)
        {
            return Err(SymbolError::InvalidImport(import.name().unwrap_or_default().to_owned()).into());
        }
        Ok(BinaryWriter::with_imports(sink, self.imports))
    }
}

/// Writes binary Ion from symbol text.
///
/// Symbol text is interned into a local symbol table as it is used. The table is written by a
/// second writer running alongside the one for user values, and on flush the sink receives the
/// version marker (once per stream), then the table, then the values, so the table always comes
/// before the first value that needs it.
pub struct BinaryWriter<W: Write> {
    user: RawBinaryWriter<W>,
    symbols: RawBinaryWriter<io::Sink>,
    state: SymbolState,
    imports: Vec<Arc<SymbolTable>>,
    table: SymbolTable,
    needs_version_marker: bool,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(sink: W) -> Self {
        BinaryWriter::with_imports(sink, vec![])
    }

    fn with_imports(sink: W, imports: Vec<Arc<SymbolTable>>) -> Self {
        BinaryWriter {
            user: RawBinaryWriter::new(sink),
            symbols: RawBinaryWriter::new(io::sink()),
            state: SymbolState::SystemSymbols,
            table: SymbolTable::local(imports.clone()),
            imports,
            needs_version_marker: true,
        }
    }

    /// The local symbol table built so far.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    /// Stops new symbols from being added; interning unknown text fails from here on.
    pub fn lock_local_symbols(&mut self) {
        self.table.make_read_only();
    }

    pub fn into_inner(self) -> W {
        self.user.into_inner()
    }

    /// The symbol id for `text`, adding it to the local table if it is new. System symbols come
    /// first, then imports, then local symbols.
    pub fn intern(&mut self, text: &str) -> Result<usize> {
        if let Some(sid) = SYSTEM_SYMBOL_IDS.get(text) {
            return Ok(*sid);
        }
        if let Some(sid) = self.table.find_sid(text) {
            self.declare_imports_for(sid)?;
            return Ok(sid);
        }
        if self.table.is_read_only() {
            return Err(SymbolError::ReadOnlyTable(text.to_owned()).into());
        }
        self.open_symbols_list()?;
        let sid = self.table.intern(text)?;
        self.symbols.write_string(text)?;
        Ok(sid)
    }

    fn token_sid(&mut self, token: &SymbolToken) -> Result<usize> {
        match (token.text(), token.local_sid()) {
            (Some(text), _) => self.intern(text),
            (None, Some(sid)) if sid <= self.table.max_id() => {
                self.declare_imports_for(sid)?;
                Ok(sid)
            }
            (None, Some(sid)) => Err(SymbolError::AboveMaxId {
                max_id: self.table.max_id(),
                symbol_id: sid,
            }
            .into()),
            (None, None) => Err(SymbolError::EmptyToken.into()),
        }
    }

    /// An imported id needs the imports declared once per stream. A table already written out
    /// declares them, so only the first use reopens anything.
    fn declare_imports_for(&mut self, sid: usize) -> Result<()> {
        let system_max_id = SYSTEM_SYMBOL_IDS.len();
        if sid > system_max_id
            && sid <= self.table.import_max_id()
            && self.state == SymbolState::SystemSymbols
        {
            self.open_local_table()?;
        }
        Ok(())
    }

    /// Opens the local table struct if it is not open already, writing its imports.
    fn open_local_table(&mut self) -> Result<()> {
        match self.state {
            SymbolState::SystemSymbols => {
                let symbols = &mut self.symbols;
                symbols.add_annotation(ION_SYMBOL_TABLE_SYMBOL_ID.into())?;
                symbols.step_in(IonType::Struct)?;
                if !self.imports.is_empty() {
                    symbols.set_field_name(IMPORTS_SYMBOL_ID.into())?;
                    symbols.step_in(IonType::List)?;
                    for import in &self.imports {
                        symbols.step_in(IonType::Struct)?;
                        symbols.set_field_name(NAME_SYMBOL_ID.into())?;
                        symbols.write_string(import.name().unwrap_or_default())?;
                        symbols.set_field_name(VERSION_SYMBOL_ID.into())?;
                        symbols.write_i64(i64::from(import.version()))?;
                        symbols.set_field_name(MAX_ID_SYMBOL_ID.into())?;
                        symbols.write_i64(import.max_id() as i64)?;
                        symbols.step_out()?;
                    }
                    symbols.step_out()?;
                }
            }
            SymbolState::LocalSymbolsFlushed => {
                debug!("appending to the local symbol table at max_id {}", self.table.max_id());
                self.symbols.add_annotation(ION_SYMBOL_TABLE_SYMBOL_ID.into())?;
                self.symbols.step_in(IonType::Struct)?;
                self.symbols.set_field_name(IMPORTS_SYMBOL_ID.into())?;
                self.symbols.write_symbol(ION_SYMBOL_TABLE_SYMBOL_ID.into())?;
            }
            SymbolState::LocalSymbolsWithImportsOnly | SymbolState::LocalSymbols => return Ok(()),
        }
        self.state = SymbolState::LocalSymbolsWithImportsOnly;
        Ok(())
    }

    fn open_symbols_list(&mut self) -> Result<()> {
        self.open_local_table()?;
        if self.state == SymbolState::LocalSymbolsWithImportsOnly {
            self.symbols.set_field_name(SYMBOLS_SYMBOL_ID.into())?;
            self.symbols.step_in(IonType::List)?;
            self.state = SymbolState::LocalSymbols;
        }
        Ok(())
    }

    fn close_local_table(&mut self) -> Result<()> {
        match self.state {
            SymbolState::LocalSymbols => {
                self.symbols.step_out()?;
                self.symbols.step_out()?;
            }
            SymbolState::LocalSymbolsWithImportsOnly => self.symbols.step_out()?,
            SymbolState::SystemSymbols | SymbolState::LocalSymbolsFlushed => return Ok(()),
        }
        self.state = SymbolState::LocalSymbolsFlushed;
        Ok(())
    }
}

impl<W: Write> IonWriter for BinaryWriter<W> {
    fn set_field_name(&mut self, name: SymbolToken) -> Result<()> {
        let sid = self.token_sid(&name)?;
        self.user.set_field_name(sid.into())
    }

    fn add_annotation(&mut self, annotation: SymbolToken) -> Result<()> {
        let sid = self.token_sid(&annotation)?;
        self.user.add_annotation(sid.into())
    }

    fn write_null(&mut self, ion_type: IonType) -> Result<()> {
        self.user.write_null(ion_type)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.user.write_bool(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.user.write_i64(value)
    }

    fn write_integer(&mut self, value: &Integer) -> Result<()> {
        self.user.write_integer(value)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.user.write_f64(value)
    }

    fn write_decimal(&mut self, value: &Decimal) -> Result<()> {
        self.user.write_decimal(value)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> Result<()> {
        self.user.write_timestamp(value)
    }

    fn write_symbol(&mut self, value: SymbolToken) -> Result<()> {
        let sid = self.token_sid(&value)?;
        self.user.write_symbol(sid.into())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.user.write_string(value)
    }

    fn write_clob(&mut self, value: &[u8]) -> Result<()> {
        self.user.write_clob(value)
    }

    fn write_blob(&mut self, value: &[u8]) -> Result<()> {
        self.user.write_blob(value)
    }

    fn step_in(&mut self, container: IonType) -> Result<()> {
        self.user.step_in(container)
    }

    fn step_out(&mut self) -> Result<()> {
        self.user.step_out()
    }

    fn depth(&self) -> usize {
        self.user.depth()
    }

    fn flush(&mut self) -> Result<()> {
        if self.user.depth() > 0 {
            return Err(UsageError::FlushInsideContainer(self.user.depth()).into());
        }
        // Taken first so pending annotations fail the flush before anything reaches the sink.
        let user_segments = self.user.take_buffered()?;
        let table_open = matches!(
            self.state,
            SymbolState::LocalSymbolsWithImportsOnly | SymbolState::LocalSymbols
        );
        if !table_open && user_segments.iter().all(Vec::is_empty) {
            return Ok(());
        }
        self.close_local_table()?;
        let table_segments = self.symbols.take_buffered()?;

        let sink = self.user.sink_mut();
        if self.needs_version_marker {
            sink.write_all(&BVM_1_0)?;
            self.needs_version_marker = false;
        }
        let mut table_length = 0;
        for segment in table_segments {
            table_length += segment.len();
            sink.write_all(&segment)?;
        }
        debug!(
            "flushed {} bytes of symbol table, max_id {}",
            table_length,
            self.table.max_id()
        );
        for segment in user_segments {
            sink.write_all(&segment)?;
        }
        sink.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()?;
        self.table = SymbolTable::local(self.imports.clone());
        self.state = SymbolState::SystemSymbols;
        self.needs_version_marker = true;
        Ok(())
    }
}
