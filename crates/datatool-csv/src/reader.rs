//! CSV/TSV reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use datatool_core::DatumCoercer;
use datatool_model::{
    CsvBlank, DataContext, DataHeader, Database, IoSettings, LoadSummary, ModelError,
};
use tracing::info;

use crate::error::{CsvError, Result};
use crate::tokenizer::{RowScanner, is_blank_row};

/// Reads delimited text into a [`Database`].
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    settings: IoSettings,
    coercer: DatumCoercer,
}

impl CsvReader {
    pub fn new(settings: IoSettings) -> Self {
        Self {
            settings,
            coercer: DatumCoercer::default(),
        }
    }

    #[must_use]
    pub fn with_coercer(mut self, coercer: DatumCoercer) -> Self {
        self.coercer = coercer;
        self
    }

    /// Reads a file into a new database. The database name comes from
    /// the settings, falling back to the file stem.
    pub fn read_path(&self, path: &Path) -> Result<Database> {
        let name = self.database_name(path);
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => CsvError::FileNotFound(path.to_path_buf()),
            _ => CsvError::Io(err),
        })?;
        self.read_from(BufReader::new(file), &name)
    }

    /// Reads from any buffered source into a new database.
    pub fn read_from<R: BufRead>(&self, reader: R, name: &str) -> Result<Database> {
        let mut db = Database::new(name);
        let mut scanner = RowScanner::new(&self.settings);
        let mut header_done = !self.settings.include_header;

        let mut physical = 0u32;
        let mut ended = false;
        for line in reader.lines() {
            let line = line?;
            physical += 1;
            if physical <= self.settings.skip_lines {
                continue;
            }
            let Some(cells) = scanner.feed_line(&line) else {
                continue;
            };
            if self.handle_row(&mut db, cells, &mut header_done)? {
                ended = true;
                break;
            }
        }
        if !ended {
            if let Some(cells) = scanner.finish()? {
                self.handle_row(&mut db, cells, &mut header_done)?;
            }
        }
        Ok(db)
    }

    /// Loads a file into the context, creating the database or appending
    /// to it when the load action allows that.
    pub fn load_into(&self, context: &mut DataContext, path: &Path) -> Result<LoadSummary> {
        let name = self.database_name(path);
        let loaded = self.read_path(path)?;
        if context.contains(&name) {
            if !self.settings.load_action.allows_append() {
                return Err(ModelError::DatabaseExists(name).into());
            }
            context.get_mut(&name)?.append_rows_from(&loaded)?;
        } else {
            context.insert(loaded)?;
        }
        let db = context.get(&name)?;
        let summary = LoadSummary {
            database: name,
            columns: db.column_count(),
            rows: db.row_count(),
        };
        info!(
            database = %summary.database,
            file = %path.display(),
            columns = summary.columns,
            rows = summary.rows,
            "loaded database"
        );
        Ok(summary)
    }

    /// Returns true when the blank-row policy ends the file.
    fn handle_row(
        &self,
        db: &mut Database,
        cells: Vec<String>,
        header_done: &mut bool,
    ) -> Result<bool> {
        if is_blank_row(&cells) {
            return Ok(match self.settings.csv_blank {
                CsvBlank::Ignore => false,
                CsvBlank::End => true,
                CsvBlank::EmptyRow => {
                    // Blank rows never become the header row.
                    if *header_done {
                        db.new_row();
                    }
                    false
                }
            });
        }
        if !*header_done {
            self.apply_header_row(db, &cells)?;
            *header_done = true;
        } else {
            self.append_data_row(db, &cells)?;
        }
        Ok(false)
    }

    fn apply_header_row(&self, db: &mut Database, cells: &[String]) -> Result<()> {
        for (i, cell) in cells.iter().enumerate() {
            let column = i as u32 + 1;
            let title = self
                .settings
                .headers
                .get(i)
                .filter(|t| !t.is_empty())
                .cloned()
                .or_else(|| {
                    let trimmed = cell.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                });
            let key = self.header_key(column, cell);
            let mut header = DataHeader::new(column, key);
            if let Some(title) = title {
                header = header.with_title(title);
            }
            db.insert_header(header)?;
        }
        Ok(())
    }

    /// Key resolution: generated when auto-keys is on, else the
    /// configured key for the position, else the cell's own text, else
    /// the generated default.
    fn header_key(&self, column: u32, cell: &str) -> String {
        if self.settings.auto_keys {
            return format!("{}{column}", self.settings.default_key);
        }
        if let Some(key) = self
            .settings
            .keys
            .get(column as usize - 1)
            .filter(|key| !key.is_empty())
        {
            return key.clone();
        }
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            format!("{}{column}", self.settings.default_key)
        } else {
            trimmed.to_string()
        }
    }

    fn append_data_row(&self, db: &mut Database, cells: &[String]) -> Result<()> {
        let pos = db.row_count();
        db.new_row();
        for (i, cell) in cells.iter().enumerate() {
            let column = i as u32 + 1;
            if db.header_by_index(column).is_none() {
                let key = self.settings.key_for_column(column);
                db.insert_header(DataHeader::new(column, key))?;
            }
            db.set_entry(pos, column, self.coercer.coerce(cell))?;
        }
        Ok(())
    }

    fn database_name(&self, path: &Path) -> String {
        self.settings
            .name
            .clone()
            .or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "data".to_string())
    }
}

/// Reads a file with default settings.
pub fn read_csv(path: &Path) -> Result<Database> {
    CsvReader::new(IoSettings::default()).read_path(path)
}
