//! CSV/TSV writing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use datatool_core::NumericFormat;
use datatool_model::{AddDelimiter, Database, EscapeChars, IoSettings, Overwrite};
use tracing::warn;

use crate::error::{CsvError, Result};

/// Writes a [`Database`] as delimited text.
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    settings: IoSettings,
    format: NumericFormat,
}

impl CsvWriter {
    pub fn new(settings: IoSettings) -> Self {
        Self {
            settings,
            format: NumericFormat::default(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: NumericFormat) -> Self {
        self.format = format;
        self
    }

    /// Writes to a file, honoring the overwrite policy when the target
    /// already exists.
    pub fn write_path(&self, db: &Database, path: &Path) -> Result<()> {
        if path.exists() {
            match self.settings.overwrite {
                Overwrite::Error => {
                    return Err(CsvError::OverwriteForbidden(path.to_path_buf()));
                }
                Overwrite::Warn => warn!(file = %path.display(), "overwriting existing file"),
                Overwrite::Allow => {}
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(db, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, db: &Database, writer: &mut W) -> Result<()> {
        let max_column = db.max_column_index();
        if self.settings.include_header {
            let titles: Vec<String> = (1..=max_column)
                .map(|column| {
                    let title = db
                        .header_by_index(column)
                        .map(|h| h.display_title().to_string())
                        .unwrap_or_default();
                    self.prepare_cell(&title)
                })
                .collect();
            write_row(writer, &titles, self.settings.separator)?;
        }
        for row in db.rows() {
            let cells: Vec<String> = (1..=max_column)
                .map(|column| {
                    let text = row
                        .cell(column)
                        .map(|datum| datum.text(&self.format))
                        .unwrap_or_default();
                    self.prepare_cell(&text)
                })
                .collect();
            write_row(writer, &cells, self.settings.separator)?;
        }
        Ok(())
    }

    /// Escapes one cell and wraps it in delimiters when the policy asks
    /// for that.
    fn prepare_cell(&self, content: &str) -> String {
        let separator = self.settings.separator;
        let delimiter = self.settings.delimiter;
        let escape = self.settings.escape_chars;

        let mut needs_delimiting = false;
        let mut out = String::with_capacity(content.len());
        for c in content.chars() {
            if c == separator {
                needs_delimiting = true;
                out.push(c);
            } else if c == delimiter {
                match escape {
                    EscapeChars::None => out.push(c),
                    EscapeChars::DoubleDelim => {
                        // Doubling is only read back inside a delimited
                        // cell, so force the wrap.
                        needs_delimiting = true;
                        out.push(c);
                        out.push(c);
                    }
                    EscapeChars::Delim | EscapeChars::DelimAndBackslash => {
                        out.push('\\');
                        out.push(c);
                    }
                }
            } else if c == '\\' && escape == EscapeChars::DelimAndBackslash {
                out.push('\\');
                out.push('\\');
            } else if matches!(c, '\n' | '\r' | '\x0c') {
                if self.settings.add_delimiter == AddDelimiter::Never {
                    out.push(' ');
                } else {
                    needs_delimiting = true;
                    out.push(c);
                }
            } else {
                out.push(c);
            }
        }

        let wrap = match self.settings.add_delimiter {
            AddDelimiter::Always => true,
            AddDelimiter::Never => false,
            AddDelimiter::Detect => needs_delimiting,
        };
        if wrap {
            format!("{delimiter}{out}{delimiter}")
        } else {
            out
        }
    }
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], separator: char) -> Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            write!(writer, "{separator}")?;
        }
        write!(writer, "{cell}")?;
        first = false;
    }
    writeln!(writer)?;
    Ok(())
}

/// Writes a database with default settings.
pub fn write_csv(db: &Database, path: &Path) -> Result<()> {
    CsvWriter::new(IoSettings::default()).write_path(db, path)
}
