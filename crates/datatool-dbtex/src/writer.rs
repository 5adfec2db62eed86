//! Writing databases in the persisted token formats.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use datatool_core::{Datum, DatumType, NumericFormat};
use datatool_model::{
    DataHeader, Database, FileFormat, FormatVersion, IoSettings, Overwrite,
};
use tracing::warn;

use crate::error::{DbtexError, Result};
use crate::ident::FileIdent;

/// Writes a [`Database`] as dbtex or dtltex.
#[derive(Debug, Clone)]
pub struct DbtexWriter {
    settings: IoSettings,
    format: NumericFormat,
}

impl DbtexWriter {
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

    /// Writes to a file, honoring the overwrite policy.
    pub fn write_path(&self, db: &Database, path: &Path) -> Result<()> {
        if path.exists() {
            match self.settings.overwrite {
                Overwrite::Error => {
                    return Err(DbtexError::OverwriteForbidden(path.to_path_buf()));
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
        match (self.settings.format, self.settings.version) {
            (FileFormat::Dbtex, FormatVersion::V3) => self.write_dbtex_v3(db, writer),
            (FileFormat::Dbtex, FormatVersion::V2) => self.write_dbtex_v2(db, writer),
            (FileFormat::Dtltex, FormatVersion::V3) => self.write_dtltex_v3(db, writer),
            (FileFormat::Dtltex, FormatVersion::V2) => self.write_dtltex_v2(db, writer),
            (other, _) => Err(DbtexError::NotTokenFormat(other)),
        }
    }

    fn write_dbtex_v3<W: Write>(&self, db: &Database, w: &mut W) -> Result<()> {
        let name = db.name();
        writeln!(
            w,
            "{}",
            FileIdent::header_line(FileFormat::Dbtex, FormatVersion::V3)
        )?;
        writeln!(w, "\\DTLdbProvideData{{{name}}}%")?;
        writeln!(w, "\\DTLreconstructdata")?;

        writeln!(w, "{{% Header")?;
        for header in sorted_headers(db) {
            writeln!(
                w,
                "\\dtl@db@header@reconstruct{{{}}}{{{}}}{{{}}}{{{}}}%",
                header.index(),
                header.key(),
                header.datum_type().id(),
                header.display_title()
            )?;
        }
        writeln!(w, "}}% End of Header")?;

        writeln!(w, "{{% Content")?;
        for row in db.rows() {
            let index = row.index();
            writeln!(w, "% Row {index}")?;
            writeln!(w, "\\dtl@db@row@reconstruct{{{index}}}%")?;
            writeln!(w, "{{% Row {index} Content")?;
            for (column, datum) in row.cells() {
                writeln!(w, "  \\dtl@db@col@reconstruct{{{column}}}% Column {column}")?;
                writeln!(w, "  {{% Column {column} Content")?;
                self.write_v3_value(datum, w)?;
                writeln!(w, "  }}% End of Column {column}")?;
            }
            writeln!(w, "}}% End of Row {index}")?;
        }
        writeln!(w, "}}% End of Content")?;

        writeln!(w, "{{{}}}% Number of rows", db.row_count())?;
        writeln!(w, "{{{}}}% Number of columns", db.column_count())?;

        writeln!(w, "{{% Key to index")?;
        for header in sorted_headers(db) {
            writeln!(
                w,
                "\\dtl@db@reconstruct@keyindex{{{}}}{{{}}}%",
                header.key(),
                header.index()
            )?;
        }
        writeln!(w, "}}% End of key to index")?;
        Ok(())
    }

    fn write_v3_value<W: Write>(&self, datum: &Datum, w: &mut W) -> Result<()> {
        match datum {
            Datum::Unknown => writeln!(w, "\\dtl@db@value@reconstruct{{}}%")?,
            Datum::String { text } => {
                writeln!(w, "\\dtl@db@value@reconstruct{{{text}}}%")?;
            }
            _ => {
                let text = datum.text(&self.format);
                let number = number_text(datum);
                let symbol = datum.currency_symbol().unwrap_or_default();
                writeln!(
                    w,
                    "\\dtl@db@datum@reconstruct{{{text}}}{{{number}}}{{{symbol}}}{{{}}}%",
                    datum.datum_type().id()
                )?;
            }
        }
        Ok(())
    }

    fn write_dbtex_v2<W: Write>(&self, db: &Database, w: &mut W) -> Result<()> {
        let name = db.name();
        writeln!(
            w,
            "{}",
            FileIdent::header_line(FileFormat::Dbtex, FormatVersion::V2)
        )?;
        writeln!(w, "\\bgroup\\makeatletter")?;

        writeln!(w, "\\expandafter\\global\\expandafter")?;
        writeln!(w, "\\newtoks\\csname dtlkeys@{name}\\endcsname")?;
        writeln!(w, "\\expandafter\\global")?;
        writeln!(w, "\\csname dtlkeys@{name}\\endcsname={{%")?;
        for header in sorted_headers(db) {
            writeln!(w, "\\db@plist@elt@w %")?;
            writeln!(w, "\\db@col@id@w {}%", header.index())?;
            writeln!(w, "\\db@col@id@end@ %")?;
            writeln!(w, "\\db@key@id@w {}%", header.key())?;
            writeln!(w, "\\db@key@id@end@ %")?;
            writeln!(w, "\\db@type@id@w {}%", v2_type_id(header.datum_type()))?;
            writeln!(w, "\\db@type@id@end@ %")?;
            writeln!(w, "\\db@header@id@w {}%", header.display_title())?;
            writeln!(w, "\\db@header@id@end@ %")?;
            writeln!(w, "\\db@col@id@w {}%", header.index())?;
            writeln!(w, "\\db@col@id@end@ %")?;
            writeln!(w, "\\db@plist@elt@end@ %")?;
        }
        writeln!(w, "}}%")?;

        writeln!(w, "\\expandafter\\global\\expandafter")?;
        writeln!(w, "\\newtoks\\csname dtldb@{name}\\endcsname")?;
        writeln!(w, "\\expandafter\\global")?;
        writeln!(w, "\\csname dtldb@{name}\\endcsname={{%")?;
        for row in db.rows() {
            let index = row.index();
            writeln!(w, "\\db@row@elt@w %")?;
            writeln!(w, "\\db@row@id@w {index}%")?;
            writeln!(w, "\\db@row@id@end@ %")?;
            for (column, datum) in row.cells() {
                writeln!(w, "\\db@col@id@w {column}%")?;
                writeln!(w, "\\db@col@id@end@ %")?;
                writeln!(w, "\\db@col@elt@w {}%", datum.text(&self.format))?;
                writeln!(w, "\\db@col@elt@end@ %")?;
                writeln!(w, "\\db@col@id@w {column}%")?;
                writeln!(w, "\\db@col@id@end@ %")?;
            }
            writeln!(w, "\\db@row@id@w {index}%")?;
            writeln!(w, "\\db@row@id@end@ %")?;
            writeln!(w, "\\db@row@elt@end@ %")?;
        }
        writeln!(w, "}}%")?;

        writeln!(w, "\\expandafter\\global")?;
        writeln!(w, "\\expandafter\\newcount\\csname dtlrows@{name}\\endcsname")?;
        writeln!(
            w,
            "\\global\\csname dtlrows@{name}\\endcsname={}\\relax",
            db.row_count()
        )?;
        writeln!(w, "\\expandafter\\global")?;
        writeln!(w, "\\expandafter\\newcount\\csname dtlcols@{name}\\endcsname")?;
        writeln!(
            w,
            "\\global\\csname dtlcols@{name}\\endcsname={}\\relax",
            db.column_count()
        )?;
        for header in sorted_headers(db) {
            writeln!(
                w,
                "\\expandafter\\gdef\\csname dtl@ci@{name}@{}\\endcsname{{{}}}%",
                header.key(),
                header.index()
            )?;
        }
        writeln!(w, "\\def\\dtllastloadeddb{{{name}}}%")?;
        writeln!(w, "\\egroup")?;
        Ok(())
    }

    fn write_dtltex_v3<W: Write>(&self, db: &Database, w: &mut W) -> Result<()> {
        writeln!(
            w,
            "{}",
            FileIdent::header_line(FileFormat::Dtltex, FormatVersion::V3)
        )?;
        writeln!(w, "\\DTLdbProvideData{{{}}}%", db.name())?;
        for header in sorted_headers(db) {
            writeln!(
                w,
                "\\DTLdbSetHeader{{{}}}{{{}}}%",
                header.key(),
                header.display_title()
            )?;
        }
        for row in db.rows() {
            writeln!(w, "\\DTLdbNewRow%")?;
            for (column, datum) in row.cells() {
                if let Some(header) = db.header_by_index(column) {
                    writeln!(
                        w,
                        "\\DTLdbNewEntry{{{}}}{{{}}}%",
                        header.key(),
                        datum.text(&self.format)
                    )?;
                }
            }
        }
        Ok(())
    }

    fn write_dtltex_v2<W: Write>(&self, db: &Database, w: &mut W) -> Result<()> {
        let name = db.name();
        writeln!(
            w,
            "{}",
            FileIdent::header_line(FileFormat::Dtltex, FormatVersion::V2)
        )?;
        writeln!(w, "\\DTLnewdb{{{name}}}")?;
        for header in sorted_headers(db) {
            writeln!(
                w,
                "\\DTLsetheader{{{name}}}{{{}}}{{{}}}",
                header.key(),
                header.display_title()
            )?;
        }
        for row in db.rows() {
            writeln!(w, "\\DTLnewrow{{{name}}}")?;
            for (column, datum) in row.cells() {
                if let Some(header) = db.header_by_index(column) {
                    writeln!(
                        w,
                        "\\DTLnewdbentry{{{name}}}{{{}}}{{{}}}",
                        header.key(),
                        datum.text(&self.format)
                    )?;
                }
            }
        }
        writeln!(w, "\\def\\dtllastloadeddb{{{name}}}")?;
        Ok(())
    }
}

/// Headers in column-index order.
fn sorted_headers(db: &Database) -> Vec<&DataHeader> {
    let mut headers: Vec<&DataHeader> = db.headers().iter().collect();
    headers.sort_by_key(|h| h.index());
    headers
}

/// Canonical numeric payload for the v3 datum marker.
fn number_text(datum: &Datum) -> String {
    match datum {
        Datum::Integer { value, .. } => value.to_string(),
        Datum::Date { julian_day, .. } => julian_day.to_string(),
        Datum::Decimal { value, .. } | Datum::Currency { value, .. } => format!("{value}"),
        Datum::DateTime { julian_date, .. } => format!("{julian_date}"),
        Datum::Time { julian_time, .. } => format!("{julian_time}"),
        Datum::Unknown | Datum::String { .. } => String::new(),
    }
}

/// The legacy format only knows the first five type ids; temporal types
/// are declared as plain decimals and regain their kind on re-coercion.
fn v2_type_id(datum_type: DatumType) -> i8 {
    if datum_type.id() > DatumType::Currency.id() {
        DatumType::Decimal.id()
    } else {
        datum_type.id()
    }
}
