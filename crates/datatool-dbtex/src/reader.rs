//! Reading the persisted token formats.

use std::fs;
use std::path::Path;

use datatool_core::DatumCoercer;
use datatool_model::{
    DataContext, Database, FileFormat, FormatVersion, IoSettings, LoadSummary, ModelError,
};
use tracing::{info, warn};

use crate::error::{DbtexError, Result};
use crate::ident::FileIdent;
use crate::lexer::tokenize;
use crate::parser::Parser;

/// Reads a dbtex or dtltex file into a [`Database`].
#[derive(Debug, Clone, Default)]
pub struct DbtexReader {
    settings: IoSettings,
    coercer: DatumCoercer,
}

impl DbtexReader {
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

    pub fn read_path(&self, path: &Path) -> Result<Database> {
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => DbtexError::FileNotFound(path.to_path_buf()),
            _ => DbtexError::Io(err),
        })?;
        self.read_bytes(&bytes)
    }

    /// Sniffs the identifier line, decodes the rest with the charset it
    /// names, and dispatches on format and version. A database name in
    /// the settings overrides the name stored in the file.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Database> {
        let line_end = bytes
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(bytes.len());
        let first_line = String::from_utf8_lossy(&bytes[..line_end]);
        let ident = FileIdent::sniff(first_line.trim_end(), &self.settings)?;

        let rest = bytes.get(line_end + 1..).unwrap_or_default();
        let (text, _, had_errors) = ident.encoding.decode(rest);
        if had_errors {
            warn!(
                charset = ident.encoding.name(),
                "malformed bytes for declared charset, replacement characters substituted"
            );
        }

        let tokens = tokenize(&text);
        let mut parser = Parser::new(&tokens, self.coercer.clone());
        let mut db = match (ident.format, ident.version) {
            (FileFormat::Dbtex, FormatVersion::V3) => parser.parse_dbtex_v3()?,
            (FileFormat::Dbtex, FormatVersion::V2) => parser.parse_dbtex_v2()?,
            (FileFormat::Dtltex, FormatVersion::V3) => parser.parse_dtltex_v3()?,
            (FileFormat::Dtltex, FormatVersion::V2) => parser.parse_dtltex_v2()?,
            (other, _) => return Err(DbtexError::NotTokenFormat(other)),
        };
        if let Some(name) = &self.settings.name {
            db.rename(name.clone());
        }
        Ok(db)
    }

    /// Loads a file into the context, creating or appending per the load
    /// action.
    pub fn load_into(&self, context: &mut DataContext, path: &Path) -> Result<LoadSummary> {
        let loaded = self.read_path(path)?;
        let name = loaded.name().to_string();
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
}

/// Reads a token file with default settings.
pub fn read_dbtex(path: &Path) -> Result<Database> {
    DbtexReader::new(IoSettings::default()).read_path(path)
}
