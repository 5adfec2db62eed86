//! File identifier sniffing.
//!
//! Token files open with `% DBTEX <version> <charset>` or
//! `% DTLTEX <version> <charset>`. The identifier decides which grammar
//! applies and which charset decodes the rest of the file. An unknown
//! charset name or version degrades to a warning and the configured
//! default; a missing identifier is a hard error.

use std::sync::LazyLock;

use datatool_model::{FileFormat, FormatVersion, IoSettings};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::warn;

use crate::error::{DbtexError, Result};

static FILE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^% (DBTEX|DTLTEX) ([0-9.]+) ([a-zA-Z0-9\-]+)\s*$")
        .unwrap_or_else(|_| unreachable!())
});

/// The sniffed identity of a token file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdent {
    pub format: FileFormat,
    pub version: FormatVersion,
    pub encoding: &'static Encoding,
}

impl FileIdent {
    /// Parses the identifier line. Falls back to the settings' version
    /// on an unrecognized version string, and to UTF-8 on an unknown
    /// charset name.
    pub fn sniff(first_line: &str, settings: &IoSettings) -> Result<Self> {
        let captures = FILE_IDENTIFIER
            .captures(first_line)
            .ok_or(DbtexError::MissingIdentifier)?;
        let format = match &captures[1] {
            "DBTEX" => FileFormat::Dbtex,
            _ => FileFormat::Dtltex,
        };
        let version = match &captures[2] {
            "2.0" => FormatVersion::V2,
            "3.0" => FormatVersion::V3,
            other => {
                warn!(version = other, "unsupported format version, assuming configured version");
                settings.version
            }
        };
        let charset = &captures[3];
        let encoding = match Encoding::for_label(charset.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                warn!(charset, "unknown charset in file identifier, using utf-8");
                UTF_8
            }
        };
        Ok(Self {
            format,
            version,
            encoding,
        })
    }

    /// Renders the identifier line for writing.
    pub fn header_line(format: FileFormat, version: FormatVersion) -> String {
        let tag = match format {
            FileFormat::Dtltex => "DTLTEX",
            _ => "DBTEX",
        };
        format!("% {tag} {} utf-8", version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_format_version_and_charset() {
        let settings = IoSettings::default();
        let ident = FileIdent::sniff("% DBTEX 3.0 utf-8", &settings).unwrap();
        assert_eq!(ident.format, FileFormat::Dbtex);
        assert_eq!(ident.version, FormatVersion::V3);
        assert_eq!(ident.encoding, UTF_8);

        let ident = FileIdent::sniff("% DTLTEX 2.0 latin1", &settings).unwrap();
        assert_eq!(ident.format, FileFormat::Dtltex);
        assert_eq!(ident.version, FormatVersion::V2);
        assert_eq!(ident.encoding.name(), "windows-1252");
    }

    #[test]
    fn unknown_charset_degrades_to_utf8() {
        let settings = IoSettings::default();
        let ident = FileIdent::sniff("% DBTEX 3.0 no-such-charset", &settings).unwrap();
        assert_eq!(ident.encoding, UTF_8);
    }

    #[test]
    fn unknown_version_uses_configured() {
        let mut settings = IoSettings::default();
        settings.version = FormatVersion::V2;
        let ident = FileIdent::sniff("% DBTEX 9.9 utf-8", &settings).unwrap();
        assert_eq!(ident.version, FormatVersion::V2);
    }

    #[test]
    fn missing_identifier_is_an_error() {
        let settings = IoSettings::default();
        assert!(matches!(
            FileIdent::sniff(r"\DTLnewdb{marks}", &settings),
            Err(DbtexError::MissingIdentifier)
        ));
    }
}
