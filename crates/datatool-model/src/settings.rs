//! I/O settings.
//!
//! [`IoSettings`] is the run-time configuration for reading and writing
//! databases: file format and version, separator and delimiter characters,
//! header handling, escape and blank-row policies, overwrite behavior, and
//! load action. Settings can be assembled programmatically with the
//! builder methods or from `key=value` pairs via [`IoSettings::apply_option`];
//! unknown keys and unrecognized values are rejected as named errors.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// On-disk file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    #[default]
    Csv,
    Tsv,
    Dbtex,
    Dtltex,
}

impl FileFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Dbtex => "dbtex",
            Self::Dtltex => "dtltex",
        }
    }

    pub fn is_delimited_text(self) -> bool {
        matches!(self, Self::Csv | Self::Tsv)
    }
}

/// Version of the persisted token formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatVersion {
    V2,
    #[default]
    V3,
}

impl FormatVersion {
    /// Version string as written in the file identifier line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "2.0",
            Self::V3 => "3.0",
        }
    }
}

/// How delimiters inside cell content are escaped in delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscapeChars {
    /// No escaping; delimiters in content pass through.
    None,
    /// A doubled delimiter inside a quoted field is a literal delimiter.
    #[default]
    DoubleDelim,
    /// Backslash before the delimiter.
    Delim,
    /// Backslash before the delimiter and before a literal backslash.
    DelimAndBackslash,
}

/// What to do with blank rows in delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CsvBlank {
    /// Skip blank rows.
    #[default]
    Ignore,
    /// Keep blank rows as empty data rows.
    EmptyRow,
    /// A blank row ends the file.
    End,
}

/// How cell content is interpreted in delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CsvContent {
    Tex,
    #[default]
    Literal,
}

/// Whether cells are wrapped in delimiters on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddDelimiter {
    Always,
    Never,
    /// Wrap only cells that contain the separator or a line break.
    #[default]
    Detect,
}

/// Behavior when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overwrite {
    #[default]
    Error,
    Warn,
    Allow,
}

/// Expansion applied to cell content before writing. Cells are plain
/// text here, so `Protected` and `Full` are accepted and recorded but do
/// not transform content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expand {
    #[default]
    None,
    Protected,
    Full,
}

/// What loading does when the target database already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadAction {
    /// Error if the database exists.
    #[default]
    Create,
    /// Append to the database if it exists, otherwise create it.
    Detect,
    /// Append; the database must be appendable or will be created.
    Append,
}

impl LoadAction {
    pub fn allows_append(self) -> bool {
        matches!(self, Self::Detect | Self::Append)
    }
}

/// Run-time I/O configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSettings {
    pub name: Option<String>,
    pub format: FileFormat,
    pub version: FormatVersion,
    pub separator: char,
    pub delimiter: char,
    pub include_header: bool,
    pub escape_chars: EscapeChars,
    pub csv_blank: CsvBlank,
    pub csv_content: CsvContent,
    pub add_delimiter: AddDelimiter,
    pub overwrite: Overwrite,
    pub expand: Expand,
    pub load_action: LoadAction,
    pub skip_lines: u32,
    pub trim: bool,
    pub strict_quotes: bool,
    pub auto_keys: bool,
    /// Explicit column keys, matched by position.
    pub keys: Vec<String>,
    /// Explicit column titles, matched by position.
    pub headers: Vec<String>,
    /// Stem for generated column keys.
    pub default_key: String,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self {
            name: None,
            format: FileFormat::Csv,
            version: FormatVersion::V3,
            separator: ',',
            delimiter: '"',
            include_header: true,
            escape_chars: EscapeChars::DoubleDelim,
            csv_blank: CsvBlank::Ignore,
            csv_content: CsvContent::Literal,
            add_delimiter: AddDelimiter::Detect,
            overwrite: Overwrite::Error,
            expand: Expand::None,
            load_action: LoadAction::Create,
            skip_lines: 0,
            trim: true,
            strict_quotes: false,
            auto_keys: false,
            keys: Vec::new(),
            headers: Vec::new(),
            default_key: "Column".to_string(),
        }
    }
}

impl IoSettings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.set_format(format);
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    /// Sets the format; selecting TSV switches the separator to a tab.
    pub fn set_format(&mut self, format: FileFormat) {
        self.format = format;
        if format == FileFormat::Tsv {
            self.separator = '\t';
        }
    }

    /// Applies one `key=value` option pair.
    pub fn apply_option(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || ModelError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "name" => self.name = Some(value.to_string()),
            "keys" => self.keys = split_list(value),
            "headers" => self.headers = split_list(value),
            "default-key" => self.default_key = value.to_string(),
            "format" => match value {
                "csv" => self.set_format(FileFormat::Csv),
                "tsv" => self.set_format(FileFormat::Tsv),
                "dbtex" => self.set_format(FileFormat::Dbtex),
                "dbtex-2" => {
                    self.set_format(FileFormat::Dbtex);
                    self.version = FormatVersion::V2;
                }
                "dbtex-3" => {
                    self.set_format(FileFormat::Dbtex);
                    self.version = FormatVersion::V3;
                }
                "dtltex" => self.set_format(FileFormat::Dtltex),
                "dtltex-2" => {
                    self.set_format(FileFormat::Dtltex);
                    self.version = FormatVersion::V2;
                }
                "dtltex-3" => {
                    self.set_format(FileFormat::Dtltex);
                    self.version = FormatVersion::V3;
                }
                _ => return Err(invalid()),
            },
            "separator" => self.separator = single_char(value).ok_or_else(invalid)?,
            "delimiter" => self.delimiter = single_char(value).ok_or_else(invalid)?,
            "csv-escape-chars" => {
                self.escape_chars = match value {
                    "none" => EscapeChars::None,
                    "double-delim" => EscapeChars::DoubleDelim,
                    "delim" => EscapeChars::Delim,
                    "delim+bksl" => EscapeChars::DelimAndBackslash,
                    _ => return Err(invalid()),
                };
            }
            "csv-blank" => {
                self.csv_blank = match value {
                    "ignore" => CsvBlank::Ignore,
                    "empty-row" => CsvBlank::EmptyRow,
                    "end" => CsvBlank::End,
                    _ => return Err(invalid()),
                };
            }
            "csv-content" => {
                self.csv_content = match value {
                    "tex" => CsvContent::Tex,
                    "literal" => CsvContent::Literal,
                    _ => return Err(invalid()),
                };
            }
            "add-delimiter" => {
                self.add_delimiter = match value {
                    "always" => AddDelimiter::Always,
                    "never" => AddDelimiter::Never,
                    "detect" => AddDelimiter::Detect,
                    _ => return Err(invalid()),
                };
            }
            "overwrite" => {
                self.overwrite = match value {
                    "error" => Overwrite::Error,
                    "warn" => Overwrite::Warn,
                    "allow" => Overwrite::Allow,
                    _ => return Err(invalid()),
                };
            }
            "expand" => {
                self.expand = match value {
                    "none" => Expand::None,
                    "protected" => Expand::Protected,
                    "full" => Expand::Full,
                    _ => return Err(invalid()),
                };
            }
            "load-action" => {
                self.load_action = match value {
                    "detect" => LoadAction::Detect,
                    "append" => LoadAction::Append,
                    "create" | "old-style" => LoadAction::Create,
                    _ => return Err(invalid()),
                };
            }
            "csv-skip-lines" | "omitlines" => {
                self.skip_lines = value.parse().map_err(|_| invalid())?;
            }
            "no-header" | "noheader" => self.include_header = !parse_bool(value).ok_or_else(invalid)?,
            "auto-keys" | "autokeys" => self.auto_keys = parse_bool(value).ok_or_else(invalid)?,
            "trim" => self.trim = parse_bool(value).ok_or_else(invalid)?,
            "strict-quotes" => self.strict_quotes = parse_bool(value).ok_or_else(invalid)?,
            _ => {
                return Err(ModelError::UnknownOption {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Applies a sequence of `key=value` strings; a pair without `=`
    /// takes the empty value (bool-like options treat that as true).
    pub fn apply_options<'a, I: IntoIterator<Item = &'a str>>(&mut self, pairs: I) -> Result<()> {
        for pair in pairs {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.apply_option(key.trim(), value.trim())?;
        }
        Ok(())
    }

    /// The configured key for a 1-based column index, falling back to
    /// the generated default key.
    pub fn key_for_column(&self, column: u32) -> String {
        self.keys
            .get(column as usize - 1)
            .filter(|key| !key.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("{}{column}", self.default_key))
    }
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    let c = chars.next()?;
    if chars.next().is_some() { None } else { Some(c) }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
