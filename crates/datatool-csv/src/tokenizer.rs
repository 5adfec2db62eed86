//! The delimited-text tokenizer.
//!
//! [`RowScanner`] consumes physical lines and assembles logical rows of
//! cells. State persists across lines: a delimited (quoted) field that is
//! still open at the end of a physical line continues on the next one,
//! with a line-break marker joining the fragments. [`RowScanner::feed_line`]
//! returns `None` until a logical row is complete.
//!
//! Inside a delimited field the closing delimiter is recognized by
//! look-ahead: delimiter at end of line completes the row, delimiter
//! before the separator completes the cell, a doubled delimiter is a
//! literal delimiter under the double-delim escape mode, and anything
//! else either keeps the delimiter as content or, under strict quotes,
//! ends the cell and discards the remaining text up to the separator.

use datatool_model::{CsvContent, EscapeChars, IoSettings};

use crate::error::{CsvError, Result};

/// Streaming row tokenizer.
#[derive(Debug, Clone)]
pub struct RowScanner {
    separator: char,
    delimiter: char,
    escape: EscapeChars,
    trim: bool,
    strict_quotes: bool,
    literal_content: bool,

    pending_row: Vec<String>,
    pending_cell: Option<String>,
    cell_quoted: bool,
    in_quotes: bool,
    skip_tail: bool,
}

impl RowScanner {
    pub fn new(settings: &IoSettings) -> Self {
        Self {
            separator: settings.separator,
            delimiter: settings.delimiter,
            escape: settings.escape_chars,
            trim: settings.trim,
            strict_quotes: settings.strict_quotes,
            literal_content: settings.csv_content == CsvContent::Literal,
            pending_row: Vec::new(),
            pending_cell: None,
            cell_quoted: false,
            in_quotes: false,
            skip_tail: false,
        }
    }

    /// True while a logical row is partially assembled.
    pub fn has_pending(&self) -> bool {
        self.in_quotes || self.pending_cell.is_some() || !self.pending_row.is_empty()
    }

    /// Feeds one physical line (without its line terminator). Returns the
    /// completed logical row, or `None` when the row continues.
    pub fn feed_line(&mut self, line: &str) -> Option<Vec<String>> {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if self.skip_tail {
                if c == self.separator {
                    self.commit_cell();
                    self.skip_tail = false;
                }
                continue;
            }

            if c == '\\'
                && matches!(
                    self.escape,
                    EscapeChars::Delim | EscapeChars::DelimAndBackslash
                )
            {
                match chars.peek() {
                    Some(&next) if next == self.delimiter => {
                        chars.next();
                        self.cell().push(next);
                    }
                    Some('\\') if self.escape == EscapeChars::DelimAndBackslash => {
                        chars.next();
                        self.cell().push('\\');
                    }
                    _ => self.cell().push('\\'),
                }
                continue;
            }

            if self.in_quotes {
                if c == self.delimiter {
                    match chars.peek() {
                        // Closing delimiter at end of line: row complete.
                        None => {
                            self.in_quotes = false;
                            self.commit_cell();
                            return Some(self.take_row());
                        }
                        Some(&next) if next == self.separator => {
                            chars.next();
                            self.in_quotes = false;
                            self.commit_cell();
                        }
                        Some(&next)
                            if next == self.delimiter
                                && self.escape == EscapeChars::DoubleDelim =>
                        {
                            chars.next();
                            self.cell().push(c);
                        }
                        Some(_) => {
                            if self.strict_quotes {
                                self.in_quotes = false;
                                self.skip_tail = true;
                            } else {
                                self.cell().push(c);
                            }
                        }
                    }
                } else {
                    self.cell().push(c);
                }
                continue;
            }

            if c == self.delimiter {
                let reopen = match &self.pending_cell {
                    None => true,
                    Some(content) => {
                        content.chars().all(char::is_whitespace) || self.strict_quotes
                    }
                };
                if reopen {
                    self.pending_cell = Some(String::new());
                    self.cell_quoted = true;
                    self.in_quotes = true;
                } else {
                    self.cell().push(c);
                }
            } else if c == self.separator {
                self.commit_cell();
            } else if c.is_whitespace() && self.pending_cell.is_none() && self.trim {
                // Leading whitespace dropped.
            } else {
                self.cell().push(c);
            }
        }

        // End of the physical line.
        if self.in_quotes {
            self.cell().push('\n');
            return None;
        }
        if self.skip_tail {
            self.skip_tail = false;
        }
        self.commit_cell();
        Some(self.take_row())
    }

    /// Call after the last line. Errors when a delimited field is still
    /// open; a complete scanner state yields nothing.
    pub fn finish(&mut self) -> Result<Option<Vec<String>>> {
        if self.in_quotes {
            return Err(CsvError::UnterminatedField);
        }
        if self.has_pending() {
            self.commit_cell();
            return Ok(Some(self.take_row()));
        }
        Ok(None)
    }

    fn cell(&mut self) -> &mut String {
        self.pending_cell.get_or_insert_with(String::new)
    }

    fn commit_cell(&mut self) {
        let mut content = self.pending_cell.take().unwrap_or_default();
        if !self.cell_quoted {
            if self.trim {
                content.truncate(content.trim_end().len());
            }
            if !self.literal_content {
                content = strip_outer_pair(content, self.delimiter);
            }
        }
        self.pending_row.push(content);
        self.cell_quoted = false;
    }

    fn take_row(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_row)
    }
}

/// True when every cell is empty or whitespace.
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|cell| cell.trim().is_empty())
}

fn strip_outer_pair(content: String, delimiter: char) -> String {
    let stripped = content
        .strip_prefix(delimiter)
        .and_then(|rest| rest.strip_suffix(delimiter));
    match stripped {
        Some(inner) => inner.to_string(),
        None => content,
    }
}
