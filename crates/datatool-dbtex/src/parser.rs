//! Recursive-descent reconstruction of databases from token streams.
//!
//! Four grammars share this module: dbtex v3 (the `\dtl@db@...@reconstruct`
//! marker blocks), dbtex v2 (the legacy `\db@...@w` token-register pairs),
//! and the dtltex v2/v3 assignment scripts. The v2 grammars bracket every
//! block with a *repeated* index pair; a disagreeing pair is a hard
//! structural error naming both markers.

use datatool_core::{Datum, DatumCoercer, DatumType};
use datatool_model::{DataHeader, Database};
use tracing::warn;

use crate::error::{DbtexError, Result};
use crate::lexer::Token;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    coercer: DatumCoercer,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], coercer: DatumCoercer) -> Self {
        Self {
            tokens,
            pos: 0,
            coercer,
        }
    }

    /// dbtex v3: `\DTLdbProvideData{name}` followed by
    /// `\DTLreconstructdata{header}{content}{rows}{cols}{keymap}`.
    pub fn parse_dbtex_v3(&mut self) -> Result<Database> {
        self.expect_cs("DTLdbProvideData")?;
        let name = self.group_text()?;
        let mut db = Database::new(name);
        self.expect_cs("DTLreconstructdata")?;

        // Header block.
        self.expect_begin()?;
        while !self.try_end() {
            self.expect_cs("dtl@db@header@reconstruct")?;
            let index = self.group_number()? as u32;
            let key = self.group_text()?;
            let type_id = self.group_number()?;
            let title = self.group_text()?;
            let datum_type = datum_type_from_id(type_id)?;
            let mut header = DataHeader::new(index, key).with_type(datum_type);
            if !title.is_empty() {
                header = header.with_title(title);
            }
            db.insert_header(header)?;
        }

        // Content block.
        self.expect_begin()?;
        while !self.try_end() {
            self.expect_cs("dtl@db@row@reconstruct")?;
            let row_index = positive_index(self.group_number()?)?;
            while db.row_count() < row_index {
                db.new_row();
            }
            self.expect_begin()?;
            while !self.try_end() {
                self.expect_cs("dtl@db@col@reconstruct")?;
                let column = self.group_number()? as u32;
                let datum = self.value_group()?;
                db.set_entry(row_index - 1, column, datum)?;
            }
        }

        // Declared counts, checked against what was reconstructed.
        let rows = self.group_number()? as usize;
        let columns = self.group_number()? as usize;
        if rows != db.row_count() || columns != db.column_count() {
            warn!(
                declared_rows = rows,
                declared_columns = columns,
                rows = db.row_count(),
                columns = db.column_count(),
                "declared counts disagree with reconstructed database"
            );
        }

        // Key to index map.
        self.expect_begin()?;
        while !self.try_end() {
            self.expect_cs("dtl@db@reconstruct@keyindex")?;
            let key = self.group_text()?;
            let index = self.group_number()? as u32;
            let actual = db.header(&key).map(DataHeader::index);
            if actual != Some(index) {
                return Err(DbtexError::MismatchedMarker {
                    expected: format!("\\dtl@db@reconstruct@keyindex{{{key}}}{{{index}}}"),
                    found: match actual {
                        Some(actual) => {
                            format!("\\dtl@db@reconstruct@keyindex{{{key}}}{{{actual}}}")
                        }
                        None => format!("no column `{key}`"),
                    },
                });
            }
        }
        Ok(db)
    }

    /// A v3 value group: either `\dtl@db@value@reconstruct{text}` or
    /// `\dtl@db@datum@reconstruct{text}{number}{symbol}{type}`.
    fn value_group(&mut self) -> Result<Datum> {
        self.expect_begin()?;
        let marker = self.next_cs()?;
        let datum = match marker.as_str() {
            "dtl@db@value@reconstruct" => {
                let text = self.group_text()?;
                if text.is_empty() {
                    Datum::Unknown
                } else {
                    Datum::String { text }
                }
            }
            "dtl@db@datum@reconstruct" => {
                let text = self.group_text()?;
                let number = self.group_text()?;
                let symbol = self.group_text()?;
                let type_id = self.group_number()?;
                reconstruct_datum(&text, &number, &symbol, type_id)?
            }
            other => {
                return Err(DbtexError::Expected {
                    expected: "\\dtl@db@value@reconstruct or \\dtl@db@datum@reconstruct"
                        .to_string(),
                    found: format!("\\{other}"),
                });
            }
        };
        self.expect_end()?;
        Ok(datum)
    }

    /// dbtex v2: token-register assignments for the header property list
    /// and the row list, located by the `dtlkeys@`/`dtldb@` register
    /// names; surrounding TeX plumbing is skipped.
    pub fn parse_dbtex_v2(&mut self) -> Result<Database> {
        let name = self.seek_register("dtlkeys@")?;
        let mut db = Database::new(name);
        while !self.try_end() {
            self.pop_v2_header(&mut db)?;
        }
        self.seek_register("dtldb@")?;
        while !self.try_end() {
            self.pop_v2_row(&mut db)?;
        }
        Ok(db)
    }

    fn pop_v2_header(&mut self, db: &mut Database) -> Result<()> {
        self.expect_cs("db@plist@elt@w")?;
        let index = self.bracketed_number("db@col@id@w", "db@col@id@end@")?;
        let key = self.text_until("db@key@id@w", "db@key@id@end@")?;
        let type_id = self.bracketed_number("db@type@id@w", "db@type@id@end@")?;
        let title = self.text_until("db@header@id@w", "db@header@id@end@")?;
        let index_again = self.bracketed_number("db@col@id@w", "db@col@id@end@")?;
        self.expect_cs("db@plist@elt@end@")?;
        if index != index_again {
            return Err(mismatched_pair(index, index_again));
        }
        let mut header =
            DataHeader::new(index as u32, key).with_type(datum_type_from_id(type_id)?);
        if !title.is_empty() {
            header = header.with_title(title);
        }
        db.insert_header(header)?;
        Ok(())
    }

    fn pop_v2_row(&mut self, db: &mut Database) -> Result<()> {
        self.expect_cs("db@row@elt@w")?;
        let row_index = positive_index(self.bracketed_number("db@row@id@w", "db@row@id@end@")?)?;
        while db.row_count() < row_index {
            db.new_row();
        }
        loop {
            let marker = self.next_cs()?;
            match marker.as_str() {
                "db@col@id@w" => {
                    let column = self.number_until("db@col@id@end@")?;
                    let content = self.text_until("db@col@elt@w", "db@col@elt@end@")?;
                    let column_again = self.bracketed_number("db@col@id@w", "db@col@id@end@")?;
                    if column != column_again {
                        return Err(mismatched_pair(column, column_again));
                    }
                    db.set_entry(row_index - 1, column as u32, self.coercer.coerce(&content))?;
                }
                "db@row@id@w" => {
                    let row_again = self.number_until("db@row@id@end@")? as usize;
                    self.expect_cs("db@row@elt@end@")?;
                    if row_index != row_again {
                        return Err(DbtexError::MismatchedMarker {
                            expected: format!("\\db@row@id@w {row_index}\\db@row@id@end@"),
                            found: format!("\\db@row@id@w {row_again}\\db@row@id@end@"),
                        });
                    }
                    return Ok(());
                }
                other => {
                    return Err(DbtexError::Expected {
                        expected: "\\db@col@id@w or \\db@row@id@w".to_string(),
                        found: format!("\\{other}"),
                    });
                }
            }
        }
    }

    /// dtltex v3: `\DTLdbProvideData{name}` then a script of
    /// `\DTLdbSetHeader`, `\DTLdbNewRow`, and `\DTLdbNewEntry`.
    pub fn parse_dtltex_v3(&mut self) -> Result<Database> {
        self.expect_cs("DTLdbProvideData")?;
        let name = self.group_text()?;
        let mut db = Database::new(name);
        loop {
            self.skip_blank();
            let Some(token) = self.next() else { break };
            let Token::ControlSeq(name) = token else {
                return Err(DbtexError::Expected {
                    expected: "a database command".to_string(),
                    found: token.describe(),
                });
            };
            match name.as_str() {
                "DTLdbNewRow" => {
                    db.new_row();
                }
                "DTLdbNewEntry" => {
                    let key = self.group_text()?;
                    let value = self.group_text()?;
                    db.push_entry(&key, self.coercer.coerce(&value))?;
                }
                "DTLdbSetHeader" => {
                    let key = self.group_text()?;
                    let title = self.group_text()?;
                    set_title(&mut db, &key, &title)?;
                }
                other => {
                    return Err(DbtexError::Expected {
                        expected: "\\DTLdbNewRow, \\DTLdbNewEntry or \\DTLdbSetHeader"
                            .to_string(),
                        found: format!("\\{other}"),
                    });
                }
            }
        }
        Ok(db)
    }

    /// dtltex v2: the old-style named commands, each repeating the
    /// database name.
    pub fn parse_dtltex_v2(&mut self) -> Result<Database> {
        self.expect_cs("DTLnewdb")?;
        let name = self.group_text()?;
        let mut db = Database::new(name);
        loop {
            self.skip_blank();
            let Some(token) = self.next() else { break };
            let Token::ControlSeq(cs) = token else {
                return Err(DbtexError::Expected {
                    expected: "a database command".to_string(),
                    found: token.describe(),
                });
            };
            match cs.as_str() {
                "DTLnewrow" => {
                    self.group_text()?;
                    db.new_row();
                }
                "DTLnewdbentry" => {
                    self.group_text()?;
                    let key = self.group_text()?;
                    let value = self.group_text()?;
                    db.push_entry(&key, self.coercer.coerce(&value))?;
                }
                "DTLsetheader" => {
                    self.group_text()?;
                    let key = self.group_text()?;
                    let title = self.group_text()?;
                    set_title(&mut db, &key, &title)?;
                }
                // Trailing `\def\dtllastloadeddb{name}`.
                "def" => {
                    self.next_cs()?;
                    self.group_text()?;
                }
                other => {
                    return Err(DbtexError::Expected {
                        expected: "\\DTLnewrow, \\DTLnewdbentry or \\DTLsetheader".to_string(),
                        found: format!("\\{other}"),
                    });
                }
            }
        }
        Ok(db)
    }

    // Token-stream plumbing.

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_blank(&mut self) {
        while self.tokens.get(self.pos).is_some_and(Token::is_blank_text) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self, expected: &str) -> Result<&'a Token> {
        self.skip_blank();
        self.next().ok_or_else(|| DbtexError::Expected {
            expected: expected.to_string(),
            found: "end of file".to_string(),
        })
    }

    fn next_cs(&mut self) -> Result<String> {
        match self.next_token("a control sequence")? {
            Token::ControlSeq(name) => Ok(name.clone()),
            other => Err(DbtexError::Expected {
                expected: "a control sequence".to_string(),
                found: other.describe(),
            }),
        }
    }

    fn expect_cs(&mut self, name: &str) -> Result<()> {
        match self.next_token(&format!("\\{name}"))? {
            Token::ControlSeq(found) if found == name => Ok(()),
            other => Err(DbtexError::Expected {
                expected: format!("\\{name}"),
                found: other.describe(),
            }),
        }
    }

    fn expect_begin(&mut self) -> Result<()> {
        match self.next_token("{")? {
            Token::BeginGroup => Ok(()),
            other => Err(DbtexError::Expected {
                expected: "{".to_string(),
                found: other.describe(),
            }),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.next_token("}")? {
            Token::EndGroup => Ok(()),
            other => Err(DbtexError::Expected {
                expected: "}".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// Consumes a closing brace if it is next.
    fn try_end(&mut self) -> bool {
        self.skip_blank();
        if matches!(self.tokens.get(self.pos), Some(Token::EndGroup)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// A balanced `{...}` group rendered back to text, trimmed.
    fn group_text(&mut self) -> Result<String> {
        self.expect_begin()?;
        let mut depth = 1usize;
        let mut out = String::new();
        loop {
            let Some(token) = self.next() else {
                return Err(DbtexError::Expected {
                    expected: "}".to_string(),
                    found: "end of file".to_string(),
                });
            };
            match token {
                Token::BeginGroup => {
                    depth += 1;
                    out.push('{');
                }
                Token::EndGroup => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out.trim().to_string());
                    }
                    out.push('}');
                }
                Token::ControlSeq(name) => {
                    out.push('\\');
                    out.push_str(name);
                }
                Token::Text(text) => out.push_str(text),
            }
        }
    }

    fn group_number(&mut self) -> Result<i64> {
        let text = self.group_text()?;
        text.parse().map_err(|_| DbtexError::InvalidNumber(text))
    }

    /// Text tokens between an opening marker and its `...@end@` partner.
    fn text_until(&mut self, open: &str, close: &str) -> Result<String> {
        self.expect_cs(open)?;
        let mut out = String::new();
        loop {
            let Some(token) = self.next() else {
                return Err(DbtexError::Expected {
                    expected: format!("\\{close}"),
                    found: "end of file".to_string(),
                });
            };
            match token {
                Token::ControlSeq(name) if name == close => {
                    return Ok(out.trim().to_string());
                }
                Token::ControlSeq(name) => {
                    out.push('\\');
                    out.push_str(name);
                }
                Token::Text(text) => out.push_str(text),
                Token::BeginGroup => out.push('{'),
                Token::EndGroup => out.push('}'),
            }
        }
    }

    fn number_until(&mut self, close: &str) -> Result<i64> {
        let mut out = String::new();
        loop {
            let Some(token) = self.next() else {
                return Err(DbtexError::Expected {
                    expected: format!("\\{close}"),
                    found: "end of file".to_string(),
                });
            };
            match token {
                Token::ControlSeq(name) if name == close => break,
                Token::Text(text) => out.push_str(text),
                other => {
                    return Err(DbtexError::Expected {
                        expected: "a number".to_string(),
                        found: other.describe(),
                    });
                }
            }
        }
        let text = out.trim().to_string();
        text.parse().map_err(|_| DbtexError::InvalidNumber(text))
    }

    fn bracketed_number(&mut self, open: &str, close: &str) -> Result<i64> {
        self.expect_cs(open)?;
        self.number_until(close)
    }

    /// Scans forward for the assignment `\csname <prefix><name>\endcsname={`,
    /// returning the register's database name with the cursor inside the
    /// group. The same `\csname` also appears in the `\newtoks`
    /// declaration, so the whole assignment shape must match before the
    /// cursor commits.
    fn seek_register(&mut self, prefix: &str) -> Result<String> {
        while self.pos < self.tokens.len() {
            let matched = match (
                self.tokens.get(self.pos),
                self.tokens.get(self.pos + 1),
                self.tokens.get(self.pos + 2),
                self.tokens.get(self.pos + 3),
                self.tokens.get(self.pos + 4),
            ) {
                (
                    Some(Token::ControlSeq(cs)),
                    Some(Token::Text(register)),
                    Some(Token::ControlSeq(end)),
                    Some(Token::Text(assign)),
                    Some(Token::BeginGroup),
                ) if cs == "csname" && end == "endcsname" && assign.trim() == "=" => {
                    register.trim().strip_prefix(prefix).map(str::to_string)
                }
                _ => None,
            };
            if let Some(name) = matched {
                self.pos += 5;
                return Ok(name);
            }
            self.pos += 1;
        }
        Err(DbtexError::Expected {
            expected: format!("\\csname {prefix}...\\endcsname="),
            found: "end of file".to_string(),
        })
    }
}

fn set_title(db: &mut Database, key: &str, title: &str) -> Result<()> {
    if db.header(key).is_none() {
        db.add_column(key)?;
    }
    if let Some(header) = db.header_mut(key) {
        header.set_title(title);
    }
    Ok(())
}

/// Row indices are 1-based in every persisted layout.
fn positive_index(value: i64) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&index| index > 0)
        .ok_or_else(|| DbtexError::InvalidNumber(value.to_string()))
}

fn datum_type_from_id(id: i64) -> Result<DatumType> {
    i8::try_from(id)
        .ok()
        .and_then(DatumType::from_id)
        .ok_or(DbtexError::UnknownTypeId(id))
}

fn mismatched_pair(expected: i64, found: i64) -> DbtexError {
    DbtexError::MismatchedMarker {
        expected: format!("\\db@col@id@w {expected}\\db@col@id@end@"),
        found: format!("\\db@col@id@w {found}\\db@col@id@end@"),
    }
}

/// Rebuilds a typed datum from the four persisted fields.
fn reconstruct_datum(text: &str, number: &str, symbol: &str, type_id: i64) -> Result<Datum> {
    let datum_type = datum_type_from_id(type_id)?;
    let original = Some(text.to_string());
    let parse_f64 = |raw: &str| -> Result<f64> {
        raw.parse()
            .map_err(|_| DbtexError::InvalidNumber(raw.to_string()))
    };
    let parse_i64 = |raw: &str| -> Result<i64> {
        raw.parse()
            .map_err(|_| DbtexError::InvalidNumber(raw.to_string()))
    };
    Ok(match datum_type {
        DatumType::Unknown => Datum::Unknown,
        DatumType::String => Datum::String {
            text: text.to_string(),
        },
        DatumType::Integer => Datum::Integer {
            value: parse_i64(number)?,
            original,
        },
        DatumType::Decimal => Datum::Decimal {
            value: parse_f64(number)?,
            original,
        },
        DatumType::Currency => Datum::Currency {
            value: parse_f64(number)?,
            symbol: symbol.to_string(),
            original,
        },
        DatumType::DateTime => Datum::DateTime {
            julian_date: parse_f64(number)?,
            original,
        },
        DatumType::Date => Datum::Date {
            julian_day: parse_i64(number)?,
            original,
        },
        DatumType::Time => Datum::Time {
            julian_time: parse_f64(number)?,
            original,
        },
    })
}
