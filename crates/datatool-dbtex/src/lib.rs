//! The persisted token formats: dbtex (reconstruction markers) and
//! dtltex (assignment scripts), each in the legacy v2 and current v3
//! layouts. Reading sniffs the `% DBTEX/DTLTEX <version> <charset>`
//! identifier line, decodes with the named charset, lexes the content
//! into control-sequence tokens, and reconstructs the database with a
//! recursive-descent parser.

pub mod error;
pub mod ident;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod writer;

pub use error::{DbtexError, Result};
pub use ident::FileIdent;
pub use reader::{DbtexReader, read_dbtex};
pub use writer::DbtexWriter;
