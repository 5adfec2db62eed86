use std::io::Cursor;
use std::io::Write as _;

use datatool_core::DatumType;
use datatool_csv::{CsvError, CsvReader};
use datatool_model::{DataContext, IoSettings, ModelError};

fn read(settings: IoSettings, text: &str) -> datatool_model::Database {
    CsvReader::new(settings)
        .read_from(Cursor::new(text), "test")
        .unwrap()
}

#[test]
fn header_row_becomes_columns() {
    let db = read(
        IoSettings::default(),
        "Name,Score\nzoe,42\nalex,17.5\n",
    );
    assert_eq!(db.column_count(), 2);
    assert_eq!(db.row_count(), 2);
    let score = db.header("Score").unwrap();
    assert_eq!(score.index(), 2);
    assert_eq!(score.display_title(), "Score");
    assert_eq!(score.datum_type(), DatumType::Decimal);
    assert_eq!(db.header("Name").unwrap().datum_type(), DatumType::String);
}

#[test]
fn no_header_generates_default_keys() {
    let mut settings = IoSettings::default();
    settings.include_header = false;
    let db = read(settings, "zoe,42\n");
    assert_eq!(db.row_count(), 1);
    assert!(db.header("Column1").is_some());
    assert!(db.header("Column2").is_some());
}

#[test]
fn explicit_keys_override_header_cells() {
    let mut settings = IoSettings::default();
    settings.keys = vec!["name".to_string(), "score".to_string()];
    let db = read(settings, "Name,Score\nzoe,42\n");
    let header = db.header("name").unwrap();
    assert_eq!(header.display_title(), "Name");
    assert!(db.header("Name").is_none());
}

#[test]
fn auto_keys_keep_header_cells_as_titles() {
    let mut settings = IoSettings::default();
    settings.auto_keys = true;
    let db = read(settings, "Name,Score\nzoe,42\n");
    assert_eq!(db.header("Column1").unwrap().display_title(), "Name");
    assert_eq!(db.header("Column2").unwrap().display_title(), "Score");
}

#[test]
fn skip_lines_drops_physical_lines() {
    let mut settings = IoSettings::default();
    settings.skip_lines = 2;
    let db = read(settings, "junk\nmore junk\nName\nzoe\n");
    assert!(db.header("Name").is_some());
    assert_eq!(db.row_count(), 1);
}

#[test]
fn blank_rows_ignored_by_default() {
    let db = read(IoSettings::default(), "Name\n\nzoe\n\nalex\n");
    assert_eq!(db.row_count(), 2);
}

#[test]
fn blank_row_can_end_the_file() {
    let mut settings = IoSettings::default();
    settings.apply_option("csv-blank", "end").unwrap();
    let db = read(settings, "Name\nzoe\n\nalex\n");
    assert_eq!(db.row_count(), 1);
}

#[test]
fn blank_row_can_become_an_empty_row() {
    let mut settings = IoSettings::default();
    settings.apply_option("csv-blank", "empty-row").unwrap();
    let db = read(settings, "Name\nzoe\n\nalex\n");
    assert_eq!(db.row_count(), 3);
    assert!(db.row(1).unwrap().is_empty());
}

#[test]
fn ragged_rows_extend_columns() {
    let mut settings = IoSettings::default();
    settings.include_header = false;
    let db = read(settings, "a\nb,c,d\n");
    assert_eq!(db.column_count(), 3);
    assert!(db.row(0).unwrap().cell(2).is_none());
}

#[test]
fn quoted_multi_line_cell() {
    let db = read(
        IoSettings::default(),
        "Note\n\"first\nsecond\"\n",
    );
    let cell = db.row(0).unwrap().cell(1).unwrap();
    assert_eq!(cell.text(&datatool_core::NumericFormat::default()), "first\nsecond");
}

#[test]
fn missing_file_is_a_named_error() {
    let err = CsvReader::new(IoSettings::default())
        .read_path(std::path::Path::new("/nonexistent/marks.csv"))
        .unwrap_err();
    assert!(matches!(err, CsvError::FileNotFound(_)));
}

#[test]
fn load_into_reports_counts() {
    let mut dir = tempfile::NamedTempFile::new().unwrap();
    write!(dir, "Name,Score\nzoe,42\n").unwrap();
    let mut context = DataContext::new();
    let mut settings = IoSettings::default();
    settings.name = Some("marks".to_string());
    let summary = CsvReader::new(settings)
        .load_into(&mut context, dir.path())
        .unwrap();
    assert_eq!(summary.database, "marks");
    assert_eq!(summary.columns, 2);
    assert_eq!(summary.rows, 1);
    assert!(context.contains("marks"));
}

#[test]
fn loading_twice_requires_append() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Name,Score\nzoe,42\n").unwrap();
    let mut context = DataContext::new();

    let mut settings = IoSettings::default();
    settings.name = Some("marks".to_string());
    let reader = CsvReader::new(settings.clone());
    reader.load_into(&mut context, file.path()).unwrap();

    let err = reader.load_into(&mut context, file.path()).unwrap_err();
    assert!(matches!(
        err,
        CsvError::Model(ModelError::DatabaseExists(_))
    ));

    settings.apply_option("load-action", "append").unwrap();
    let summary = CsvReader::new(settings)
        .load_into(&mut context, file.path())
        .unwrap();
    assert_eq!(summary.rows, 2);
}
