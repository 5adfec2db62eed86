use datatool_core::{DatumCoercer, DatumType};
use datatool_dbtex::{DbtexError, DbtexReader, DbtexWriter};
use datatool_model::{Database, FileFormat, FormatVersion, IoSettings};

fn sample() -> Database {
    let coercer = DatumCoercer::default();
    let mut db = Database::new("marks");
    let rows = [
        ("zoe", "42", "$1,250.00", "2023-01-15"),
        ("alex", "17.5", "$9.99", "2023-06-01"),
    ];
    for (name, score, fee, joined) in rows {
        db.new_row();
        db.push_entry("Name", coercer.coerce(name)).unwrap();
        db.push_entry("Score", coercer.coerce(score)).unwrap();
        db.push_entry("Fee", coercer.coerce(fee)).unwrap();
        db.push_entry("Joined", coercer.coerce(joined)).unwrap();
    }
    db
}

fn settings(format: FileFormat, version: FormatVersion) -> IoSettings {
    IoSettings::default()
        .with_format(format)
        .with_version(version)
}

fn round_trip(format: FileFormat, version: FormatVersion) -> (Database, Database) {
    let db = sample();
    let mut out = Vec::new();
    DbtexWriter::new(settings(format, version))
        .write_to(&db, &mut out)
        .unwrap();
    let read_back = DbtexReader::new(IoSettings::default())
        .read_bytes(&out)
        .unwrap();
    (db, read_back)
}

fn assert_same_shape(original: &Database, read_back: &Database) {
    assert_eq!(read_back.name(), original.name());
    assert_eq!(read_back.column_count(), original.column_count());
    assert_eq!(read_back.row_count(), original.row_count());
    for header in original.headers() {
        let other = read_back.header(header.key()).unwrap();
        assert_eq!(other.index(), header.index());
        assert_eq!(other.display_title(), header.display_title());
    }
}

#[test]
fn dbtex_v3_round_trip_is_exact() {
    let (original, read_back) = round_trip(FileFormat::Dbtex, FormatVersion::V3);
    assert_same_shape(&original, &read_back);
    for (row, other) in original.rows().zip(read_back.rows()) {
        for (column, datum) in row.cells() {
            assert_eq!(other.cell(column), Some(datum));
        }
    }
    for header in original.headers() {
        assert_eq!(
            read_back.header(header.key()).unwrap().datum_type(),
            header.datum_type()
        );
    }
}

#[test]
fn dbtex_v2_round_trip_recovers_types() {
    let (original, read_back) = round_trip(FileFormat::Dbtex, FormatVersion::V2);
    assert_same_shape(&original, &read_back);
    assert_eq!(
        read_back.header("Score").unwrap().datum_type(),
        DatumType::Decimal
    );
    assert_eq!(
        read_back.header("Fee").unwrap().datum_type(),
        DatumType::Currency
    );
    // Temporal kinds are declared as decimal in the legacy layout and
    // come back through re-coercion of the cell text.
    assert_eq!(
        read_back.header("Joined").unwrap().datum_type(),
        DatumType::Date
    );
    let fee = read_back.row(0).unwrap().cell(3).unwrap();
    assert_eq!(fee.numeric_value(), Some(1250.0));
    assert_eq!(fee.currency_symbol(), Some("$"));
}

#[test]
fn dtltex_v3_round_trip() {
    let (original, read_back) = round_trip(FileFormat::Dtltex, FormatVersion::V3);
    assert_same_shape(&original, &read_back);
    let score = read_back.row(1).unwrap().cell(2).unwrap();
    assert_eq!(score.datum_type(), DatumType::Decimal);
    assert_eq!(score.numeric_value(), Some(17.5));
}

#[test]
fn dtltex_v2_round_trip() {
    let (original, read_back) = round_trip(FileFormat::Dtltex, FormatVersion::V2);
    assert_same_shape(&original, &read_back);
    let joined = read_back.row(0).unwrap().cell(4).unwrap();
    assert_eq!(joined.datum_type(), DatumType::Date);
}

#[test]
fn sparse_cells_survive() {
    let coercer = DatumCoercer::default();
    let mut db = Database::new("sparse");
    db.add_column("A").unwrap();
    db.add_column("B").unwrap();
    db.new_row();
    let pos = db.row_count() - 1;
    db.set_entry(pos, 2, coercer.coerce("only-b")).unwrap();
    db.new_row();

    let mut out = Vec::new();
    DbtexWriter::new(settings(FileFormat::Dbtex, FormatVersion::V3))
        .write_to(&db, &mut out)
        .unwrap();
    let read_back = DbtexReader::new(IoSettings::default())
        .read_bytes(&out)
        .unwrap();
    assert_eq!(read_back.row_count(), 2);
    assert!(read_back.row(0).unwrap().cell(1).is_none());
    assert!(read_back.row(0).unwrap().cell(2).is_some());
    assert!(read_back.row(1).unwrap().is_empty());
}

#[test]
fn latin1_content_decodes() {
    let mut bytes = b"% DTLTEX 3.0 latin1\n".to_vec();
    let body = "\\DTLdbProvideData{menu}%\n\\DTLdbNewRow%\n\\DTLdbNewEntry{Dish}{caf\u{e9}}%\n";
    // Encode the body as ISO-8859-1: e9 for the accented character.
    for c in body.chars() {
        let code = u32::from(c);
        assert!(code < 256);
        bytes.push(code as u8);
    }
    let db = DbtexReader::new(IoSettings::default())
        .read_bytes(&bytes)
        .unwrap();
    let fmt = datatool_core::NumericFormat::default();
    assert_eq!(
        db.row(0).unwrap().cell(1).unwrap().text(&fmt),
        "caf\u{e9}"
    );
}

#[test]
fn settings_name_overrides_stored_name() {
    let db = sample();
    let mut out = Vec::new();
    DbtexWriter::new(settings(FileFormat::Dbtex, FormatVersion::V3))
        .write_to(&db, &mut out)
        .unwrap();
    let mut read_settings = IoSettings::default();
    read_settings.name = Some("renamed".to_string());
    let read_back = DbtexReader::new(read_settings).read_bytes(&out).unwrap();
    assert_eq!(read_back.name(), "renamed");
}

#[test]
fn mismatched_column_pair_is_rejected() {
    let text = concat!(
        "% DBTEX 2.0 utf-8\n",
        "\\csname dtlkeys@bad\\endcsname={%\n",
        "\\db@plist@elt@w %\n",
        "\\db@col@id@w 1%\n",
        "\\db@col@id@end@ %\n",
        "\\db@key@id@w name%\n",
        "\\db@key@id@end@ %\n",
        "\\db@type@id@w 0%\n",
        "\\db@type@id@end@ %\n",
        "\\db@header@id@w Name%\n",
        "\\db@header@id@end@ %\n",
        "\\db@col@id@w 2%\n",
        "\\db@col@id@end@ %\n",
        "\\db@plist@elt@end@ %\n",
        "}%\n",
    );
    let err = DbtexReader::new(IoSettings::default())
        .read_bytes(text.as_bytes())
        .unwrap_err();
    match err {
        DbtexError::MismatchedMarker { expected, found } => {
            assert!(expected.contains("\\db@col@id@w 1"));
            assert!(found.contains("\\db@col@id@w 2"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_identifier_is_rejected() {
    let err = DbtexReader::new(IoSettings::default())
        .read_bytes(b"\\DTLnewdb{marks}\n")
        .unwrap_err();
    assert!(matches!(err, DbtexError::MissingIdentifier));
}

#[test]
fn file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.dbtex");
    let db = sample();
    DbtexWriter::new(settings(FileFormat::Dbtex, FormatVersion::V3))
        .write_path(&db, &path)
        .unwrap();
    let read_back = datatool_dbtex::read_dbtex(&path).unwrap();
    assert_same_shape(&db, &read_back);

    // A second write without permission to overwrite must fail.
    let err = DbtexWriter::new(settings(FileFormat::Dbtex, FormatVersion::V3))
        .write_path(&db, &path)
        .unwrap_err();
    assert!(matches!(err, DbtexError::OverwriteForbidden(_)));
}
