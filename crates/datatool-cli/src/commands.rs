use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use tracing::info;

use datatool_core::{DatumType, NumericFormat};
use datatool_csv::{CsvReader, CsvWriter};
use datatool_dbtex::{DbtexReader, DbtexWriter};
use datatool_model::{Database, FileFormat, IoSettings, Overwrite};

use crate::cli::{ConvertArgs, InfoArgs, ReadArgs, ShowArgs, SortArgs, WriteArgs};

pub fn run_convert(args: &ConvertArgs) -> Result<()> {
    let mut settings = read_settings(&args.read)?;
    if let Some(name) = &args.name {
        settings.name = Some(name.clone());
    }
    let db = read_database(&settings, &args.read.input)?;
    write_database(&db, &args.write)?;
    info!(
        database = db.name(),
        input = %args.read.input.display(),
        output = %args.write.output.display(),
        "converted"
    );
    Ok(())
}

pub fn run_show(args: &ShowArgs) -> Result<()> {
    let settings = read_settings(&args.read)?;
    let db = read_database(&settings, &args.read.input)?;
    let format = NumericFormat::default();

    let headers = ordered_headers(&db);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h.display_title()).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for (pos, header) in headers.iter().enumerate() {
        if header.datum_type().is_numeric()
            && let Some(column) = table.column_mut(pos)
        {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    let limit = args.max_rows.unwrap_or(usize::MAX);
    for row in db.rows().take(limit) {
        table.add_row(
            headers
                .iter()
                .map(|h| {
                    row.cell(h.index())
                        .map(|datum| datum.text(&format))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");
    if db.row_count() > limit {
        println!("({} of {} rows)", limit, db.row_count());
    }
    Ok(())
}

pub fn run_sort(args: &SortArgs) -> Result<()> {
    let settings = read_settings(&args.read)?;
    let mut db = read_database(&settings, &args.read.input)?;
    db.sort_by_key(&args.by, args.descending, &NumericFormat::default())
        .with_context(|| format!("sort by `{}`", args.by))?;
    write_database(&db, &args.write)?;
    Ok(())
}

pub fn run_info(args: &InfoArgs) -> Result<()> {
    let settings = read_settings(&args.read)?;
    let db = read_database(&settings, &args.read.input)?;

    println!("Database: {}", db.name());
    println!("Rows: {}", db.row_count());
    println!("Columns: {}", db.column_count());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Index").add_attribute(Attribute::Bold),
        Cell::new("Key").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
    ]);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for header in ordered_headers(&db) {
        table.add_row(vec![
            header.index().to_string(),
            header.key().to_string(),
            header.display_title().to_string(),
            type_label(header.datum_type()).to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Settings for the input file: format from the extension, then the
/// `-o` option pairs on top (so an explicit `format=` wins).
fn read_settings(args: &ReadArgs) -> Result<IoSettings> {
    build_settings(&args.input, &args.options)
}

fn build_settings(path: &Path, options: &[String]) -> Result<IoSettings> {
    let mut settings = IoSettings::default();
    match format_from_path(path) {
        Some(format) => settings.set_format(format),
        None if !has_format_option(options) => {
            bail!(
                "cannot tell the format of `{}` from its extension; pass format=... as an option",
                path.display()
            );
        }
        None => {}
    }
    settings
        .apply_options(options.iter().map(String::as_str))
        .with_context(|| format!("options for `{}`", path.display()))?;
    Ok(settings)
}

fn has_format_option(options: &[String]) -> bool {
    options
        .iter()
        .any(|pair| pair.split('=').next().map(str::trim) == Some("format"))
}

fn format_from_path(path: &Path) -> Option<FileFormat> {
    match path.extension()?.to_str()? {
        "csv" => Some(FileFormat::Csv),
        "tsv" => Some(FileFormat::Tsv),
        "dbtex" => Some(FileFormat::Dbtex),
        "dtltex" => Some(FileFormat::Dtltex),
        _ => None,
    }
}

fn read_database(settings: &IoSettings, path: &Path) -> Result<Database> {
    let db = if settings.format.is_delimited_text() {
        CsvReader::new(settings.clone())
            .read_path(path)
            .with_context(|| format!("read `{}`", path.display()))?
    } else {
        DbtexReader::new(settings.clone())
            .read_path(path)
            .with_context(|| format!("read `{}`", path.display()))?
    };
    Ok(db)
}

fn write_database(db: &Database, args: &WriteArgs) -> Result<()> {
    let mut settings = build_settings(&args.output, &args.options)?;
    if args.overwrite {
        settings.overwrite = Overwrite::Allow;
    }
    if settings.format.is_delimited_text() {
        CsvWriter::new(settings)
            .write_path(db, &args.output)
            .with_context(|| format!("write `{}`", args.output.display()))?;
    } else {
        DbtexWriter::new(settings)
            .write_path(db, &args.output)
            .with_context(|| format!("write `{}`", args.output.display()))?;
    }
    Ok(())
}

/// Headers in column-index order.
fn ordered_headers(db: &Database) -> Vec<&datatool_model::DataHeader> {
    let mut headers: Vec<_> = db.headers().iter().collect();
    headers.sort_by_key(|h| h.index());
    headers
}

fn type_label(datum_type: DatumType) -> &'static str {
    match datum_type {
        DatumType::Unknown => "unknown",
        DatumType::String => "string",
        DatumType::Integer => "integer",
        DatumType::Decimal => "decimal",
        DatumType::Currency => "currency",
        DatumType::DateTime => "datetime",
        DatumType::Date => "date",
        DatumType::Time => "time",
    }
}
