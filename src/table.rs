use crate::error::{PropertyError, Result};
use crate::types::{Property, PropertyTable, ID_COLUMN};
use log::debug;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Writes a property table to a CSV file with a `Protein_ID,<property>` header.
///
/// Rows follow the table order, one newline-terminated line per record. An
/// existing file at `path` is overwritten. The same table always produces the
/// same bytes.
///
/// # Arguments
/// * `table` - Records to write
/// * `path` - Destination CSV file
///
/// # Errors
/// * Returns `PropertyError::Io` if the destination cannot be created
/// * Returns `PropertyError::DataError` if serialization fails
pub fn write_property_table<P: AsRef<Path>>(table: &PropertyTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut df = table.to_frame()?;
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)
        .map_err(|e| PropertyError::DataError(e.to_string()))?;

    debug!(
        "Wrote {} rows of {} to {}",
        table.len(),
        table.property,
        path.display()
    );
    Ok(())
}

/// Reads a delimited file with a header row, keeping every column as text.
fn read_text_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PropertyError::FileNotFound(path.to_path_buf()));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| PropertyError::DataError(format!("{}: {}", path.display(), e)))
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .map_err(|_| PropertyError::DataError(format!("Column '{}' not found", name)))?
        .str()
        .map_err(|e| PropertyError::DataError(e.to_string()))
}

fn parse_values(values: &StringChunked, name: &str) -> Result<Vec<f64>> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw = value.ok_or_else(|| {
                PropertyError::DataError(format!("Missing value in column '{}' at row {}", name, row + 1))
            })?;
            raw.trim().parse::<f64>().map_err(|_| {
                PropertyError::DataError(format!(
                    "Non-numeric value '{}' in column '{}' at row {}",
                    raw,
                    name,
                    row + 1
                ))
            })
        })
        .collect()
}

/// Extracts one column of a delimited file as floating point values.
///
/// # Arguments
/// * `path` - CSV file with a header row
/// * `column` - Header of the column to extract
///
/// # Returns
/// * `Result<Vec<f64>>` - One value per data row, in file order
///
/// # Errors
/// * Returns `PropertyError::FileNotFound` if the file does not exist
/// * Returns `PropertyError::DataError` if the file cannot be parsed, the column
///   is absent, or a value is missing or non-numeric
/// * Returns `PropertyError::EmptyData` if the file has no data rows
pub fn read_numeric_column<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let df = read_text_frame(path)?;
    let values = parse_values(string_column(&df, column)?, column)?;

    if values.is_empty() {
        return Err(PropertyError::EmptyData(format!(
            "no rows in column '{}' of {}",
            column,
            path.display()
        )));
    }

    Ok(values)
}

/// Reads a table previously written by [`write_property_table`].
///
/// # Errors
/// * Same as [`read_numeric_column`]; an empty table is returned as-is
pub fn read_property_table<P: AsRef<Path>>(path: P, property: Property) -> Result<PropertyTable> {
    let df = read_text_frame(path.as_ref())?;
    let ids = string_column(&df, ID_COLUMN)?;
    let values = parse_values(string_column(&df, property.column_name())?, property.column_name())?;

    let mut table = PropertyTable::new(property);
    for (id, value) in ids.into_iter().zip(values) {
        let id = id.ok_or_else(|| PropertyError::DataError("Missing protein identifier".into()))?;
        table.push(id, value);
    }
    Ok(table)
}
