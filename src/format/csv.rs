use serde_json::{Map, Value};

use super::{scalar_text, with_newline, Format, FormatError, FormatOptions};

/// Delimited text via the `csv` crate.
///
/// The first row is the header. Every record reads as an object of strings
/// keyed by header, so the whole document is an array of objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Csv;

impl Format for Csv {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["csv"]
    }

    fn read(&self, input: &str, opts: &FormatOptions) -> Result<Value, FormatError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(opts.csv_delimiter)
            .from_reader(input.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| FormatError::parse("csv", e))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| FormatError::parse("csv", e))?;
            let row: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, cell)| (h.to_string(), Value::String(cell.to_string())))
                .collect();
            rows.push(Value::Object(row));
        }
        Ok(Value::Array(rows))
    }

    fn write(&self, value: &Value, opts: &FormatOptions) -> Result<String, FormatError> {
        let rows: Vec<&Map<String, Value>> = match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().ok_or_else(|| {
                        FormatError::write("csv", format!("row {i} is not an object"))
                    })
                })
                .collect::<Result<_, _>>()?,
            Value::Object(map) => vec![map],
            scalar => return Ok(with_newline(scalar_text(scalar).unwrap_or_default())),
        };
        if rows.is_empty() {
            return Ok(String::new());
        }

        let headers = header_union(&rows);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(opts.csv_delimiter)
            .from_writer(Vec::new());
        writer
            .write_record(&headers)
            .map_err(|e| FormatError::write("csv", e))?;
        for row in rows {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| row.get(*h).map(cell_text).unwrap_or_default())
                .collect();
            writer
                .write_record(&cells)
                .map_err(|e| FormatError::write("csv", e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| FormatError::write("csv", e))?;
        String::from_utf8(bytes).map_err(|e| FormatError::write("csv", e))
    }
}

/// Keys of every row, in first-seen order.
fn header_union<'a>(rows: &[&'a Map<String, Value>]) -> Vec<&'a str> {
    let mut headers: Vec<&str> = Vec::new();
    for row in rows.iter().copied() {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key.as_str());
            }
        }
    }
    headers
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
        scalar => scalar_text(scalar).unwrap_or_default(),
    }
}
