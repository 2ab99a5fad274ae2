//! Reads user records from a CSV file with a header row.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::record::Record;

/// Failures while reading the record source. All of them end the read step.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to locate the file '{0}'")]
    NotFound(String),

    #[error("permission denied for accessing '{0}'")]
    PermissionDenied(String),

    #[error("malformed input in '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

/// Reads every data row of the CSV file at `path`, in file order.
///
/// Rows shorter than the header yield records without the trailing fields;
/// cells past the last header are dropped. A header-only or empty file
/// yields no records.
pub fn read_records(path: &Path) -> Result<Vec<Record>, SourceError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| io_error(&display, e))?;
    parse(file, &display)
}

fn parse<R: Read>(input: R, display: &str) -> Result<Vec<Record>, SourceError> {
    let malformed = |reason: String| SourceError::Malformed {
        path: display.to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => return Err(csv_error(display, e)),
    };

    let mut seen = HashSet::new();
    for name in headers.iter() {
        if !seen.insert(name) {
            return Err(malformed(format!("duplicate column '{name}'")));
        }
    }

    let mut records: Vec<Record> = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(display, e))?;
        records.push(headers.iter().zip(row.iter()).collect());
    }
    Ok(records)
}

fn io_error(display: &str, err: io::Error) -> SourceError {
    match err.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(display.to_string()),
        io::ErrorKind::PermissionDenied => SourceError::PermissionDenied(display.to_string()),
        _ => SourceError::Malformed {
            path: display.to_string(),
            reason: err.to_string(),
        },
    }
}

fn csv_error(display: &str, err: csv::Error) -> SourceError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(io) => io_error(display, io),
        other => {
            let reason = match line {
                Some(line) => format!("line {line}: {other:?}"),
                None => format!("{other:?}"),
            };
            SourceError::Malformed {
                path: display.to_string(),
                reason,
            }
        }
    }
}
