use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{DashboardError, Result};

/// A CSV file read into header-keyed rows
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

/// Load a CSV file
///
/// The first record is the header. A leading UTF-8 byte order mark is
/// ignored, blank lines are skipped, and rows shorter than the header are
/// padded with empty strings.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<CsvTable>` - The parsed table or an error
///
/// # Examples
/// ```no_run
/// use conference_dashboard::loader::read_csv;
///
/// match read_csv("new.csv") {
///     Ok(table) => println!("Loaded {} rows", table.rows.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn read_csv(filepath: impl AsRef<Path>) -> Result<CsvTable> {
    let path = filepath.as_ref();
    let content = fs::read_to_string(path)?;
    parse_csv(&content).map_err(|e| match e {
        DashboardError::Csv(msg) => DashboardError::Csv(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse CSV text; see [`read_csv`]
pub fn parse_csv(content: &str) -> Result<CsvTable> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.is_empty() {
        return Err(DashboardError::Csv("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), record.get(i).unwrap_or_default().to_string()))
                .collect(),
        );
    }

    Ok(CsvTable { header, rows })
}
