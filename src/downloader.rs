use csv::Writer;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::columns::{columns_for, ColumnDef, Entity, Surface};
use crate::error::{DashboardError, Result};
use crate::normalize::FlatRecord;

/// Widest column, in characters, for text that does not wrap
pub const NOWRAP_WIDTH_CAP: usize = 40;
/// Widest column, in characters, for wrapping text
pub const WRAP_WIDTH_CAP: usize = 60;
/// Extra characters added to every computed width
pub const WIDTH_PADDING: usize = 2;

/// One worksheet's worth of rows
pub struct Sheet<'a> {
    pub entity: Entity,
    pub rows: &'a [FlatRecord],
}

/// Convert one entity's rows to CSV format
///
/// The header row carries the column keys of the export projection, so a
/// split file can be compared field by field against its source. Values that
/// contain commas, quotes or line breaks are quoted, with inner quotes doubled.
///
/// # Arguments
/// * `entity` - Entity whose export columns define the layout
/// * `rows` - Normalized rows, written in order
///
/// # Returns
/// * `Result<String>` - CSV content or an error
pub fn to_csv(entity: Entity, rows: &[FlatRecord]) -> Result<String> {
    let cols = columns_for(entity, Surface::Export);
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(cols.iter().map(|col| col.key.as_str()))?;
    for row in rows {
        writer.write_record(cols.iter().map(|col| row.get(&col.key)))?;
    }

    let bytes = writer.into_inner().map_err(|e| DashboardError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Csv(e.to_string()))
}

/// Display width of an exported column
///
/// `min(max(label length, longest cell), cap) + padding`, where the cap
/// depends on whether the column wraps.
pub fn column_width(col: &ColumnDef, rows: &[FlatRecord]) -> usize {
    let cap = if col.wrap { WRAP_WIDTH_CAP } else { NOWRAP_WIDTH_CAP };
    let longest_cell = rows
        .iter()
        .map(|row| row.get(&col.key).chars().count())
        .max()
        .unwrap_or(0);
    let label_len = col.label.chars().count();
    label_len.max(longest_cell).min(cap) + WIDTH_PADDING
}

/// Convert rows to XLSX format, one worksheet per entity
///
/// Each sheet gets a bold header row of column labels from the export
/// projection, frozen above the data. Wrapping columns use a text-wrap format.
///
/// # Arguments
/// * `sheets` - Worksheets to write, in order
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
pub fn to_xlsx(sheets: &[Sheet<'_>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let wrap_format = Format::new().set_text_wrap();

    for sheet in sheets {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(sheet.entity.title())?;

        let cols = columns_for(sheet.entity, Surface::Export);
        for (c, col) in cols.iter().enumerate() {
            let c = c as u16;
            worksheet.write_string_with_format(0, c, col.label.as_str(), &header_format)?;
            worksheet.set_column_width(c, column_width(col, sheet.rows) as f64)?;
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = (r + 1) as u32;
            for (c, col) in cols.iter().enumerate() {
                let value = row.get(&col.key);
                if value.is_empty() {
                    continue;
                }
                if col.wrap {
                    worksheet.write_string_with_format(r, c as u16, value, &wrap_format)?;
                } else {
                    worksheet.write_string(r, c as u16, value)?;
                }
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        workbook.push_worksheet(worksheet);
    }

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}
