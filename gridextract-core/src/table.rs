//! Fixed-width `.dat` table: rendering, writing and reading back.
//!
//! Layout:
//!
//! ```text
//! #[001]gas_density [002]radm        [003]CII158
//! #    [001]        [002]        [003]
//! 1.0000E+05   1.0000E+00   2.3456E-07
//! ```
//!
//! Name fields are padded to the longest field plus one space and wrapped
//! after every fifth column onto a new `#` line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ExtractError, Result};
use crate::keymap::KeyMaps;
use crate::record::SimulationRecord;

/// Header name fields per line before wrapping.
pub const HEADER_WRAP: usize = 5;
/// Separator between values of a data row.
pub const VALUE_SEPARATOR: &str = "   ";
/// Separator between index markers on the second header line.
pub const MARKER_SEPARATOR: &str = "        ";
/// Indent after `#` on the marker line.
pub const MARKER_INDENT: &str = "    ";

/// Output column order: input parameters first, then result lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    columns: Vec<String>,
}

impl TableLayout {
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if no column is configured.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ExtractError::config(
                "<key maps>",
                "no output columns configured",
            ));
        }
        Ok(Self { columns })
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if both maps are empty.
    pub fn from_maps(maps: &KeyMaps) -> Result<Self> {
        Self::new(
            maps.input_params
                .output_names()
                .chain(maps.result_lines.output_names())
                .map(str::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn index_marker(index: usize) -> String {
    format!("[{:03}]", index + 1)
}

/// Format a number with four decimals in uppercase scientific notation and a
/// signed, at least two-digit exponent (`2.3456E-07`).
#[must_use]
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let formatted = format!("{value:.4E}");
    let Some((mantissa, exponent)) = formatted.split_once('E') else {
        return formatted;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}E{sign}{:02}", exponent.unsigned_abs())
}

/// Parse a raw extracted value and normalise it with [`format_scientific`].
///
/// Returns `None` when the text is not a number.
#[must_use]
pub fn format_value(raw: &str) -> Option<String> {
    raw.trim().parse::<f64>().ok().map(format_scientific)
}

/// Render both header lines, newline-terminated.
#[must_use]
pub fn render_header(layout: &TableLayout) -> String {
    let fields: Vec<String> = layout
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("{}{name}", index_marker(idx)))
        .collect();
    let width = fields
        .iter()
        .map(|field| field.chars().count())
        .max()
        .unwrap_or(0)
        + 1;

    let mut header = String::from("#");
    for (idx, field) in fields.iter().enumerate() {
        header.push_str(&format!("{field:<width$}"));
        if (idx + 1) % HEADER_WRAP == 0 {
            header.push_str("\n#");
        }
    }

    let markers: Vec<String> = (0..layout.len()).map(index_marker).collect();
    header.push('\n');
    header.push('#');
    header.push_str(MARKER_INDENT);
    header.push_str(&markers.join(MARKER_SEPARATOR));
    header.push('\n');
    header
}

/// Render one data row, newline-terminated.
///
/// # Errors
///
/// Returns [`ExtractError::MissingColumn`] if the record lacks a column and
/// [`ExtractError::Format`] if a value is not numeric.
pub fn render_row(record: &SimulationRecord, layout: &TableLayout) -> Result<String> {
    let mut values = Vec::with_capacity(layout.len());
    for column in &layout.columns {
        let raw = record
            .get(column)
            .ok_or_else(|| ExtractError::MissingColumn {
                run: record.run().to_string(),
                column: column.clone(),
            })?;
        let value = format_value(raw).ok_or_else(|| ExtractError::Format {
            run: record.run().to_string(),
            column: column.clone(),
            value: raw.to_string(),
        })?;
        values.push(value);
    }
    let mut row = values.join(VALUE_SEPARATOR);
    row.push('\n');
    Ok(row)
}

/// Render every data row.
///
/// # Errors
///
/// Returns the first row error.
pub fn render_rows(records: &[SimulationRecord], layout: &TableLayout) -> Result<String> {
    records.iter().try_fold(String::new(), |mut out, record| {
        out.push_str(&render_row(record, layout)?);
        Ok(out)
    })
}

/// Write the table: the header replaces any existing file, then the rows are
/// appended.
///
/// Rows are rendered before the file is touched, so a value that cannot be
/// formatted leaves any existing output untouched.
///
/// # Errors
///
/// Returns [`ExtractError::Format`]/[`ExtractError::MissingColumn`] from
/// rendering and [`ExtractError::Io`] from writing.
pub fn write_table(path: &Path, layout: &TableLayout, records: &[SimulationRecord]) -> Result<()> {
    let rows = render_rows(records, layout)?;
    let header = render_header(layout);
    let io_err = |err| ExtractError::io(path, err);

    let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
    file.write_all(header.as_bytes()).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    drop(file);

    let mut file = BufWriter::new(OpenOptions::new().append(true).open(path).map_err(io_err)?);
    file.write_all(rows.as_bytes()).map_err(io_err)?;
    file.flush().map_err(io_err)?;

    log::info!(
        "wrote {} rows x {} columns to {}",
        records.len(),
        layout.len(),
        path.display()
    );
    Ok(())
}

/// A table read back from its text form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Split a header line into column names at the markers that continue the
/// numbering from `first_index`. A marker opens the line or follows
/// whitespace, so brackets inside a name stay part of the name.
fn marked_fields(line: &str, first_index: usize) -> Result<Vec<String>, String> {
    let mut markers: Vec<(usize, usize)> = Vec::new();
    let mut pos = 0;
    loop {
        let expected = index_marker(first_index + markers.len());
        let Some(offset) = line[pos..].find(&expected) else {
            break;
        };
        let open = pos + offset;
        if line[..open].chars().next_back().is_none_or(char::is_whitespace) {
            markers.push((open, open + expected.len()));
            pos = open + expected.len();
        } else {
            pos = open + 1;
        }
    }

    let lead_end = markers.first().map_or(line.len(), |&(open, _)| open);
    if !line[..lead_end].trim().is_empty() {
        return Err(format!("expected column marker {}", index_marker(first_index)));
    }

    Ok(markers
        .iter()
        .enumerate()
        .map(|(i, &(_, name_start))| {
            let name_end = markers.get(i + 1).map_or(line.len(), |next| next.0);
            line[name_start..name_end].trim_end().to_string()
        })
        .collect())
}

/// Parse a rendered table back into column names and numeric rows.
///
/// # Errors
///
/// Returns [`ExtractError::Table`] if the header is missing or inconsistent,
/// or a data row has the wrong width or a non-numeric value.
pub fn parse_table(text: &str) -> Result<ParsedTable> {
    let table_err = |line: usize, reason: String| ExtractError::Table { line, reason };

    let header_lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.starts_with('#'))
        .collect();
    let Some((&(marker_idx, marker_line), name_lines)) = header_lines.split_last() else {
        return Err(table_err(1, "missing header".to_string()));
    };

    let mut columns = Vec::new();
    for &(idx, line) in name_lines {
        let names = marked_fields(&line[1..], columns.len())
            .map_err(|reason| table_err(idx + 1, reason))?;
        columns.extend(names);
    }

    let marker_count = marked_fields(&marker_line[1..], 0)
        .map_err(|reason| table_err(marker_idx + 1, reason))?
        .len();
    if marker_count != columns.len() {
        return Err(table_err(
            marker_idx + 1,
            format!(
                "{marker_count} index markers for {} named columns",
                columns.len()
            ),
        ));
    }

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(header_lines.len()) {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    table_err(idx + 1, format!("value {token:?} is not a number"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if row.len() != columns.len() {
            return Err(table_err(
                idx + 1,
                format!("{} values for {} columns", row.len(), columns.len()),
            ));
        }
        rows.push(row);
    }

    Ok(ParsedTable { columns, rows })
}
