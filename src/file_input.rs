/*!
Readers for the environmental and crop-calendar tables.

A table file starts with a header line, followed by one line per row. Each row
begins with a label (a month name, a stage name, ...) that is skipped, followed
by the numeric columns. Blank lines are ignored. Files may be UTF-8 or UTF-16
with a byte order mark, as written by common spreadsheet exports.
*/
use std::fs;
use std::path::Path;

use crate::error::{IrrigationError, Result};
use crate::inputs::{CropCalendar, EnvironmentalData};

// Column separator, chosen from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Text, // Any run of whitespace
    Csv,  // Comma
    Tsv,  // Tab
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => TableFormat::Csv,
            Some("tsv") | Some("tab") => TableFormat::Tsv,
            _ => TableFormat::Text,
        }
    }

    fn fields<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            TableFormat::Text => line.split_whitespace().collect(),
            TableFormat::Csv => line.split(',').map(str::trim).collect(),
            TableFormat::Tsv => line.split('\t').map(str::trim).collect(),
        }
    }
}

// Header and numeric rows of a table with N value columns
#[derive(Clone, Debug, PartialEq)]
pub struct Table<const N: usize> {
    pub header: Vec<String>,
    pub rows: Vec<[f64; N]>,
}

pub fn parse_table<const N: usize>(
    content: &str,
    format: TableFormat,
    path: &Path,
) -> Result<Table<N>> {
    let parse_error = |line: usize, message: String| IrrigationError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err(parse_error(1, "missing header line".to_string()));
    };
    let header = format
        .fields(header_line.trim())
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (i, line) in lines {
        let fields = format.fields(line.trim());
        if fields.len() != N + 1 {
            return Err(parse_error(
                i + 1,
                format!(
                    "expected a label and {N} values, found {} fields",
                    fields.len()
                ),
            ));
        }
        let mut row = [0.0; N];
        for (value, field) in row.iter_mut().zip(&fields[1..]) {
            *value = field
                .parse()
                .map_err(|_| parse_error(i + 1, format!("invalid number '{field}'")))?;
        }
        rows.push(row);
    }

    Ok(Table { header, rows })
}

pub fn read_table<const N: usize>(path: &Path) -> Result<Table<N>> {
    let bytes = fs::read(path).map_err(|source| IrrigationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = decode(&bytes).ok_or_else(|| IrrigationError::Parse {
        path: path.to_path_buf(),
        line: 1,
        message: "not valid UTF-8 or UTF-16 text".to_string(),
    })?;
    parse_table(&content, TableFormat::from_path(path), path)
}

// Rows of ET0, effective rainfall and percolation requirement
pub fn read_environmental(path: &Path) -> Result<EnvironmentalData> {
    let table = read_table::<3>(path)?;
    Ok(EnvironmentalData::from_rows(&table.rows))
}

// Rows of duration, crop coefficient, special requirement and depletion
pub fn read_crop_calendar(path: &Path) -> Result<CropCalendar> {
    let table = read_table::<4>(path)?;
    Ok(CropCalendar::from_rows(&table.rows))
}

// Decode UTF-8, or UTF-16 when a byte order mark says so
fn decode(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).ok(),
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}
