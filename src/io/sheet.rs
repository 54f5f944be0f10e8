use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};

/// Scalar content of a worksheet cell, detached from the reader library.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Whether the cell holds nothing or only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    /// Renders the cell the way it would be displayed as plain text.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.trim().to_string(),
            Cell::Number(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
        }
    }

    /// Reads the cell as a number; text is parsed after trimming.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(value) => value.trim().parse::<f64>().ok(),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }
}

impl From<&DataType> for Cell {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Empty => Cell::Empty,
            DataType::String(text) => Cell::Text(text.clone()),
            DataType::Float(number) => Cell::Number(*number),
            DataType::Int(number) => Cell::Number(*number as f64),
            DataType::Bool(flag) => Cell::Bool(*flag),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Header row plus data rows of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Builds a sheet from in-memory rows; used by tests and in-memory stores.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Position of the first column carrying the given header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|candidate| candidate == header)
    }

    /// Cell at the given position; missing trailing cells read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// Opens an `.xlsx` workbook and loads the named worksheet.
pub fn read_sheet(path: &Path, name: &str) -> Result<RawSheet> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, name)?;
    Ok(sheet_from_range(name, &range))
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::MissingSheet(name.to_string()))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

/// Converts a calamine range into a [`RawSheet`], treating the first row as
/// the header row and skipping rows that are entirely blank.
pub fn sheet_from_range(name: &str, range: &Range<DataType>) -> RawSheet {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| Cell::from(cell).to_text())
            .collect(),
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>())
        .filter(|cells| !cells.iter().all(Cell::is_blank))
        .collect();

    RawSheet::new(name, headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(Cell::Number(42.0).to_text(), "42");
        assert_eq!(Cell::Number(1.5).to_text(), "1.5");
    }

    #[test]
    fn text_numbers_are_parsed() {
        assert_eq!(Cell::Text(" 2048 ".into()).to_number(), Some(2048.0));
        assert_eq!(Cell::Text("n/a".into()).to_number(), None);
        assert_eq!(Cell::Empty.to_number(), None);
        assert_eq!(Cell::Bool(true).to_number(), None);
    }

    #[test]
    fn missing_cells_read_as_empty() {
        let sheet = RawSheet::new(
            "VMs",
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Text("x".into())]],
        );
        assert_eq!(sheet.cell(0, 0), &Cell::Text("x".into()));
        assert_eq!(sheet.cell(0, 1), &Cell::Empty);
        assert_eq!(sheet.cell(5, 0), &Cell::Empty);
        assert_eq!(sheet.column_index("b"), Some(1));
        assert_eq!(sheet.column_index("c"), None);
    }
}
