use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A single cell of an uploaded table.
///
/// Cells are typed once at load time: anything that parses as a finite
/// number becomes `Number`, blank cells become `Empty`, everything else is
/// kept verbatim as `Text`. Numbers keep their trimmed source text so labels
/// such as `2019.10` or `007` print as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Number { value: f64, raw: String },
    Text(String),
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number {
                value,
                raw: trimmed.to_string(),
            },
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Text form of the cell, `None` for empty cells.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number { raw, .. } | Cell::Text(raw) => Some(raw.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number { raw, .. } | Cell::Text(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Caller-supplied tabular input prior to normalization.
///
/// Every column holds exactly `row_count` cells; short CSV records are
/// padded with [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl RawTable {
    /// Builds a table from named columns, padding shorter columns with empty cells.
    pub fn from_columns(columns: Vec<(String, Vec<Cell>)>) -> Self {
        let row_count = columns
            .iter()
            .map(|(_, cells)| cells.len())
            .max()
            .unwrap_or(0);

        let columns = columns
            .into_iter()
            .map(|(name, mut cells)| {
                cells.resize(row_count, Cell::Empty);
                Column {
                    name: name.trim().to_string(),
                    cells,
                }
            })
            .collect();

        Self { columns, row_count }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
        for record in csv_reader.records() {
            let record = record?;
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(record.get(idx).map(Cell::parse).unwrap_or(Cell::Empty));
            }
        }

        Ok(Self::from_columns(headers.into_iter().zip(cells).collect()))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Looks up a column by trimmed, ASCII case-insensitive name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        let wanted = name.trim();
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(wanted))
    }

    /// All columns whose name starts with `prefix` (ASCII case-insensitive), in table order.
    pub fn columns_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Column> {
        let prefix = prefix.trim().to_ascii_lowercase();
        self.columns
            .iter()
            .filter(move |c| c.name.to_ascii_lowercase().starts_with(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_typing() {
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("   "), Cell::Empty);
        assert_eq!(Cell::parse("0.08").as_f64(), Some(0.08));
        assert_eq!(Cell::parse(" 2013 ").as_f64(), Some(2013.0));
        assert_eq!(Cell::parse("Asia"), Cell::Text("Asia".to_string()));
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn test_numeric_labels_keep_source_text() {
        let cell = Cell::parse(" 2019.10 ");
        assert_eq!(cell.as_f64(), Some(2019.1));
        assert_eq!(cell.as_label().as_deref(), Some("2019.10"));
        assert_eq!(Cell::parse("007").to_string(), "007");
        assert_eq!(Cell::parse("1e3").as_label().as_deref(), Some("1e3"));
    }

    #[test]
    fn test_csv_short_records_are_padded() {
        let table = RawTable::from_csv_str(
            "Time,Disclosures\n1,First paragraph\n2\n3,Third paragraph\n",
        )
        .unwrap();

        assert_eq!(table.row_count(), 3);
        let disclosures = table.column("disclosures").unwrap();
        assert_eq!(disclosures.cells.len(), 3);
        assert!(disclosures.cells[1].is_empty());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = RawTable::from_csv_str("Std Dev, Return \n0.1,0.2\n").unwrap();
        assert!(table.column("std dev").is_some());
        assert!(table.column("RETURN").is_some());
        assert!(table.column("Information Ratio").is_none());
    }

    #[test]
    fn test_prefix_matching_preserves_order() {
        let table = RawTable::from_csv_str(
            "Investment Growth B,Time,Investment Growth A,Growth\n1,1,2,3\n",
        )
        .unwrap();

        let names: Vec<&str> = table
            .columns_with_prefix("Investment Growth")
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Investment Growth B", "Investment Growth A"]);
    }

    #[test]
    fn test_from_columns_pads_to_longest() {
        let table = RawTable::from_columns(vec![
            ("A".to_string(), vec![Cell::parse("1")]),
            ("B".to_string(), vec![Cell::parse("1"), Cell::parse("2")]),
        ]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("A").unwrap().cells[1], Cell::Empty);
    }
}
