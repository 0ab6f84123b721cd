//! Workbook access: sheets of rows keyed by header names.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

use crate::config::Columns;

/// One data row of a sheet. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Zero-based index among the sheet's data rows.
    pub number: usize,
    pub id: String,
    pub response: String,
    pub dataset: String,
}

/// A sheet rendered to strings: the header row plus every data row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub header: Vec<String>,
    pub cells: Vec<Vec<String>>,
}

impl Table {
    pub fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut rows = range.rows().map(|r| r.iter().map(cell_text).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();
        Self { name: name.to_string(), header, cells: rows.collect() }
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow!("sheet '{}' has no column '{}'", self.name, name))
    }

    /// Blank or absent cells read as empty strings.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn rows(&self, columns: &Columns) -> Result<Vec<Row>> {
        let id = self.column(&columns.id)?;
        let code = self.column(&columns.code)?;
        let filename = self.column(&columns.filename)?;

        Ok((0..self.cells.len())
            .map(|n| Row {
                number: n,
                id: self.cell(n, id).to_string(),
                response: self.cell(n, code).to_string(),
                dataset: self.cell(n, filename).to_string(),
            })
            .collect())
    }
}

pub struct Workbook {
    inner: Sheets<std::io::BufReader<std::fs::File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        let inner = open_workbook_auto(path)
            .with_context(|| format!("opening workbook: {}", path.display()))?;
        Ok(Self { inner })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    pub fn table(&mut self, name: &str) -> Result<Table> {
        if !self.sheet_names().iter().any(|s| s == name) {
            bail!("workbook has no sheet named '{}'", name);
        }
        let range = self
            .inner
            .worksheet_range(name)
            .with_context(|| format!("reading sheet '{}'", name))?;
        Ok(Table::from_range(name, &range))
    }
}

/// Render a cell the way it reads in the sheet; integral numbers lose `.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "True".into() } else { "False".into() },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Columns {
        Columns { id: "id".into(), code: "response".into(), filename: "dataset".into() }
    }

    fn range() -> Range<Data> {
        let mut r = Range::new((0, 0), (3, 3));
        r.set_value((0, 0), Data::String("id".into()));
        r.set_value((0, 1), Data::String("response".into()));
        r.set_value((0, 2), Data::String("dataset".into()));
        r.set_value((0, 3), Data::String("notes".into()));
        r.set_value((1, 0), Data::String("a1".into()));
        r.set_value((1, 1), Data::String("```\nprint(1)\n```".into()));
        r.set_value((1, 2), Data::String("a.csv".into()));
        r.set_value((2, 0), Data::Float(42.0));
        r.set_value((3, 0), Data::String("c3".into()));
        r.set_value((3, 2), Data::String("c.csv".into()));
        r
    }

    #[test]
    fn rows_follow_sheet_order_with_blank_cells_empty() {
        let table = Table::from_range("Sheet1", &range());
        let rows = table.rows(&columns()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, "a1");
        assert_eq!(rows[0].dataset, "a.csv");
        assert_eq!(rows[1].id, "42");
        assert_eq!(rows[1].response, "");
        assert_eq!(rows[1].dataset, "");
        assert_eq!(rows[2].number, 2);
        assert_eq!(rows[2].response, "");
    }

    #[test]
    fn missing_column_names_sheet_and_column() {
        let table = Table::from_range("Model B", &range());
        let cols = Columns { code: "answer".into(), ..columns() };
        let err = table.rows(&cols).unwrap_err().to_string();
        assert!(err.contains("Model B") && err.contains("answer"));
    }

    #[test]
    fn header_match_ignores_surrounding_space() {
        let mut r = range();
        r.set_value((0, 1), Data::String(" response ".into()));
        let table = Table::from_range("S", &r);
        assert_eq!(table.column("response").unwrap(), 1);
    }

    #[test]
    fn cell_rendering() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(7.0)), "7");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(-3)), "-3");
        assert_eq!(cell_text(&Data::Bool(true)), "True");
    }
}
