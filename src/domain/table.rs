use crate::error::{Result, ScrapeError};

/// A single table cell: raw text as found on the page, or an explicit
/// missing value. Cells are never coerced to numbers during extraction.
pub type Cell = Option<String>;

/// A table paired with its `{category}_{mode}` identifier.
pub type NamedTable = (String, Table);

/// An ordered set of named columns with one cell per column per row.
/// Column order is the order of extraction, not sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Appends a column holding the same value in every row.
    pub(crate) fn push_constant_column(&mut self, name: &str, value: Cell) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    pub(crate) fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Row-wise concatenation. Columns are unioned by name in first-seen
    /// order; rows from tables lacking a column get a missing cell there.
    pub fn concat<I>(tables: I) -> Table
    where
        I: IntoIterator<Item = Table>,
    {
        let parts: Vec<Table> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for part in &parts {
            for column in &part.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for part in parts {
            let indices: Vec<Option<usize>> = columns
                .iter()
                .map(|column| part.column_index(column))
                .collect();

            for row in part.rows {
                rows.push(
                    indices
                        .iter()
                        .map(|index| index.and_then(|i| row[i].clone()))
                        .collect(),
                );
            }
        }

        Table { columns, rows }
    }
}

/// Accumulates rows against a fixed, pre-declared column schema and converts
/// once into an immutable [`Table`]. Every extractor declares its schema up
/// front; a row that does not fit it is a structural parse error.
#[derive(Debug)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TableBuilder {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ScrapeError::Structure(format!(
                "row with {} cells does not fit the {}-column schema [{}]",
                row.len(),
                self.columns.len(),
                self.columns.join(", ")
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn finish(self) -> Table {
        Table {
            columns: self.columns,
            rows: self.rows,
        }
    }
}
