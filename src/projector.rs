//! Column projection over an in-memory table.
//!
//! A [`Projection`] is planned once per file from the source header and the
//! requested column list, then applied to every row. Requested columns are
//! de-duplicated keeping their first occurrence; columns the source lacks are
//! reported as [`SchemaWarning`]s and left out.

use std::fmt;

use itertools::Itertools;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ProjectedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    ColumnNotFound { column: String },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::ColumnNotFound { column } => write!(f, "column not found: '{column}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<String>,
    indices: Vec<usize>,
    missing: Vec<String>,
    duplicates: Vec<String>,
}

impl Projection {
    pub fn plan(headers: &[String], requested: &[String]) -> Self {
        let duplicates = requested.iter().duplicates().cloned().collect::<Vec<_>>();
        let mut columns = Vec::new();
        let mut indices = Vec::new();
        let mut missing = Vec::new();
        for name in requested.iter().unique() {
            match headers.iter().position(|header| header == name) {
                Some(idx) => {
                    columns.push(name.clone());
                    indices.push(idx);
                }
                None => missing.push(name.clone()),
            }
        }
        Self {
            columns,
            indices,
            missing,
            duplicates,
        }
    }

    /// Output header, in requested order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Requested columns absent from the source header.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Requested columns listed more than once; only the first is kept.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn warnings(&self) -> Vec<SchemaWarning> {
        self.missing
            .iter()
            .map(|column| SchemaWarning::ColumnNotFound {
                column: column.clone(),
            })
            .collect()
    }

    pub fn project_row(&self, row: &[String]) -> Vec<String> {
        self.indices
            .iter()
            .map(|&idx| row.get(idx).cloned().unwrap_or_default())
            .collect()
    }

    pub fn apply(&self, table: &SourceTable) -> ProjectedTable {
        ProjectedTable {
            headers: self.columns.clone(),
            rows: table.rows.iter().map(|row| self.project_row(row)).collect(),
        }
    }
}

/// Projects `table` onto `requested`, returning the projected table and one
/// warning per requested column the source does not have.
pub fn project(table: &SourceTable, requested: &[String]) -> (ProjectedTable, Vec<SchemaWarning>) {
    let projection = Projection::plan(&table.headers, requested);
    (projection.apply(table), projection.warnings())
}
