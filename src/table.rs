//! Rendering of extracted tables into text snippets the chunker can
//! consume like any other text block.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of rows rendered per table.
pub const MAX_PREVIEW_ROWS: usize = 50;

/// A table as produced by the document extractor: rows of scalar cells.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }
}

/// Why a table was left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("table has no cells")]
    Empty,

    #[error("non-scalar value at row {row}, column {column}")]
    NestedCell { row: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTable {
    /// Batch-wide table number, the same one used in snippet labels.
    pub index: usize,
    pub reason: SkipReason,
}

/// Outcome of rendering a batch of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub snippets: Vec<String>,
    pub skipped: Vec<SkippedTable>,
}

/// Render every table, collecting failures instead of aborting.
///
/// Tables are labelled by their position in `tables`, skipped ones
/// included, so labels stay stable when a table fails.
pub fn render_tables<'a, I>(tables: I) -> TableReport
where
    I: IntoIterator<Item = &'a Table>,
{
    let mut report = TableReport::default();

    for (index, table) in tables.into_iter().enumerate() {
        match render_table(index, table) {
            Ok(snippet) => report.snippets.push(snippet),
            Err(reason) => {
                tracing::warn!(table = index, %reason, "skipping table");
                report.skipped.push(SkippedTable { index, reason });
            }
        }
    }

    report
}

/// Render one table as `Table <index>:` followed by a right-aligned
/// preview of its first [`MAX_PREVIEW_ROWS`] rows under a header of
/// column numbers.
///
/// # Examples
///
/// ```
/// use finqa::table::{render_table, Table};
/// use serde_json::json;
///
/// let table = Table::new(vec![
///     vec![json!("Revenue"), json!(1200)],
///     vec![json!("Costs"), json!(800)],
/// ]);
/// let snippet = render_table(0, &table).unwrap();
/// assert_eq!(snippet, "Table 0:\n      0    1\nRevenue 1200\n  Costs  800");
/// ```
pub fn render_table(index: usize, table: &Table) -> Result<String, SkipReason> {
    let preview = &table.rows[..table.rows.len().min(MAX_PREVIEW_ROWS)];
    let columns = preview.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Err(SkipReason::Empty);
    }

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(preview.len() + 1);
    cells.push((0..columns).map(|c| c.to_string()).collect());
    for (row_idx, row) in preview.iter().enumerate() {
        let mut rendered = Vec::with_capacity(columns);
        for column in 0..columns {
            let text = match row.get(column) {
                Some(value) => render_cell(value)
                    .ok_or(SkipReason::NestedCell { row: row_idx, column })?,
                None => String::new(),
            };
            rendered.push(text);
        }
        cells.push(rendered);
    }

    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            cells
                .iter()
                .map(|row| row[c].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let lines: Vec<String> = cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    Ok(format!("Table {index}:\n{}", lines.join("\n")))
}

fn render_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            Some(s.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}
