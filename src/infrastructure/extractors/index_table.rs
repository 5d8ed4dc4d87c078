use crate::error::{Result, ScrapeError};
use crate::infrastructure::extractors::{cell_text, selector};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static INDEX_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.table_indices"));
static AIR_QUALITY_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.air_quality_table"));
static TABLE_ROWS: Lazy<Selector> = Lazy::new(|| selector("tr"));
static DATA_CELLS: Lazy<Selector> = Lazy::new(|| selector("td"));
static VALUE_CELL: Lazy<Selector> = Lazy::new(|| selector(r#"td[style="text-align: right"]"#));

pub(crate) const INDEX_HEADER: &str = "Index";
pub(crate) const AIR_QUALITY_HEADER: &str = "Air Pollution Data";

/// One entry of a trailing summary section, before the `City` column is
/// attached.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct IndexRow {
    pub header: &'static str,
    pub category: String,
    pub value: Option<String>,
    pub level: Option<String>,
}

/// Extracts the trailing index-summary table: one (label, value) pair per
/// row, the label in the leading plain cell, the value in the right-aligned
/// one. Pages without the section contribute nothing.
pub(crate) fn extract_index_rows(document: &Html) -> Result<Vec<IndexRow>> {
    let Some(table) = document.select(&INDEX_TABLE).next() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for row in table.select(&TABLE_ROWS) {
        let Some(label) = row.select(&DATA_CELLS).next() else {
            continue;
        };
        let Some(value) = row.select(&VALUE_CELL).next() else {
            continue;
        };
        rows.push(IndexRow {
            header: INDEX_HEADER,
            category: strip_label(&cell_text(label)),
            value: Some(cell_text(value)),
            level: None,
        });
    }
    Ok(rows)
}

/// Extracts the air-quality widget of pollution city pages. The widget is
/// optional per city; absence contributes zero rows. Its shape is irregular:
/// three labelled rows but four scraped values, the last of which is a level
/// descriptor rather than a value.
pub(crate) fn extract_air_quality_rows(document: &Html) -> Result<Vec<IndexRow>> {
    let Some(table) = document.select(&AIR_QUALITY_TABLE).next() else {
        return Ok(Vec::new());
    };

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for row in table.select(&TABLE_ROWS) {
        let mut cells = row.select(&DATA_CELLS).map(cell_text);
        let Some(label) = cells.next() else {
            continue;
        };
        labels.push(strip_label(&label));
        values.extend(cells);
    }

    relocate_trailing_level(labels, values)
}

/// The widget's positional contract: all but the last value map straight
/// across; the last value lands in the final row's `Level` slot, the other
/// rows keep a missing level.
fn relocate_trailing_level(labels: Vec<String>, mut values: Vec<String>) -> Result<Vec<IndexRow>> {
    if labels.len() != 3 || values.len() != 4 {
        return Err(ScrapeError::Structure(format!(
            "air-quality widget has {} labels and {} values, expected 3 and 4",
            labels.len(),
            values.len()
        )));
    }

    let level = values.pop();
    let mut rows: Vec<IndexRow> = labels
        .into_iter()
        .zip(values)
        .map(|(category, value)| IndexRow {
            header: AIR_QUALITY_HEADER,
            category,
            value: Some(value),
            level: None,
        })
        .collect();
    if let Some(last) = rows.last_mut() {
        last.level = level;
    }
    Ok(rows)
}

fn strip_label(text: &str) -> String {
    text.trim_end_matches(':').trim_end().to_string()
}
