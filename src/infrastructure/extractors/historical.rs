use crate::config::Year;
use crate::domain::{item_code, Cell, Table, TableBuilder};
use crate::error::{Result, ScrapeError};
use crate::infrastructure::extractors::{cell_text, selector};
use crate::infrastructure::fetcher::PageFetcher;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::warn;

static SERIES_TABLE: Lazy<Selector> = Lazy::new(|| selector("table#t2"));
static HEADER_CELLS: Lazy<Selector> = Lazy::new(|| selector("thead th"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| selector("tbody tr"));
static DATA_CELLS: Lazy<Selector> = Lazy::new(|| selector("td"));

/// Extracts per-item price time series, one page per (country, item), and
/// merges them into one year-indexed table per country.
#[derive(Debug)]
pub struct HistoricalSeries {
    fetcher: PageFetcher,
}

impl HistoricalSeries {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn extract(
        &self,
        items: &[String],
        countries: &[String],
        years: &[Year],
        currency: &str,
    ) -> Result<Table> {
        // Series rows are keyed on plain integer years; mid-year tags can
        // never match one.
        let wanted: Vec<i64> = years.iter().filter_map(|y| y.full()).map(i64::from).collect();

        let mut per_country = Vec::new();
        for country in countries {
            let mut series: Vec<(String, Option<Table>)> = Vec::new();
            for item in items {
                let code = item_code(item)?;
                let url = format!(
                    "{}/cost-of-living/historical-data?itemId={code}&country={country}&displayCurrency={currency}",
                    self.fetcher.base_url(),
                );
                match self.fetcher.fetch(&url).await? {
                    Some(body) => series.push((item.clone(), Some(parse_series_page(&body)?))),
                    None => {
                        warn!("skipping {item:?} for {country}: upstream answered with an error status");
                        series.push((item.clone(), None));
                    }
                }
            }

            let mut combined = match &series[..] {
                // A single requested item needs no join.
                [(_, Some(single))] => single.clone(),
                _ if series.iter().all(|(_, table)| table.is_none()) => {
                    warn!("no historical series could be fetched for {country}; it contributes no rows");
                    empty_series_table(items)
                }
                _ => join_item_series(&series)?,
            };
            combined.push_constant_column("Country", Some(country.clone()));
            per_country.push(combined);
        }

        let mut table = Table::concat(per_country);
        filter_years(&mut table, &wanted)?;
        Ok(table)
    }
}

/// Parses a series page with the same header technique as the ranking pages,
/// but without rank injection or cell slicing: one row per year, label and
/// value.
fn parse_series_page(html: &str) -> Result<Table> {
    let document = Html::parse_document(html);
    let table = document
        .select(&SERIES_TABLE)
        .next()
        .ok_or_else(|| ScrapeError::Structure("historical series table `t2` not found".to_string()))?;

    let columns: Vec<String> = table.select(&HEADER_CELLS).map(cell_text).collect();
    if columns.is_empty() {
        return Err(ScrapeError::Structure(
            "historical series table has no header row".to_string(),
        ));
    }

    let mut builder = TableBuilder::new(columns);
    for row in table.select(&BODY_ROWS) {
        builder.push_row(row.select(&DATA_CELLS).map(|td| Some(cell_text(td))).collect())?;
    }
    Ok(builder.finish())
}

/// Outer join on the `Year` axis: one output row per year present in any
/// item's series, in first-seen order. An item without an entry for a year —
/// including an item whose whole fetch failed — stays missing there; the
/// country is never dropped.
fn join_item_series(series: &[(String, Option<Table>)]) -> Result<Table> {
    let mut years: Vec<String> = Vec::new();
    let mut by_item: Vec<(&str, HashMap<String, Cell>)> = Vec::new();

    for (item, table) in series {
        let mut values = HashMap::new();
        if let Some(table) = table {
            // The value is the second cell of each row, whatever the page
            // chose to call that column.
            for row in table.rows() {
                let Some(year) = row.first().cloned().flatten() else {
                    continue;
                };
                if !years.contains(&year) {
                    years.push(year.clone());
                }
                values.insert(year, row.get(1).cloned().flatten());
            }
        }
        by_item.push((item, values));
    }

    let mut columns = vec!["Year".to_string()];
    columns.extend(by_item.iter().map(|(item, _)| item.to_string()));

    let mut builder = TableBuilder::new(columns);
    for year in &years {
        let mut row: Vec<Cell> = vec![Some(year.clone())];
        row.extend(by_item.iter().map(|(_, values)| values.get(year).cloned().flatten()));
        builder.push_row(row)?;
    }
    Ok(builder.finish())
}

fn empty_series_table(items: &[String]) -> Table {
    let mut columns = vec!["Year".to_string()];
    columns.extend(items.iter().cloned());
    TableBuilder::new(columns).finish()
}

/// Casts the `Year` column to integers and keeps only the requested years.
/// A non-integer year cell at this stage means the page layout changed.
fn filter_years(table: &mut Table, wanted: &[i64]) -> Result<()> {
    let Some(index) = table.column_index("Year") else {
        if table.row_count() == 0 {
            return Ok(());
        }
        return Err(ScrapeError::Structure(
            "historical result has no `Year` column".to_string(),
        ));
    };

    let parsed = table
        .rows()
        .iter()
        .map(|row| {
            let text = row[index].as_deref().ok_or_else(|| {
                ScrapeError::Structure("missing `Year` value in historical series".to_string())
            })?;
            text.parse::<i64>().map_err(|_| {
                ScrapeError::Structure(format!(
                    "historical `Year` value {text:?} is not an integer"
                ))
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    let mut position = 0;
    table.retain_rows(|_| {
        let keep = wanted.contains(&parsed[position]);
        position += 1;
        keep
    });
    Ok(())
}
