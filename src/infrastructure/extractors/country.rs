use crate::config::{Category, Year};
use crate::domain::{Cell, Region, Table, TableBuilder};
use crate::error::{Result, ScrapeError};
use crate::infrastructure::extractors::{cell_text, selector};
use crate::infrastructure::fetcher::PageFetcher;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

static RANKING_TABLE: Lazy<Selector> = Lazy::new(|| selector("table#t2"));
static HEADER_CELLS: Lazy<Selector> = Lazy::new(|| selector("thead th"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| selector("tbody tr"));
static DATA_CELLS: Lazy<Selector> = Lazy::new(|| selector("td"));

/// Extracts the per-country ranking table of a category, one page per
/// (region, year) combination.
#[derive(Debug)]
pub struct CountryRankings {
    fetcher: PageFetcher,
}

impl CountryRankings {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn extract(
        &self,
        category: Category,
        regions: &[Region],
        years: &[Year],
        countries: &[String],
    ) -> Result<Table> {
        // No configured region means one unscoped worldwide ranking.
        let scopes: Vec<Option<Region>> = if regions.is_empty() {
            vec![None]
        } else {
            regions.iter().copied().map(Some).collect()
        };

        let mut pages = Vec::new();
        for scope in &scopes {
            for year in years {
                let url = self.ranking_url(category, *scope, *year);
                let Some(body) = self.fetcher.fetch(&url).await? else {
                    warn!("skipping {url}: upstream answered with an error status");
                    continue;
                };
                pages.push(parse_ranking_page(&body, *year)?);
            }
        }

        let mut table = Table::concat(pages);
        if !countries.is_empty() {
            filter_countries(&mut table, countries)?;
        }
        Ok(table)
    }

    fn ranking_url(&self, category: Category, region: Option<Region>, year: Year) -> String {
        let mut url = format!(
            "{}/{}/rankings_by_country.jsp?title={year}",
            self.fetcher.base_url(),
            category.slug(),
        );
        if let Some(region) = region {
            url.push_str(&format!("&region={}", region.code()));
        }
        url
    }
}

/// Parses one ranking page. Column names come from the header row; each body
/// row drops its first cell (the rank icon), gets a locally assigned 1-based
/// rank in front and the requested year appended. The rank is the display
/// order of this one page, so it restarts at 1 for every (region, year)
/// fetch.
fn parse_ranking_page(html: &str, year: Year) -> Result<Table> {
    let document = Html::parse_document(html);
    let table = document
        .select(&RANKING_TABLE)
        .next()
        .ok_or_else(|| ScrapeError::Structure("ranking table `t2` not found".to_string()))?;

    let mut columns: Vec<String> = table.select(&HEADER_CELLS).map(cell_text).collect();
    if columns.is_empty() {
        return Err(ScrapeError::Structure(
            "ranking table has no header row".to_string(),
        ));
    }
    columns.push("Year".to_string());

    let mut builder = TableBuilder::new(columns);
    for (position, row) in table.select(&BODY_ROWS).enumerate() {
        let mut cells: Vec<Cell> = vec![Some((position + 1).to_string())];
        cells.extend(row.select(&DATA_CELLS).skip(1).map(|td| Some(cell_text(td))));
        cells.push(Some(year.to_string()));
        builder.push_row(cells)?;
    }

    Ok(builder.finish())
}

/// Keeps only rows whose `Country` is in the configured filter, preserving
/// the original row order.
fn filter_countries(table: &mut Table, countries: &[String]) -> Result<()> {
    let Some(index) = table.column_index("Country") else {
        // Nothing was fetched at all; an empty result stays empty.
        if table.row_count() == 0 {
            return Ok(());
        }
        return Err(ScrapeError::Structure(
            "a `countries` filter was configured but the ranking has no `Country` column"
                .to_string(),
        ));
    };

    table.retain_rows(|row| {
        row[index]
            .as_deref()
            .is_some_and(|country| countries.iter().any(|wanted| wanted == country))
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANKING_PAGE: &str = r#"
        <html><body>
        <table id="t2">
          <thead><tr>
            <th>Rank</th><th>Country</th><th>Crime Index</th><th>Safety Index</th>
          </tr></thead>
          <tbody>
            <tr><td><div class="rankIcon"></div></td><td>Venezuela</td><td>83.58</td><td>16.42</td></tr>
            <tr><td><div class="rankIcon"></div></td><td>Papua New Guinea</td><td>80.24</td><td>19.76</td></tr>
            <tr><td><div class="rankIcon"></div></td><td>Honduras</td><td>74.54</td><td>25.46</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn ranks_are_reassigned_locally_and_year_is_appended() {
        let table = parse_ranking_page(RANKING_PAGE, Year::Full(2019)).unwrap();

        assert_eq!(
            table.columns(),
            &["Rank", "Country", "Crime Index", "Safety Index", "Year"]
        );
        let ranks: Vec<_> = table
            .column("Rank")
            .unwrap()
            .into_iter()
            .map(|cell| cell.clone().unwrap())
            .collect();
        assert_eq!(ranks, ["1", "2", "3"]);
        assert!(table
            .column("Year")
            .unwrap()
            .iter()
            .all(|cell| cell.as_deref() == Some("2019")));
        // the icon cell is dropped, not parsed as a value
        assert_eq!(table.rows()[0][1].as_deref(), Some("Venezuela"));
    }

    #[test]
    fn mid_year_tags_are_preserved_in_the_year_column() {
        let table = parse_ranking_page(RANKING_PAGE, Year::Mid(2019)).unwrap();
        assert_eq!(table.rows()[0][4].as_deref(), Some("2019-mid"));
    }

    #[test]
    fn missing_ranking_table_is_a_structure_error() {
        let error = parse_ranking_page("<html><body></body></html>", Year::Full(2019)).unwrap_err();
        assert!(matches!(error, ScrapeError::Structure(_)));
    }

    #[test]
    fn country_filter_keeps_configured_rows_in_order() {
        let mut table = parse_ranking_page(RANKING_PAGE, Year::Full(2019)).unwrap();
        filter_countries(&mut table, &["Honduras".to_string(), "Venezuela".to_string()]).unwrap();

        let countries: Vec<_> = table
            .column("Country")
            .unwrap()
            .into_iter()
            .map(|cell| cell.clone().unwrap())
            .collect();
        assert_eq!(countries, ["Venezuela", "Honduras"]);
    }

    #[test]
    fn region_code_lands_in_the_url() {
        let extractor =
            CountryRankings::new(PageFetcher::with_base_url("http://localhost:9").unwrap());
        let url = extractor.ranking_url(Category::Crime, Some(Region::Europe), Year::Full(2021));

        assert_eq!(
            url,
            "http://localhost:9/crime/rankings_by_country.jsp?title=2021&region=150"
        );
    }
}
