use crate::config::Category;
use crate::domain::{Cell, Table, TableBuilder};
use crate::error::{Result, ScrapeError};
use crate::infrastructure::extractors::index_table::{
    extract_air_quality_rows, extract_index_rows, IndexRow,
};
use crate::infrastructure::extractors::{cell_text, selector};
use crate::infrastructure::fetcher::PageFetcher;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

static WIDE_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.data_wide_table"));
static SECTION_HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h3"));
static SECTION_TABLES: Lazy<Selector> =
    Lazy::new(|| selector("table.table_builder_with_value_explanation"));
static TABLE_ROWS: Lazy<Selector> = Lazy::new(|| selector("tr"));
static HEADING_CELLS: Lazy<Selector> = Lazy::new(|| selector("th"));
static DATA_CELLS: Lazy<Selector> = Lazy::new(|| selector("td"));
static QOL_VALUES: Lazy<Selector> = Lazy::new(|| selector(r#"td[style="text-align: right"]"#));
static QOL_LEVELS_BOLD: Lazy<Selector> =
    Lazy::new(|| selector(r#"td[style="text-align: center; font-weight: 600"]"#));
static QOL_LEVELS_PLAIN: Lazy<Selector> =
    Lazy::new(|| selector(r#"td[style="text-align: center"]"#));
static QOL_NAMES: Lazy<Selector> = Lazy::new(|| selector("a.discreet_link"));

const QOL_FOOTER_LABEL: &str = "Quality of Life Index";

/// Extracts the section tables of city pages, one page per city, flattened
/// into a single table per category with a `Header` grouping column.
#[derive(Debug)]
pub struct CitySections {
    fetcher: PageFetcher,
}

impl CitySections {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn extract(
        &self,
        category: Category,
        cities: &[String],
        currency: Option<&str>,
    ) -> Result<Table> {
        let mut pages = Vec::new();
        for city in cities {
            let url = self.city_url(category, city, currency);
            let Some(body) = self.fetcher.fetch(&url).await? else {
                warn!("skipping {url}: upstream answered with an error status");
                continue;
            };
            pages.push(parse_city_page(&body, category, city)?);
        }
        Ok(Table::concat(pages))
    }

    fn city_url(&self, category: Category, city: &str, currency: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/in/{}",
            self.fetcher.base_url(),
            category.slug(),
            url_city_name(city)
        );
        if let Some(currency) = currency {
            url.push_str(&format!("?displayCurrency={currency}"));
        }
        url
    }
}

/// Title-cases a configured city name and joins the words with hyphens, the
/// one normalization applied before every city request.
pub(crate) fn url_city_name(city: &str) -> String {
    city.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn parse_city_page(html: &str, category: Category, city: &str) -> Result<Table> {
    let document = Html::parse_document(html);
    match category {
        Category::CostOfLiving | Category::PropertyInvestment => {
            parse_priced_sections(&document, city)
        }
        Category::QualityOfLife => parse_quality_of_life(&document, city),
        Category::Crime | Category::HealthCare => parse_value_sections(&document, city, true, false),
        Category::Pollution => parse_value_sections(&document, city, true, true),
        Category::Traffic => parse_value_sections(&document, city, false, false),
        Category::HistoricalData => Err(ScrapeError::Structure(
            "historical-data has no city page layout".to_string(),
        )),
    }
}

/// Cost-of-living and property-investment pages carry one wide table whose
/// rows alternate between section headings (heading cells only) and priced
/// items of two or three cells. A two-cell row has no price range; that is
/// recorded as an explicit missing value.
fn parse_priced_sections(document: &Html, city: &str) -> Result<Table> {
    let table = document
        .select(&WIDE_TABLE)
        .next()
        .ok_or_else(|| ScrapeError::Structure("wide price table not found".to_string()))?;

    let mut builder = TableBuilder::new(["Header", "Category", "Mean", "Range", "City"]);
    let mut header: Option<String> = None;

    for row in table.select(&TABLE_ROWS) {
        let data: Vec<String> = row.select(&DATA_CELLS).map(cell_text).collect();
        if data.is_empty() {
            if let Some(title) = row.select(&HEADING_CELLS).next() {
                header = Some(cell_text(title));
            }
            continue;
        }

        let current = header.clone().ok_or_else(|| {
            ScrapeError::Structure("price row appears before any section heading".to_string())
        })?;
        let (category, mean, range) = match &data[..] {
            [category, mean] => (category.clone(), mean.clone(), None),
            [category, mean, range] => (category.clone(), mean.clone(), Some(range.clone())),
            other => {
                return Err(ScrapeError::Structure(format!(
                    "price row with {} cells under {current:?}",
                    other.len()
                )))
            }
        };
        builder.push_row(vec![
            Some(current),
            Some(category),
            Some(mean),
            range,
            Some(city.to_string()),
        ])?;
    }

    Ok(builder.finish())
}

/// Crime, health-care, pollution and traffic pages carry one heading element
/// per section followed by one table per section. Rows hold a category cell,
/// a value cell and, for all but traffic, a level descriptor. The trailing
/// index table is appended, and for pollution the optional air-quality
/// widget after it.
fn parse_value_sections(
    document: &Html,
    city: &str,
    with_level: bool,
    air_quality: bool,
) -> Result<Table> {
    let mut columns = vec!["Header", "Category", "Value"];
    if with_level {
        columns.push("Level");
    }
    columns.push("City");
    let mut builder = TableBuilder::new(columns);

    for (header, table) in paired_sections(document)? {
        for row in table.select(&TABLE_ROWS) {
            let cells: Vec<String> = row.select(&DATA_CELLS).map(cell_text).collect();
            if cells.is_empty() {
                continue;
            }
            let (category, value, level) = split_value_row(&cells, with_level, &header)?;
            push_section_row(&mut builder, &header, category, Some(value), level, with_level, city)?;
        }
    }

    for index_row in extract_index_rows(document)? {
        push_index_row(&mut builder, index_row, with_level, city)?;
    }
    if air_quality {
        for widget_row in extract_air_quality_rows(document)? {
            push_index_row(&mut builder, widget_row, with_level, city)?;
        }
    }

    Ok(builder.finish())
}

/// Pairs section headings with section tables positionally, in document
/// order. The page contract is one table per heading; any count mismatch
/// means the layout changed and extraction cannot be trusted.
fn paired_sections<'a>(document: &'a Html) -> Result<Vec<(String, ElementRef<'a>)>> {
    let headings: Vec<String> = document.select(&SECTION_HEADINGS).map(cell_text).collect();
    let tables: Vec<ElementRef<'a>> = document.select(&SECTION_TABLES).collect();

    if headings.len() != tables.len() {
        return Err(ScrapeError::Structure(format!(
            "found {} section headings for {} section tables",
            headings.len(),
            tables.len()
        )));
    }
    Ok(headings.into_iter().zip(tables).collect())
}

/// Cell-count policy for section rows: a level-carrying category accepts
/// three cells, or two when the level is absent; traffic accepts exactly
/// two. Anything else is a layout violation.
fn split_value_row(
    cells: &[String],
    with_level: bool,
    header: &str,
) -> Result<(String, String, Option<String>)> {
    match (cells, with_level) {
        ([category, value], _) => Ok((category.clone(), value.clone(), None)),
        ([category, value, level], true) => {
            Ok((category.clone(), value.clone(), Some(level.clone())))
        }
        _ => Err(ScrapeError::Structure(format!(
            "section row with {} cells under {header:?}",
            cells.len()
        ))),
    }
}

fn push_section_row(
    builder: &mut TableBuilder,
    header: &str,
    category: String,
    value: Cell,
    level: Cell,
    with_level: bool,
    city: &str,
) -> Result<()> {
    let mut row = vec![Some(header.to_string()), Some(category), value];
    if with_level {
        row.push(level);
    }
    row.push(Some(city.to_string()));
    builder.push_row(row)
}

fn push_index_row(
    builder: &mut TableBuilder,
    index_row: IndexRow,
    with_level: bool,
    city: &str,
) -> Result<()> {
    push_section_row(
        builder,
        index_row.header,
        index_row.category,
        index_row.value,
        index_row.level,
        with_level,
        city,
    )
}

/// Quality-of-life city pages have no heading/table sections; the page is
/// reassembled from three selector families whose fixed combination order is
/// load-bearing: values are the right-aligned cells minus the first entry,
/// levels are the centered bold cells followed by the centered plain footer
/// cells, and names are the discreet links minus the first and last with the
/// composite index label appended.
fn parse_quality_of_life(document: &Html, city: &str) -> Result<Table> {
    let values: Vec<String> = document.select(&QOL_VALUES).map(cell_text).skip(1).collect();

    let mut levels: Vec<String> = document.select(&QOL_LEVELS_BOLD).map(cell_text).collect();
    levels.extend(document.select(&QOL_LEVELS_PLAIN).map(cell_text));

    let mut names: Vec<String> = document.select(&QOL_NAMES).map(cell_text).collect();
    if names.len() < 2 {
        return Err(ScrapeError::Structure(
            "quality-of-life page carries too few category links".to_string(),
        ));
    }
    names.remove(0);
    names.pop();
    names.push(QOL_FOOTER_LABEL.to_string());

    if names.len() != values.len() || names.len() != levels.len() {
        return Err(ScrapeError::Structure(format!(
            "quality-of-life lists are misaligned: {} names, {} values, {} levels",
            names.len(),
            values.len(),
            levels.len()
        )));
    }

    let mut builder = TableBuilder::new(["Category", "Value", "Level", "City"]);
    for ((name, value), level) in names.into_iter().zip(values).zip(levels) {
        builder.push_row(vec![
            Some(name),
            Some(value),
            Some(level),
            Some(city.to_string()),
        ])?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_names_are_title_cased_and_hyphenated() {
        assert_eq!(url_city_name("rio de janeiro"), "Rio-De-Janeiro");
        assert_eq!(url_city_name("Utrecht"), "Utrecht");
        assert_eq!(url_city_name("SAN ANTONIO"), "San-Antonio");
    }

    #[test]
    fn currency_is_appended_to_city_urls_when_configured() {
        let sections =
            CitySections::new(PageFetcher::with_base_url("http://localhost:9").unwrap());

        assert_eq!(
            sections.city_url(Category::CostOfLiving, "new york", Some("EUR")),
            "http://localhost:9/cost-of-living/in/New-York?displayCurrency=EUR"
        );
        assert_eq!(
            sections.city_url(Category::Crime, "Brasilia", None),
            "http://localhost:9/crime/in/Brasilia"
        );
    }

    const PRICED_PAGE: &str = r#"
        <table class="data_wide_table">
          <tr><th>Restaurants</th></tr>
          <tr><td>Meal, Inexpensive Restaurant</td><td>15.00 €</td><td>12.00-20.00</td></tr>
          <tr><td>Cappuccino (regular)</td><td>3.20 €</td></tr>
          <tr><th>Markets</th></tr>
          <tr><td>Milk (regular), (1 liter)</td><td>1.05 €</td><td>0.90-1.20</td></tr>
        </table>"#;

    #[test]
    fn priced_sections_group_rows_under_their_heading() {
        let document = Html::parse_document(PRICED_PAGE);
        let table = parse_priced_sections(&document, "Rome").unwrap();

        assert_eq!(table.columns(), &["Header", "Category", "Mean", "Range", "City"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[0][0].as_deref(), Some("Restaurants"));
        assert_eq!(table.rows()[1][0].as_deref(), Some("Restaurants"));
        assert_eq!(table.rows()[2][0].as_deref(), Some("Markets"));
        // a two-cell row records an explicit missing range
        assert_eq!(table.rows()[1][3], None);
        assert_eq!(table.rows()[0][3].as_deref(), Some("12.00-20.00"));
    }

    #[test]
    fn price_row_before_any_heading_is_a_structure_error() {
        let document = Html::parse_document(
            r#"<table class="data_wide_table">
                 <tr><td>Meal, Inexpensive Restaurant</td><td>15.00 €</td></tr>
               </table>"#,
        );
        let error = parse_priced_sections(&document, "Rome").unwrap_err();

        assert!(matches!(error, ScrapeError::Structure(_)));
    }

    const POLLUTION_PAGE: &str = r#"
        <h3>Pollution in Lisbon</h3>
        <table class="table_builder_with_value_explanation">
          <tr><td>Air Pollution</td><td>62.5</td><td>High</td></tr>
          <tr><td>Drinking Water Pollution and Inaccessibility</td><td>30.1</td><td>Low</td></tr>
        </table>
        <table class="table_indices">
          <tr><td>Pollution Index:</td><td style="text-align: right">58.43</td></tr>
          <tr><td>Pollution Exp Scale:</td><td style="text-align: right">103.70</td></tr>
        </table>
        <table class="air_quality_table">
          <tr><td>PM10:</td><td>32</td></tr>
          <tr><td>PM2.5:</td><td>17</td></tr>
          <tr><td>Overall Air Quality:</td><td>61.2</td><td>Moderate</td></tr>
        </table>"#;

    #[test]
    fn pollution_page_appends_index_and_widget_rows_in_order() {
        let table = parse_city_page(POLLUTION_PAGE, Category::Pollution, "Lisbon").unwrap();

        assert_eq!(table.columns(), &["Header", "Category", "Value", "Level", "City"]);
        assert_eq!(table.row_count(), 7);
        assert_eq!(table.rows()[0][0].as_deref(), Some("Pollution in Lisbon"));
        assert_eq!(table.rows()[2][0].as_deref(), Some("Index"));
        assert_eq!(table.rows()[2][1].as_deref(), Some("Pollution Index"));
        // the widget's trailing value lands in the last row's level
        let last = table.rows().last().unwrap();
        assert_eq!(last[1].as_deref(), Some("Overall Air Quality"));
        assert_eq!(last[2].as_deref(), Some("61.2"));
        assert_eq!(last[3].as_deref(), Some("Moderate"));
    }

    #[test]
    fn pollution_page_without_widget_contributes_only_sections_and_index() {
        let page = POLLUTION_PAGE.replace("air_quality_table", "somewidget");
        let table = parse_city_page(&page, Category::Pollution, "Lisbon").unwrap();

        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn traffic_pages_have_no_level_column() {
        let page = r#"
            <h3>Traffic in Utrecht</h3>
            <table class="table_builder_with_value_explanation">
              <tr><td>Commute Time</td><td>28.5</td></tr>
            </table>
            <table class="table_indices">
              <tr><td>Traffic Index:</td><td style="text-align: right">102.2</td></tr>
            </table>"#;
        let table = parse_city_page(page, Category::Traffic, "Utrecht").unwrap();

        assert_eq!(table.columns(), &["Header", "Category", "Value", "City"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1].as_deref(), Some("Traffic Index"));
    }

    #[test]
    fn mismatched_heading_and_table_counts_are_a_structure_error() {
        let page = r#"
            <h3>Crime in Porto</h3>
            <h3>Safety in Porto</h3>
            <table class="table_builder_with_value_explanation">
              <tr><td>Crime increasing</td><td>40.0</td><td>Moderate</td></tr>
            </table>"#;
        let error = parse_city_page(page, Category::Crime, "Porto").unwrap_err();

        assert!(matches!(error, ScrapeError::Structure(_)));
    }

    const QOL_PAGE: &str = r#"
        <a class="discreet_link">Toronto</a>
        <a class="discreet_link">Purchasing Power Index</a>
        <a class="discreet_link">Safety Index</a>
        <a class="discreet_link">Health Care Index</a>
        <a class="discreet_link">About these indices</a>
        <td style="text-align: right">ignored lead-in</td>
        <td style="text-align: right">88.21</td>
        <td style="text-align: right">55.05</td>
        <td style="text-align: right">70.37</td>
        <td style="text-align: right">151.96</td>
        <td style="text-align: center; font-weight: 600">Moderate</td>
        <td style="text-align: center; font-weight: 600">Moderate</td>
        <td style="text-align: center; font-weight: 600">High</td>
        <td style="text-align: center">Very High</td>"#;

    #[test]
    fn quality_of_life_zips_its_three_selector_families_in_fixed_order() {
        let table = parse_city_page(
            &format!("<html><body><table><tr>{QOL_PAGE}</tr></table></body></html>"),
            Category::QualityOfLife,
            "Toronto",
        )
        .unwrap();

        assert_eq!(table.columns(), &["Category", "Value", "Level", "City"]);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.rows()[0][0].as_deref(), Some("Purchasing Power Index"));
        assert_eq!(table.rows()[0][1].as_deref(), Some("88.21"));
        let footer = table.rows().last().unwrap();
        assert_eq!(footer[0].as_deref(), Some("Quality of Life Index"));
        assert_eq!(footer[1].as_deref(), Some("151.96"));
        assert_eq!(footer[2].as_deref(), Some("Very High"));
    }

    #[test]
    fn misaligned_quality_of_life_lists_are_a_structure_error() {
        // one level cell too few
        let page = QOL_PAGE.replace(
            r#"<td style="text-align: center">Very High</td>"#,
            "",
        );
        let error = parse_city_page(
            &format!("<html><body><table><tr>{page}</tr></table></body></html>"),
            Category::QualityOfLife,
            "Toronto",
        )
        .unwrap_err();

        assert!(matches!(error, ScrapeError::Structure(_)));
    }
}
