use crate::config::{Category, Mode, ScrapeConfig};
use crate::domain::{NamedTable, Table};
use crate::error::{Result, ScrapeError};
use crate::infrastructure::extractors::city::CitySections;
use crate::infrastructure::extractors::country::CountryRankings;
use crate::infrastructure::extractors::historical::HistoricalSeries;
use crate::infrastructure::fetcher::{PageFetcher, BASE_URL};
use tracing::info;

/// Drives one extraction run: validates the configuration up front, then
/// dispatches every requested category to its extractor by (mode, category)
/// and collects the named tables in request order.
#[derive(Debug)]
pub struct Orchestrator {
    config: ScrapeConfig,
    rankings: CountryRankings,
    historical: HistoricalSeries,
    cities: CitySections,
}

impl Orchestrator {
    /// Validates the configuration before any network activity.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Like [`Orchestrator::new`], pointed at a different host. Used by tests
    /// to run against a local server.
    pub fn with_base_url(config: ScrapeConfig, base_url: &str) -> Result<Self> {
        config.validate()?;
        let fetcher = PageFetcher::with_base_url(base_url)?;

        Ok(Self {
            config,
            rankings: CountryRankings::new(fetcher.clone()),
            historical: HistoricalSeries::new(fetcher.clone()),
            cities: CitySections::new(fetcher),
        })
    }

    /// One named table per requested category. An extractor error aborts the
    /// remaining categories; failed sub-requests inside a category were
    /// already absorbed by the extractor.
    pub async fn run(&self) -> Result<Vec<NamedTable>> {
        let mut results = Vec::with_capacity(self.config.categories.len());

        for &category in &self.config.categories {
            info!("extracting {category} in {} mode", self.config.mode);
            let table = self.extract_category(category).await?;
            info!(
                "{category}: {} rows x {} columns",
                table.row_count(),
                table.column_count()
            );
            results.push((format!("{category}_{}", self.config.mode), table));
        }

        Ok(results)
    }

    async fn extract_category(&self, category: Category) -> Result<Table> {
        match (self.config.mode, category) {
            (Mode::Country, Category::HistoricalData) => {
                let currency = self.config.currency.as_deref().ok_or_else(|| {
                    ScrapeError::Validation(vec![
                        "a `currency` is required for historical-data".to_string()
                    ])
                })?;
                self.historical
                    .extract(
                        &self.config.historical_items,
                        &self.config.countries,
                        &self.config.years,
                        currency,
                    )
                    .await
            }
            (Mode::Country, category) => {
                self.rankings
                    .extract(
                        category,
                        &self.config.regions,
                        &self.config.years,
                        &self.config.countries,
                    )
                    .await
            }
            (Mode::City, Category::HistoricalData) => Err(ScrapeError::Validation(vec![
                "category `historical-data` is only available in `country` mode".to_string(),
            ])),
            (Mode::City, category) => {
                self.cities
                    .extract(
                        category,
                        &self.config.cities,
                        self.config.currency.as_deref(),
                    )
                    .await
            }
        }
    }
}
