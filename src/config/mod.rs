use crate::domain::Region;
use crate::error::{Result, ScrapeError};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub(crate) mod cli;

pub use cli::Args;

const YEAR_MIN: u16 = 2012;
const YEAR_MAX: u16 = 2025;

/// Currencies the site can convert prices into.
const CURRENCIES: &[&str] = &[
    "AED", "ARS", "AUD", "BGN", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK", "DKK", "EGP",
    "EUR", "GBP", "HKD", "HUF", "IDR", "ILS", "INR", "ISK", "JPY", "KRW", "KWD", "MAD", "MXN",
    "MYR", "NGN", "NOK", "NZD", "PEN", "PHP", "PKR", "PLN", "QAR", "RON", "RSD", "RUB", "SAR",
    "SEK", "SGD", "THB", "TRY", "TWD", "UAH", "USD", "VND", "ZAR",
];

/// Geographic granularity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Country,
    City,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Country => write!(f, "country"),
            Mode::City => write!(f, "city"),
        }
    }
}

/// Subject-matter datasets the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CostOfLiving,
    QualityOfLife,
    Crime,
    HealthCare,
    Pollution,
    Traffic,
    PropertyInvestment,
    HistoricalData,
}

impl Category {
    /// URL path segment for this category.
    pub fn slug(self) -> &'static str {
        match self {
            Category::CostOfLiving => "cost-of-living",
            Category::QualityOfLife => "quality-of-life",
            Category::Crime => "crime",
            Category::HealthCare => "health-care",
            Category::Pollution => "pollution",
            Category::Traffic => "traffic",
            Category::PropertyInvestment => "property-investment",
            Category::HistoricalData => "historical-data",
        }
    }

    /// City pages of these categories quote prices, so they need a display
    /// currency.
    fn is_monetary(self) -> bool {
        matches!(self, Category::CostOfLiving | Category::PropertyInvestment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// A ranking-page year: either a plain year or the site's mid-year snapshot
/// tag (`2019-mid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Year {
    Full(u16),
    Mid(u16),
}

impl Year {
    /// The numeric year regardless of tag.
    pub fn value(self) -> u16 {
        match self {
            Year::Full(year) | Year::Mid(year) => year,
        }
    }

    /// The year as an integer when it carries no half-year tag. Historical
    /// series are keyed on plain integer years, so mid-year tags never match
    /// there.
    pub fn full(self) -> Option<u16> {
        match self {
            Year::Full(year) => Some(year),
            Year::Mid(_) => None,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Full(year) => write!(f, "{year}"),
            Year::Mid(year) => write!(f, "{year}-mid"),
        }
    }
}

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct YearVisitor;

        impl de::Visitor<'_> for YearVisitor {
            type Value = Year;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an integer year or a \"<year>-mid\" tag")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Year, E> {
                u16::try_from(v)
                    .map(Year::Full)
                    .map_err(|_| E::custom(format!("year {v} is out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Year, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("year {v} is out of range")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Year, E> {
                v.strip_suffix("-mid")
                    .and_then(|year| year.parse::<u16>().ok())
                    .map(Year::Mid)
                    .ok_or_else(|| E::custom(format!("unrecognized year tag {v:?}")))
            }
        }

        deserializer.deserialize_any(YearVisitor)
    }
}

/// One scrape request. Deserialized once from YAML, validated once, then
/// consumed read-only for the whole run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub categories: Vec<Category>,
    pub mode: Mode,
    #[serde(deserialize_with = "one_or_many")]
    pub years: Vec<Year>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub regions: Vec<Region>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub countries: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub cities: Vec<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub historical_items: Vec<String>,
}

impl ScrapeConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Checks every cross-field invariant in one pass and reports all
    /// violations together. Runs before any network activity.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if self.categories.is_empty() {
            violations.push("at least one category must be requested".to_string());
        }
        if self.years.is_empty() {
            violations.push("at least one year must be requested".to_string());
        }
        for year in &self.years {
            if !(YEAR_MIN..=YEAR_MAX).contains(&year.value()) {
                violations.push(format!(
                    "year {year} is outside the supported range {YEAR_MIN}-{YEAR_MAX}"
                ));
            }
        }

        if self.mode == Mode::City && self.cities.is_empty() {
            violations.push("mode `city` requires a non-empty `cities` list".to_string());
        }

        let wants_historical = self.categories.contains(&Category::HistoricalData);
        if wants_historical && self.mode == Mode::City {
            violations
                .push("category `historical-data` is only available in `country` mode".to_string());
        }
        if wants_historical && self.historical_items.is_empty() {
            violations.push(
                "category `historical-data` requires a non-empty `historical_items` list"
                    .to_string(),
            );
        }

        let needs_currency = wants_historical
            || (self.mode == Mode::City && self.categories.iter().any(|c| c.is_monetary()));
        match &self.currency {
            Some(currency) if !CURRENCIES.contains(&currency.as_str()) => {
                violations.push(format!("currency {currency:?} is not a recognized code"));
            }
            None if needs_currency => {
                violations.push(
                    "a `currency` is required for monetary city categories and historical-data"
                        .to_string(),
                );
            }
            _ => {}
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ScrapeError::Validation(violations))
        }
    }
}

/// Accepts either a single scalar or a sequence, mirroring the YAML inputs
/// the scraper has always taken (`categories: crime` and
/// `categories: [crime, pollution]` both work).
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
