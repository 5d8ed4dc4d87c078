use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

pub(crate) mod city;
pub(crate) mod country;
pub(crate) mod historical;
pub(crate) mod index_table;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapses an element's text into trimmed, single-spaced form. Page cells
/// routinely carry newlines and indentation from the markup.
pub(crate) fn cell_text(element: ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// All selectors in this crate are static strings describing the one page
/// layout the extractors are tied to.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should parse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn cell_text_collapses_markup_whitespace() {
        let html = Html::parse_fragment(
            "<table><tr><td>\n      Cost of Living\n      Index\n    </td></tr></table>",
        );
        let td = html.select(&selector("td")).next().unwrap();

        assert_eq!(cell_text(td), "Cost of Living Index");
    }
}
