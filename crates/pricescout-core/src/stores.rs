use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::StoreSummary;
use crate::ConfigError;

/// How a store's result page is turned into products.
///
/// Adding a store is a registry change; the set of methods is closed and
/// dispatched centrally by the scraper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Server-rendered HTML read through CSS selectors.
    #[serde(alias = "cheerio")]
    Markup,
    /// schema.org JSON-LD blocks, falling back to selectors on the same page.
    #[serde(alias = "jsonld")]
    StructuredData,
    /// Client-rendered pages loaded in the shared headless browser.
    #[serde(alias = "puppeteer")]
    Rendered,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::Markup => write!(f, "markup"),
            ExtractionMethod::StructuredData => write!(f, "structured-data"),
            ExtractionMethod::Rendered => write!(f, "rendered"),
        }
    }
}

/// CSS selectors for markup extraction. Every field but `container` and
/// `product_price` is evaluated relative to a matched container element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    /// Price on a single product's page, matched against the whole document.
    #[serde(default)]
    pub product_price: Option<String>,
}

impl SelectorSet {
    /// Configured selectors paired with their field name.
    pub fn configured(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("container", &self.container),
            ("name", &self.name),
            ("price", &self.price),
            ("link", &self.link),
            ("image", &self.image),
            ("rating", &self.rating),
            ("product_price", &self.product_price),
        ]
        .into_iter()
        .filter_map(|(field, sel)| sel.as_deref().map(|s| (field, s)))
    }
}

/// Static description of one storefront. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub id: String,
    pub name: String,
    /// Scheme and host, e.g. `"https://www.public.cy"`.
    pub base_url: String,
    /// Path appended to `base_url`; `{query}` is replaced with the encoded query.
    pub search_path: String,
    pub method: ExtractionMethod,
    #[serde(default)]
    pub selectors: SelectorSet,
    /// Rendered stores only: element that signals results have been drawn.
    #[serde(default)]
    pub ready_selector: Option<String>,
    /// Query keyword to category path, used when search is missing or skipped.
    #[serde(default)]
    pub category_fallbacks: BTreeMap<String, String>,
    /// Navigate straight to the matching category page instead of trying
    /// search first.
    #[serde(default)]
    pub category_first: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub delivery_speed: Option<String>,
    #[serde(default)]
    pub service_quality: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub covers_island: bool,
}

fn default_max_results() -> usize {
    12
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl StoreDescriptor {
    /// Merchandising snapshot embedded into every product from this store.
    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            rating: self.rating,
            delivery_speed: self.delivery_speed.clone(),
            service_quality: self.service_quality,
            city: self.city.clone(),
            location: self.location.clone(),
            covers_island: self.covers_island,
        }
    }

    /// `base_url` without a trailing slash.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns `true` for sample entries pointing at an `example` domain.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        host_of(&self.base_url).is_none_or(|h| h.to_ascii_lowercase().contains("example"))
    }
}

/// Extracts the host from an absolute http(s) URL, without port or userinfo.
#[must_use]
pub fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

#[derive(Debug, Deserialize)]
pub struct StoresFile {
    #[serde(default)]
    pub stores: Vec<StoreDescriptor>,
}

/// Load and validate the store registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_stores(&content)
}

/// Parse and validate a store registry from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_stores(yaml: &str) -> Result<StoresFile, ConfigError> {
    let stores_file: StoresFile = serde_yaml::from_str(yaml)?;
    validate_stores(&stores_file)?;
    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for store in &stores_file.stores {
        let id = store.id.trim();
        if id.is_empty() {
            return Err(ConfigError::Validation(
                "store id must be non-empty".to_string(),
            ));
        }
        if !seen_ids.insert(id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{id}'"
            )));
        }
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' has an empty name"
            )));
        }
        if host_of(&store.base_url).is_none() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' has invalid base_url '{}'; expected http(s)://host",
                store.base_url
            )));
        }
        if !store.search_path.contains("{query}") {
            return Err(ConfigError::Validation(format!(
                "store '{id}' search_path must contain the {{query}} placeholder"
            )));
        }
        if store.max_results == 0 {
            return Err(ConfigError::Validation(format!(
                "store '{id}' max_results must be greater than zero"
            )));
        }
        if let Some(rating) = store.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ConfigError::Validation(format!(
                    "store '{id}' rating {rating} is outside 0-5"
                )));
            }
        }
        if store.method != ExtractionMethod::StructuredData
            && store.selectors.container.is_none()
        {
            return Err(ConfigError::Validation(format!(
                "store '{id}' uses {} extraction but has no container selector",
                store.method
            )));
        }

        let ready = store.ready_selector.as_deref();
        let extra = ready.map(|s| ("ready_selector", s));
        for (field, selector) in store.selectors.configured().chain(extra) {
            if scraper::Selector::parse(selector).is_err() {
                return Err(ConfigError::Validation(format!(
                    "store '{id}' {field} selector '{selector}' is not valid CSS"
                )));
            }
        }

        for (keyword, path) in &store.category_fallbacks {
            if keyword.trim().is_empty() || path.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "store '{id}' has an empty category fallback entry"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
