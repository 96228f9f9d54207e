//! Static-HTML product extraction.
//!
//! Two strategies run against one parsed document: schema.org JSON-LD
//! ([`structured`]) and configured CSS selectors ([`markup`]). Stores using
//! structured data, and every rendered page, try JSON-LD first and fall back
//! to selectors on the same document when it yields nothing. Markup stores
//! only use selectors.

mod markup;
mod structured;
mod urls;

use scraper::Html;

use pricescout_core::{ExtractionMethod, Product, StoreDescriptor};

use crate::error::ScraperError;

pub use urls::{resolve_image, resolve_url};

pub(crate) use markup::first_price_match;
pub(crate) use structured::structured_price;

/// Extracts up to `store.max_results` products from an HTML document.
///
/// `page_url` is the absolute URL the document was loaded from; it stands in
/// for products whose link could not be read.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] if a configured selector does
/// not parse. Malformed records and JSON-LD blocks are skipped, not errors.
pub fn extract_products(
    html: &str,
    store: &StoreDescriptor,
    page_url: &str,
) -> Result<Vec<Product>, ScraperError> {
    let document = Html::parse_document(html);

    if matches!(
        store.method,
        ExtractionMethod::StructuredData | ExtractionMethod::Rendered
    ) {
        let products = structured::extract(&document, store, page_url);
        if !products.is_empty() {
            tracing::debug!(
                store = %store.id,
                count = products.len(),
                "read products from JSON-LD"
            );
            return Ok(products);
        }
        tracing::debug!(store = %store.id, "no JSON-LD products; trying markup selectors");
    }

    markup::extract(&document, store, page_url)
}

/// Fields read for one product before invariants are checked.
#[derive(Debug, Default)]
struct RawRecord {
    name: String,
    price: f64,
    currency: Option<String>,
    url: String,
    image_url: String,
    rating: Option<f64>,
    in_stock: bool,
}

impl RawRecord {
    /// Turns the record into a [`Product`], or `None` when it has no name or
    /// no positive price.
    fn into_product(self, store: &StoreDescriptor, index: usize) -> Option<Product> {
        let name = self.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() || !(self.price.is_finite() && self.price > 0.0) {
            tracing::debug!(
                store = %store.id,
                index,
                name,
                price = self.price,
                "dropping record without name or positive price"
            );
            return None;
        }

        Some(Product {
            id: format!("{}-{index}", store.id),
            name,
            price: self.price,
            currency: self
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| store.currency.clone()),
            store: store.summary(),
            url: self.url,
            image_url: self.image_url,
            rating: self.rating.filter(|r| (0.0..=5.0).contains(r)),
            delivery_time: store.delivery_speed.clone(),
            in_stock: self.in_stock,
        })
    }
}
