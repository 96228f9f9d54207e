//! Selector-driven extraction: one record per matched container element.

use scraper::{ElementRef, Html, Selector};

use pricescout_core::{Product, StoreDescriptor};

use super::urls::{first_srcset_url, resolve_image, resolve_url};
use super::RawRecord;
use crate::error::ScraperError;
use crate::normalize::{normalize_price, normalize_rating};

/// Image attributes checked in order; lazy-loading themes leave `src` as a
/// placeholder and put the real URL in one of the others.
const IMAGE_ATTRS: &[&str] = &[
    "src",
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-lazy",
    "data-srcset",
    "srcset",
];

const PRICE_ATTRS: &[&str] = &["content", "data-price", "data-price-amount"];

const RATING_ATTRS: &[&str] = &["data-rating", "aria-label", "title", "content"];

struct CompiledSelectors {
    container: Selector,
    name: Option<Selector>,
    price: Option<Selector>,
    link: Option<Selector>,
    image: Option<Selector>,
    rating: Option<Selector>,
}

impl CompiledSelectors {
    /// Returns `Ok(None)` when the store has no container selector.
    fn compile(store: &StoreDescriptor) -> Result<Option<Self>, ScraperError> {
        let selectors = &store.selectors;
        let Some(container) = selectors.container.as_deref() else {
            return Ok(None);
        };
        let optional = |field: &'static str, raw: Option<&str>| {
            raw.map(|s| compile_selector(store, field, s)).transpose()
        };
        Ok(Some(Self {
            container: compile_selector(store, "container", container)?,
            name: optional("name", selectors.name.as_deref())?,
            price: optional("price", selectors.price.as_deref())?,
            link: optional("link", selectors.link.as_deref())?,
            image: optional("image", selectors.image.as_deref())?,
            rating: optional("rating", selectors.rating.as_deref())?,
        }))
    }
}

fn compile_selector(
    store: &StoreDescriptor,
    field: &'static str,
    raw: &str,
) -> Result<Selector, ScraperError> {
    Selector::parse(raw).map_err(|_| ScraperError::InvalidSelector {
        store: store.id.clone(),
        field,
        selector: raw.to_string(),
    })
}

pub(super) fn extract(
    document: &Html,
    store: &StoreDescriptor,
    page_url: &str,
) -> Result<Vec<Product>, ScraperError> {
    let Some(selectors) = CompiledSelectors::compile(store)? else {
        return Ok(Vec::new());
    };

    let mut products = Vec::new();
    for (index, container) in document.select(&selectors.container).enumerate() {
        if products.len() >= store.max_results {
            break;
        }
        let record = read_record(container, &selectors, store.origin(), page_url);
        if let Some(product) = record.into_product(store, index) {
            products.push(product);
        }
    }
    Ok(products)
}

fn read_record(
    container: ElementRef<'_>,
    selectors: &CompiledSelectors,
    origin: &str,
    page_url: &str,
) -> RawRecord {
    let first = |sel: &Option<Selector>| sel.as_ref().and_then(|s| container.select(s).next());

    let link_el = match &selectors.link {
        Some(sel) => container.select(sel).next(),
        None => own_or_first_anchor(container),
    };

    let name = match first(&selectors.name) {
        Some(el) => element_text(el),
        None => link_el.map(element_text).unwrap_or_default(),
    };

    let price = first(&selectors.price).map_or(0.0, read_price);

    let url = link_el
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .map_or_else(|| page_url.to_string(), |href| resolve_url(origin, href));

    let image_url = resolve_image(origin, first(&selectors.image).and_then(image_source));

    let rating = first(&selectors.rating).and_then(read_rating);

    RawRecord {
        name,
        price,
        currency: None,
        url,
        image_url,
        rating,
        in_stock: true,
    }
}

fn own_or_first_anchor(container: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if container.value().name() == "a" && container.value().attr("href").is_some() {
        return Some(container);
    }
    let anchor = Selector::parse("a[href]").ok()?;
    container.select(&anchor).next()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text first, then machine-readable attributes such as
/// `itemprop="price" content="..."`.
fn read_price(el: ElementRef<'_>) -> f64 {
    let from_text = normalize_price(&element_text(el));
    if from_text > 0.0 {
        return from_text;
    }
    PRICE_ATTRS
        .iter()
        .filter_map(|attr| el.value().attr(attr))
        .map(normalize_price)
        .find(|p| *p > 0.0)
        .unwrap_or(0.0)
}

fn read_rating(el: ElementRef<'_>) -> Option<f64> {
    normalize_rating(&element_text(el)).or_else(|| {
        RATING_ATTRS
            .iter()
            .filter_map(|attr| el.value().attr(attr))
            .find_map(normalize_rating)
    })
}

fn image_source(el: ElementRef<'_>) -> Option<&str> {
    // The selector may land on a wrapper rather than the <img> itself.
    let img = if el.value().name() == "img" {
        el
    } else {
        Selector::parse("img")
            .ok()
            .and_then(|sel| el.select(&sel).next())
            .unwrap_or(el)
    };

    IMAGE_ATTRS.iter().find_map(|attr| {
        let value = img.value().attr(attr)?.trim();
        let value = if attr.ends_with("srcset") {
            first_srcset_url(value)?
        } else {
            value
        };
        (!value.is_empty() && !value.starts_with("data:")).then_some(value)
    })
}

/// Reads the first price matched by `selector` anywhere in the document.
pub(crate) fn first_price_match(document: &Html, selector: &str) -> Option<f64> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(read_price)
        .find(|p| *p > 0.0)
}
