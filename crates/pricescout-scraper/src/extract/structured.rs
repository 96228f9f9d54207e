//! schema.org `Product` extraction from embedded JSON-LD.

use scraper::{Html, Selector};
use serde_json::Value;

use pricescout_core::{Product, StoreDescriptor};

use super::urls::{resolve_image, resolve_url};
use super::RawRecord;
use crate::normalize::{normalize_price, normalize_rating};

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Availability values that mean the item cannot be bought right now.
const UNAVAILABLE: &[&str] = &["OutOfStock", "SoldOut", "Discontinued"];

pub(super) fn extract(document: &Html, store: &StoreDescriptor, page_url: &str) -> Vec<Product> {
    let origin = store.origin();
    let mut products = Vec::new();

    for (index, node) in product_nodes(document).into_iter().enumerate() {
        if products.len() >= store.max_results {
            break;
        }
        let record = read_record(&node, origin, page_url);
        if let Some(product) = record.into_product(store, index) {
            products.push(product);
        }
    }
    products
}

/// Price of the first JSON-LD `Product` on the page that has one.
pub(crate) fn structured_price(document: &Html) -> Option<f64> {
    product_nodes(document)
        .iter()
        .filter_map(|node| node.get("offers"))
        .map(|offers| read_offer(offers).0)
        .find(|p| *p > 0.0)
}

fn product_nodes(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(JSON_LD_SELECTOR) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => collect_products(value, &mut found),
            Err(e) => tracing::debug!(error = %e, "skipping malformed JSON-LD block"),
        }
    }
    found
}

fn collect_products(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(mut map) => {
            if has_type(map.get("@type"), "Product") {
                out.push(Value::Object(map));
                return;
            }
            for key in ["@graph", "itemListElement", "item", "mainEntity"] {
                if let Some(child) = map.remove(key) {
                    collect_products(child, out);
                }
            }
        }
        _ => {}
    }
}

fn has_type(value: Option<&Value>, wanted: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == wanted || s.ends_with(&format!("/{wanted}")),
        Some(Value::Array(items)) => items.iter().any(|v| has_type(Some(v), wanted)),
        _ => false,
    }
}

fn read_record(node: &Value, origin: &str, page_url: &str) -> RawRecord {
    let name = node
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let (price, currency, in_stock) = node.get("offers").map_or((0.0, None, true), read_offer);

    let url = node
        .get("url")
        .and_then(first_url)
        .or_else(|| offer_url(node))
        .filter(|u| !u.trim().is_empty())
        .map_or_else(|| page_url.to_string(), |u| resolve_url(origin, u.trim()));

    let image_url = resolve_image(origin, node.get("image").and_then(first_url));

    let rating = node
        .get("aggregateRating")
        .and_then(|r| r.get("ratingValue"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64().and_then(|f| normalize_rating(&f.to_string())),
            Value::String(s) => normalize_rating(s),
            _ => None,
        });

    RawRecord {
        name,
        price,
        currency,
        url,
        image_url,
        rating,
        in_stock,
    }
}

fn offer_url(node: &Value) -> Option<&str> {
    first_offer(node.get("offers")?)?.get("url")?.as_str()
}

fn first_offer(offers: &Value) -> Option<&Value> {
    match offers {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(offers),
        _ => None,
    }
}

/// Reads `(price, currency, in_stock)` from an `offers` value, which may be a
/// single `Offer`, an `AggregateOffer` or an array of either.
fn read_offer(offers: &Value) -> (f64, Option<String>, bool) {
    let Some(offer) = first_offer(offers) else {
        return (0.0, None, true);
    };

    let price = ["price", "lowPrice"]
        .iter()
        .filter_map(|key| offer.get(*key))
        .chain(
            offer
                .get("priceSpecification")
                .and_then(|spec| first_offer(spec)?.get("price")),
        )
        .map(price_value)
        .find(|p| *p > 0.0)
        .unwrap_or(0.0);

    let currency = offer
        .get("priceCurrency")
        .and_then(Value::as_str)
        .map(str::to_string);

    let in_stock = offer
        .get("availability")
        .and_then(Value::as_str)
        .is_none_or(|a| !UNAVAILABLE.iter().any(|u| a.ends_with(u)));

    (price, currency, in_stock)
}

fn price_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => normalize_price(s),
        _ => 0.0,
    }
}

/// `image` and `url` show up as a string, an array, or an `ImageObject`.
fn first_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(first_url),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(first_url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pricescout_core::{ExtractionMethod, SelectorSet};

    use super::*;

    fn make_store() -> StoreDescriptor {
        StoreDescriptor {
            id: "ld".to_string(),
            name: "LD Shop".to_string(),
            base_url: "https://ld.test".to_string(),
            search_path: "/search?q={query}".to_string(),
            method: ExtractionMethod::StructuredData,
            selectors: SelectorSet::default(),
            ready_selector: None,
            category_fallbacks: BTreeMap::new(),
            category_first: false,
            max_results: 12,
            currency: "EUR".to_string(),
            rating: None,
            delivery_speed: None,
            service_quality: None,
            city: Some("limassol".to_string()),
            location: None,
            covers_island: false,
        }
    }

    fn page(blocks: &[&str]) -> Html {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        Html::parse_document(&format!("<html><head>{scripts}</head><body></body></html>"))
    }

    const PAGE_URL: &str = "https://ld.test/search?q=kettle";

    #[test]
    fn reads_item_list_of_products() {
        let doc = page(&[r#"{
            "@context": "https://schema.org",
            "@type": "ItemList",
            "itemListElement": [
              {"@type": "ListItem", "position": 1, "item": {
                "@type": "Product", "name": "Philips Kettle",
                "url": "/p/philips-kettle",
                "image": ["https://cdn.ld.test/k1.jpg"],
                "offers": {"@type": "Offer", "price": "39.90", "priceCurrency": "EUR",
                           "availability": "https://schema.org/InStock"},
                "aggregateRating": {"ratingValue": "4.6"}
              }},
              {"@type": "ListItem", "position": 2, "item": {
                "@type": ["Product", "Thing"], "name": "Tefal Kettle",
                "image": {"@type": "ImageObject", "url": "/img/tefal.jpg"},
                "offers": [{"price": 24.5, "availability": "http://schema.org/OutOfStock"}]
              }}
            ]
        }"#]);

        let products = extract(&doc, &make_store(), PAGE_URL);
        assert_eq!(products.len(), 2);

        let philips = &products[0];
        assert_eq!(philips.id, "ld-0");
        assert_eq!(philips.name, "Philips Kettle");
        assert!((philips.price - 39.9).abs() < 1e-9);
        assert_eq!(philips.url, "https://ld.test/p/philips-kettle");
        assert_eq!(philips.image_url, "https://cdn.ld.test/k1.jpg");
        assert_eq!(philips.rating, Some(4.6));
        assert!(philips.in_stock);

        let tefal = &products[1];
        assert!((tefal.price - 24.5).abs() < 1e-9);
        assert_eq!(tefal.currency, "EUR");
        assert_eq!(tefal.url, PAGE_URL);
        assert_eq!(tefal.image_url, "https://ld.test/img/tefal.jpg");
        assert!(!tefal.in_stock);
    }

    #[test]
    fn reads_graph_and_aggregate_offer() {
        let doc = page(&[r#"{"@graph": [
            {"@type": "WebPage", "name": "Results"},
            {"@type": "Product", "name": "Dyson V15",
             "offers": {"@type": "AggregateOffer", "lowPrice": "€ 649,00", "priceCurrency": "EUR"}}
        ]}"#]);
        let products = extract(&doc, &make_store(), PAGE_URL);
        assert_eq!(products.len(), 1);
        assert!((products[0].price - 649.0).abs() < 1e-9);
    }

    #[test]
    fn reads_price_specification() {
        let doc = page(&[r#"{"@type": "Product", "name": "Router",
            "offers": {"priceSpecification": {"price": 89}}}"#]);
        let products = extract(&doc, &make_store(), PAGE_URL);
        assert!((products[0].price - 89.0).abs() < 1e-9);
    }

    #[test]
    fn skips_malformed_blocks_and_priceless_products() {
        let doc = page(&[
            "{ not json",
            r#"{"@type": "Product", "name": "No Offer"}"#,
            r#"{"@type": "Product", "name": "Mouse", "offers": {"price": "12.00"}}"#,
        ]);
        let products = extract(&doc, &make_store(), PAGE_URL);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Mouse");
        assert_eq!(products[0].id, "ld-1");
    }

    fn product_block(i: usize) -> String {
        format!(r#"{{"@type":"Product","name":"Item {i}","offers":{{"price":{i}}}}}"#)
    }

    #[test]
    fn respects_result_cap() {
        let block = (1..=20)
            .map(product_block)
            .collect::<Vec<_>>()
            .join(",");
        let doc = page(&[&format!("[{block}]")]);
        let mut store = make_store();
        store.max_results = 5;
        assert_eq!(extract(&doc, &store, PAGE_URL).len(), 5);
    }

    #[test]
    fn structured_price_reads_first_offer() {
        let doc = page(&[
            r#"{"@type": "BreadcrumbList"}"#,
            r#"{"@type": "Product", "name": "Mouse", "offers": {"price": "12.00"}}"#,
        ]);
        assert_eq!(structured_price(&doc), Some(12.0));
        assert_eq!(structured_price(&page(&[])), None);
    }
}
