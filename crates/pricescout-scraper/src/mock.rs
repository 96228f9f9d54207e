//! Synthetic catalog returned when live extraction has nothing to offer.

use std::collections::BTreeMap;

use rand::Rng;

use pricescout_core::{ExtractionMethod, Product, SelectorSet, StoreDescriptor};

use crate::routing::search_url;

const PRICE_FLOOR: f64 = 10.0;
const BASE_PRICE_MIN: f64 = 20.0;
const BASE_PRICE_MAX: f64 = 220.0;
const PRICE_JITTER: f64 = 15.0;
const RATING_JITTER: f64 = 0.25;
const IN_STOCK_PROBABILITY: f64 = 0.8;

/// Generates 2 to 4 products per store, sorted by ascending price.
///
/// Every product carries its store's merchandising metadata, a name that
/// contains `query`, and a price of at least 10.
pub fn generate_mock_products<R: Rng + ?Sized>(
    query: &str,
    stores: &[StoreDescriptor],
    rng: &mut R,
) -> Vec<Product> {
    let query = query.trim();
    let slug = slugify(query);
    let mut products = Vec::new();

    for store in stores {
        let count = rng.random_range(2..=4_usize);
        let url = search_url(store, query);
        for i in 0..count {
            let base = rng.random_range(BASE_PRICE_MIN..BASE_PRICE_MAX);
            let jitter = rng.random_range(-PRICE_JITTER..PRICE_JITTER);
            let price = round_cents((base + jitter).max(PRICE_FLOOR));

            let rating = store.rating.map(|r| {
                let jittered = r + rng.random_range(-RATING_JITTER..RATING_JITTER);
                (jittered.clamp(0.0, 5.0) * 10.0).round() / 10.0
            });

            products.push(Product {
                id: format!("{}-{slug}-{i}", store.id),
                name: format!("{query} - {} {}", store.name, i + 1),
                price,
                currency: store.currency.clone(),
                store: store.summary(),
                url: url.clone(),
                image_url: String::new(),
                rating,
                delivery_time: store.delivery_speed.clone(),
                in_stock: rng.random_bool(IN_STOCK_PROBABILITY),
            });
        }
    }

    products.sort_by(|a, b| a.price.total_cmp(&b.price));
    products
}

fn slugify(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Merchandising data for one of the built-in synthetic stores.
struct MockStore {
    id: &'static str,
    name: &'static str,
    rating: f64,
    delivery: &'static str,
    service: f64,
    city: &'static str,
    location: &'static str,
    covers_island: bool,
}

const MOCK_STORES: [MockStore; 5] = [
    MockStore {
        id: "store1",
        name: "Cyprus Electronics",
        rating: 4.5,
        delivery: "2-3 days",
        service: 4.2,
        city: "nicosia",
        location: "Nicosia",
        covers_island: true,
    },
    MockStore {
        id: "store2",
        name: "Mediterranean Market",
        rating: 4.3,
        delivery: "1-2 days",
        service: 4.0,
        city: "limassol",
        location: "Limassol",
        covers_island: false,
    },
    MockStore {
        id: "store3",
        name: "Island Wide Store",
        rating: 4.7,
        delivery: "3-5 days",
        service: 4.5,
        city: "larnaca",
        location: "Larnaca",
        covers_island: true,
    },
    MockStore {
        id: "store4",
        name: "Paphos Premium",
        rating: 4.4,
        delivery: "2-4 days",
        service: 4.3,
        city: "paphos",
        location: "Paphos",
        covers_island: false,
    },
    MockStore {
        id: "store5",
        name: "Coastal Goods",
        rating: 4.6,
        delivery: "1-3 days",
        service: 4.4,
        city: "ayia-napa",
        location: "Ayia Napa",
        covers_island: false,
    },
];

impl MockStore {
    fn descriptor(&self) -> StoreDescriptor {
        StoreDescriptor {
            id: self.id.to_string(),
            name: self.name.to_string(),
            base_url: "https://example.com".to_string(),
            search_path: format!("/search?store={}&q={{query}}", self.id),
            method: ExtractionMethod::Markup,
            selectors: SelectorSet::default(),
            ready_selector: None,
            category_fallbacks: BTreeMap::new(),
            category_first: false,
            max_results: 12,
            currency: "EUR".to_string(),
            rating: Some(self.rating),
            delivery_speed: Some(self.delivery.to_string()),
            service_quality: Some(self.service),
            city: Some(self.city.to_string()),
            location: Some(self.location.to_string()),
            covers_island: self.covers_island,
        }
    }
}

/// Store set used for synthetic output when the registry has no entries.
#[must_use]
pub fn default_mock_stores() -> Vec<StoreDescriptor> {
    MOCK_STORES.iter().map(MockStore::descriptor).collect()
}
