//! Query-level orchestration: concurrent fan-out to every store, merge,
//! filtering, price sort, and the synthetic fallback.

use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use pricescout_core::{AppConfig, Product, StoreDescriptor};

use crate::browser::{BrowserSession, BrowserSettings};
use crate::client::StoreClient;
use crate::dispatch::StoreDispatcher;
use crate::error::ScraperError;
use crate::mock::{default_mock_stores, generate_mock_products};
use crate::relevance::filter_relevant;

/// Why a search answered with synthetic products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MockReason {
    /// The registry is empty or holds only placeholder entries.
    NoLiveStores,
    /// Every store was tried and none produced a product.
    NothingExtracted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Live,
    Mock(MockReason),
}

/// Products for one query, plus where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub products: Vec<Product>,
    pub source: ResultSource,
}

/// Runs searches against a fixed store registry.
///
/// Cheap to share behind an `Arc`; concurrent searches reuse the same HTTP
/// client and browser session.
#[derive(Debug)]
pub struct SearchEngine {
    stores: Vec<StoreDescriptor>,
    dispatcher: StoreDispatcher,
    mock_seed: Option<u64>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(
        stores: Vec<StoreDescriptor>,
        dispatcher: StoreDispatcher,
        mock_seed: Option<u64>,
    ) -> Self {
        Self {
            stores,
            dispatcher,
            mock_seed,
        }
    }

    /// Builds the HTTP client and browser session described by `config`.
    ///
    /// The browser is not launched here; that happens on the first
    /// rendered-store scrape.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(
        config: &AppConfig,
        stores: Vec<StoreDescriptor>,
    ) -> Result<Self, ScraperError> {
        let client = StoreClient::new(
            config.http_timeout_secs,
            &config.user_agent,
            &config.accept_language,
        )?;
        let browser = BrowserSession::new(BrowserSettings {
            enabled: config.browser_enabled,
            chrome_executable: config.chrome_executable.clone(),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        });
        Ok(Self::new(
            stores,
            StoreDispatcher::new(client, browser),
            config.mock_seed,
        ))
    }

    #[must_use]
    pub fn stores(&self) -> &[StoreDescriptor] {
        &self.stores
    }

    pub(crate) fn dispatcher(&self) -> &StoreDispatcher {
        &self.dispatcher
    }

    /// Products matching `query`, ascending by price.
    ///
    /// `location` of `None`, empty, or `"all"` keeps every store. Never
    /// fails: when no live product is found the synthetic catalog is
    /// returned instead.
    pub async fn search(&self, query: &str, location: Option<&str>) -> Vec<Product> {
        self.search_detailed(query, location).await.products
    }

    /// Like [`Self::search`], but also reports whether the products are live.
    pub async fn search_detailed(&self, query: &str, location: Option<&str>) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            tracing::warn!("empty search query; returning no products");
            return SearchOutcome {
                products: Vec::new(),
                source: ResultSource::Live,
            };
        }

        let live_stores: Vec<&StoreDescriptor> =
            self.stores.iter().filter(|s| !s.is_placeholder()).collect();

        let (merged, source) = if live_stores.is_empty() {
            tracing::info!(query, reason = "no live stores", "using mock products");
            (
                self.mock_products(query),
                ResultSource::Mock(MockReason::NoLiveStores),
            )
        } else {
            let merged = self.collect(&live_stores, query).await;
            if merged.is_empty() {
                tracing::info!(query, reason = "nothing extracted", "using mock products");
                (
                    self.mock_products(query),
                    ResultSource::Mock(MockReason::NothingExtracted),
                )
            } else {
                (merged, ResultSource::Live)
            }
        };

        let relevant = filter_relevant(merged, query);
        let mut products: Vec<Product> = relevant
            .into_iter()
            .filter(|p| p.store.serves(location))
            .collect();
        products.sort_by(|a, b| a.price.total_cmp(&b.price));

        tracing::info!(
            query,
            location = location.unwrap_or("all"),
            count = products.len(),
            live = matches!(source, ResultSource::Live),
            "search complete"
        );

        SearchOutcome { products, source }
    }

    /// Scrapes every store concurrently and waits for all of them.
    async fn collect(&self, stores: &[&StoreDescriptor], query: &str) -> Vec<Product> {
        let scrapes = stores
            .iter()
            .map(|store| self.dispatcher.scrape(store, query));
        let per_store = join_all(scrapes).await;
        per_store.into_iter().flatten().collect()
    }

    fn mock_products(&self, query: &str) -> Vec<Product> {
        let mut rng = match self.mock_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        if self.stores.is_empty() {
            generate_mock_products(query, &default_mock_stores(), &mut rng)
        } else {
            generate_mock_products(query, &self.stores, &mut rng)
        }
    }

    /// Scrapes a single store by id with no filtering and no fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnknownStore`] if no store has that id, or the
    /// error that stopped the scrape.
    pub async fn probe(&self, store_id: &str, query: &str) -> Result<Vec<Product>, ScraperError> {
        let store = self
            .stores
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(store_id))
            .ok_or_else(|| ScraperError::UnknownStore(store_id.to_owned()))?;
        self.dispatcher.try_scrape(store, query.trim()).await
    }

    /// Closes the browser session, if one was started.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}
