//! Per-store scrape: route by extraction method, follow the navigation plan,
//! extract, and contain every failure.

use pricescout_core::{ExtractionMethod, Product, StoreDescriptor};

use crate::browser::BrowserSession;
use crate::client::StoreClient;
use crate::error::ScraperError;
use crate::extract::extract_products;
use crate::routing::NavigationPlan;

/// What a fetched page is expected to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageKind {
    /// Search results or a category page.
    Listing,
    /// A single product's detail page.
    Product,
}

impl PageKind {
    /// Selector a rendered page must match before its content is read.
    ///
    /// A store's `ready_selector` names a listing tile, which a detail page
    /// need not contain; product pages wait the settle delay instead.
    fn ready_selector(self, store: &StoreDescriptor) -> Option<&str> {
        match self {
            Self::Listing => store.ready_selector.as_deref(),
            Self::Product => None,
        }
    }
}

/// Fetches store pages over plain HTTP or through the shared browser,
/// depending on each store's extraction method.
#[derive(Debug)]
pub struct StoreDispatcher {
    client: StoreClient,
    browser: BrowserSession,
}

impl StoreDispatcher {
    #[must_use]
    pub fn new(client: StoreClient, browser: BrowserSession) -> Self {
        Self { client, browser }
    }

    /// Scrapes one store for `query`.
    ///
    /// Never fails: any error is logged with the store id and yields an
    /// empty list, so one broken store cannot sink a search.
    pub async fn scrape(&self, store: &StoreDescriptor, query: &str) -> Vec<Product> {
        match self.try_scrape(store, query).await {
            Ok(products) => {
                tracing::info!(
                    store = %store.id,
                    method = %store.method,
                    count = products.len(),
                    "store scrape complete"
                );
                products
            }
            Err(ScraperError::BrowserUnavailable { reason }) => {
                tracing::warn!(store = %store.id, %reason, "skipping rendered store");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(store = %store.id, error = %e, "store scrape failed");
                Vec::new()
            }
        }
    }

    /// Scrapes one store and surfaces the failure instead of swallowing it.
    ///
    /// # Errors
    ///
    /// Returns the fetch, render or selector error that stopped the scrape.
    pub async fn try_scrape(
        &self,
        store: &StoreDescriptor,
        query: &str,
    ) -> Result<Vec<Product>, ScraperError> {
        let plan = NavigationPlan::for_query(store, query);
        tracing::debug!(store = %store.id, url = %plan.primary, "fetching store page");

        let primary = self
            .fetch_page(store, &plan.primary, PageKind::Listing)
            .await;
        let (page_url, html) = match primary {
            Ok(html) => (plan.primary, html),
            Err(ScraperError::NotFound { url }) => {
                let Some(fallback) = plan.on_not_found else {
                    return Err(ScraperError::NotFound { url });
                };
                tracing::info!(
                    store = %store.id,
                    from = %url,
                    to = %fallback,
                    "search page not found; retrying category page"
                );
                let html = self.fetch_page(store, &fallback, PageKind::Listing).await?;
                (fallback, html)
            }
            Err(e) => return Err(e),
        };

        extract_products(&html, store, &page_url)
    }

    /// Loads one page the way `store` needs it loaded.
    pub(crate) async fn fetch_page(
        &self,
        store: &StoreDescriptor,
        url: &str,
        kind: PageKind,
    ) -> Result<String, ScraperError> {
        match store.method {
            ExtractionMethod::Rendered => {
                self.browser.render(url, kind.ready_selector(store)).await
            }
            ExtractionMethod::Markup | ExtractionMethod::StructuredData => {
                self.client.fetch_html(url).await
            }
        }
    }

    pub(crate) fn client(&self) -> &StoreClient {
        &self.client
    }

    pub async fn shutdown(&self) {
        self.browser.shutdown().await;
    }
}
