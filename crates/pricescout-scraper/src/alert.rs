//! Price observation and target checks for previously saved products.
//!
//! Alert storage, scheduling and notification delivery live outside this
//! crate; callers hand in [`PriceAlert`] values and act on the returned
//! [`AlertDecision`].

use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::Serialize;

use pricescout_core::{host_of, StoreDescriptor};

use crate::dispatch::PageKind;
use crate::error::ScraperError;
use crate::extract::{first_price_match, structured_price};
use crate::search::SearchEngine;

/// Alerts re-checked at once by [`SearchEngine::recheck_alerts`].
pub const RECHECK_CONCURRENCY: usize = 5;

/// schema.org microdata price, common on product detail pages.
const MICRODATA_PRICE: &str = "[itemprop=\"price\"]";

#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub product_url: String,
    pub target_price: f64,
    /// Whether a notification already went out for this alert.
    pub notification_sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AlertDecision {
    /// Price is at or below target and nobody has been told yet.
    Trigger { observed: f64 },
    /// Price is still above target.
    Hold { observed: f64 },
    /// Target reached, but the notification was sent on an earlier check.
    AlreadyTriggered { observed: f64 },
    /// No price could be read from the product page.
    Unobserved,
}

impl AlertDecision {
    #[must_use]
    pub fn observed(&self) -> Option<f64> {
        match self {
            Self::Trigger { observed }
            | Self::Hold { observed }
            | Self::AlreadyTriggered { observed } => Some(*observed),
            Self::Unobserved => None,
        }
    }
}

#[must_use]
pub fn evaluate_alert(alert: &PriceAlert, observed: Option<f64>) -> AlertDecision {
    match observed {
        Some(price) if price > 0.0 && price <= alert.target_price => {
            if alert.notification_sent {
                AlertDecision::AlreadyTriggered { observed: price }
            } else {
                AlertDecision::Trigger { observed: price }
            }
        }
        Some(price) if price > 0.0 => AlertDecision::Hold { observed: price },
        _ => AlertDecision::Unobserved,
    }
}

/// Finds the registered store serving `url`, ignoring a leading `www.`.
fn owning_store<'a>(stores: &'a [StoreDescriptor], url: &str) -> Option<&'a StoreDescriptor> {
    let host = bare_host(host_of(url)?);
    stores
        .iter()
        .find(|s| host_of(&s.base_url).is_some_and(|h| bare_host(h).eq_ignore_ascii_case(host)))
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn selector_price(document: &Html, store: &StoreDescriptor) -> Option<f64> {
    let selectors = &store.selectors;
    [
        selectors.product_price.as_deref(),
        Some(MICRODATA_PRICE),
        selectors.price.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(|selector| first_price_match(document, selector))
}

impl SearchEngine {
    /// Reads the current price from a product page.
    ///
    /// The page is loaded the way its owning store is scraped (rendered or
    /// plain), without waiting for the store's listing ready selector.
    /// Pages from unregistered hosts are fetched plainly and only their
    /// JSON-LD is consulted.
    ///
    /// For a registered store the price is read from JSON-LD, then the
    /// store's `product_price` selector, then microdata, then its listing
    /// `price` selector.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] for a non-http(s) URL, or the
    /// fetch/render error that stopped the load.
    pub async fn try_observe_price(&self, product_url: &str) -> Result<Option<f64>, ScraperError> {
        if host_of(product_url).is_none() {
            return Err(ScraperError::InvalidUrl {
                url: product_url.to_owned(),
            });
        }

        let store = owning_store(self.stores(), product_url);
        let html = match store {
            Some(store) => {
                self.dispatcher()
                    .fetch_page(store, product_url, PageKind::Product)
                    .await?
            }
            None => {
                tracing::debug!(
                    url = product_url,
                    "no registered store for host; using JSON-LD only"
                );
                self.dispatcher().client().fetch_html(product_url).await?
            }
        };

        let document = Html::parse_document(&html);
        let from_selectors = || store.and_then(|s| selector_price(&document, s));
        Ok(structured_price(&document).or_else(from_selectors))
    }

    /// Like [`Self::try_observe_price`], with failures logged and reported
    /// as no observation.
    pub async fn observe_price(&self, product_url: &str) -> Option<f64> {
        match self.try_observe_price(product_url).await {
            Ok(price) => {
                tracing::info!(url = product_url, price, "observed product price");
                price
            }
            Err(e) => {
                tracing::warn!(url = product_url, error = %e, "price observation failed");
                None
            }
        }
    }

    /// Observes every alert's product page, a few at a time, and decides
    /// each one. Output order follows completion, not input.
    pub async fn recheck_alerts<'a>(
        &self,
        alerts: &'a [PriceAlert],
    ) -> Vec<(&'a PriceAlert, AlertDecision)> {
        stream::iter(alerts)
            .map(|alert| async move {
                let observed = self.observe_price(&alert.product_url).await;
                (alert, evaluate_alert(alert, observed))
            })
            .buffer_unordered(RECHECK_CONCURRENCY)
            .collect()
            .await
    }
}
