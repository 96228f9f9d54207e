pub mod alert;
pub mod browser;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod mock;
pub mod normalize;
pub mod relevance;
pub mod routing;
pub mod search;

pub use alert::{evaluate_alert, AlertDecision, PriceAlert};
pub use browser::{BrowserSession, BrowserSettings};
pub use client::StoreClient;
pub use dispatch::StoreDispatcher;
pub use error::ScraperError;
pub use extract::extract_products;
pub use mock::{default_mock_stores, generate_mock_products};
pub use normalize::{normalize_price, normalize_rating};
pub use relevance::filter_relevant;
pub use routing::{search_url, NavigationPlan};
pub use search::{MockReason, ResultSource, SearchEngine, SearchOutcome};
