use chromiumoxide::error::CdpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {timeout_secs}s fetching {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid {field} selector \"{selector}\" for store {store}")]
    InvalidSelector {
        store: String,
        field: &'static str,
        selector: String,
    },

    #[error("not an absolute http(s) URL: {url}")]
    InvalidUrl { url: String },

    #[error("no registered store matches {0}")]
    UnknownStore(String),

    #[error("headless browser unavailable: {reason}")]
    BrowserUnavailable { reason: String },

    #[error("browser error during {context}: {source}")]
    Browser {
        context: &'static str,
        #[source]
        source: Box<CdpError>,
    },

    #[error("timed out waiting for {what} on {url}")]
    RenderTimeout { what: &'static str, url: String },
}

impl ScraperError {
    pub(crate) fn browser(context: &'static str) -> impl FnOnce(CdpError) -> Self {
        move |source| ScraperError::Browser {
            context,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn browser_error_keeps_context_and_source() {
        let err = ScraperError::browser("navigation")(CdpError::NoResponse);
        let message = err.to_string();
        assert!(message.starts_with("browser error during navigation"));
        assert!(err.source().is_some());
    }

    #[test]
    fn browser_variant_does_not_bloat_the_error() {
        assert!(std::mem::size_of::<ScraperError>() < 128);
    }
}
