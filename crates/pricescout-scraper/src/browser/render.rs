use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::Page;

use super::BrowserSession;
use crate::error::ScraperError;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

impl BrowserSession {
    /// Loads `url` in a fresh tab and returns the rendered document.
    ///
    /// When `ready_selector` is set, waits until it matches; otherwise waits
    /// the configured settle delay. The tab is closed on every path.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::BrowserUnavailable`]: no browser to render with.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`]: the
    ///   main document answered 404 or another error status.
    /// - [`ScraperError::RenderTimeout`]: navigation or the ready selector
    ///   took longer than allowed.
    /// - [`ScraperError::Browser`]: any other CDP failure.
    pub async fn render(
        &self,
        url: &str,
        ready_selector: Option<&str>,
    ) -> Result<String, ScraperError> {
        let page = self.new_page().await?;
        let result = self.render_in(&page, url, ready_selector).await;
        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "closing tab failed (ignored)");
        }
        result
    }

    async fn render_in(
        &self,
        page: &Page,
        url: &str,
        ready_selector: Option<&str>,
    ) -> Result<String, ScraperError> {
        let settings = self.settings();

        page.enable_stealth_mode_with_agent(&settings.user_agent)
            .await
            .map_err(ScraperError::browser("enabling stealth mode"))?;
        let headers = Headers::new(serde_json::json!({
            "Accept-Language": settings.accept_language,
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(ScraperError::browser("setting request headers"))?;

        let navigation = tokio::time::timeout(settings.navigation_timeout, navigate(page, url));
        let status = navigation
            .await
            .map_err(|_| ScraperError::RenderTimeout {
                what: "navigation",
                url: url.to_owned(),
            })??;
        check_status(status, url)?;

        match ready_selector {
            Some(selector) => {
                tokio::time::timeout(settings.ready_timeout, wait_for_selector(page, selector))
                    .await
                    .map_err(|_| ScraperError::RenderTimeout {
                        what: "ready selector",
                        url: url.to_owned(),
                    })?;
            }
            None => tokio::time::sleep(settings.settle_delay).await,
        }

        page.content()
            .await
            .map_err(ScraperError::browser("reading page content"))
    }
}

/// Navigates and returns the main document's HTTP status, when the browser
/// reported one.
async fn navigate(page: &Page, url: &str) -> Result<Option<i64>, ScraperError> {
    page.goto(url)
        .await
        .map_err(ScraperError::browser("navigation"))?;
    let response = page
        .wait_for_navigation_response()
        .await
        .map_err(ScraperError::browser("navigation"))?;
    Ok(response.and_then(|request| request.response.as_ref().map(|r| r.status)))
}

fn check_status(status: Option<i64>, url: &str) -> Result<(), ScraperError> {
    match status {
        Some(404) => Err(ScraperError::NotFound {
            url: url.to_owned(),
        }),
        Some(code) if code >= 400 => Err(ScraperError::UnexpectedStatus {
            status: u16::try_from(code).unwrap_or(u16::MAX),
            url: url.to_owned(),
        }),
        _ => Ok(()),
    }
}

async fn wait_for_selector(page: &Page, selector: &str) {
    while page.find_element(selector).await.is_err() {
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://spa.test/p/1";

    #[test]
    fn missing_or_ok_status_passes() {
        assert!(check_status(None, URL).is_ok());
        assert!(check_status(Some(200), URL).is_ok());
        assert!(check_status(Some(304), URL).is_ok());
    }

    #[test]
    fn not_found_and_error_statuses_fail() {
        let err = check_status(Some(404), URL).unwrap_err();
        assert!(matches!(err, ScraperError::NotFound { .. }));
        let err = check_status(Some(503), URL).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedStatus { status: 503, .. }
        ));
    }
}
