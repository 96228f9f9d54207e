//! Shared headless Chromium session for stores that render listings client-side.
//!
//! The browser is launched on first use and reused by every rendered scrape
//! until [`BrowserSession::shutdown`]. A failed launch, or a session built
//! with rendering disabled, leaves the session unavailable for its lifetime:
//! callers get [`ScraperError::BrowserUnavailable`] instead of a relaunch
//! attempt per store.

mod render;

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::ScraperError;

/// Window size reported to pages; a common desktop resolution.
const WINDOW_SIZE: (u32, u32) = (1366, 768);

/// How the browser is launched and how long a render may take.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub enabled: bool,
    /// Chrome or Chromium binary. `None` lets chromiumoxide search the usual
    /// install locations.
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: String,
    pub accept_language: String,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
    /// Fixed wait after navigation for stores without a ready selector.
    pub settle_delay: Duration,
}

enum SessionState {
    NotStarted,
    Running {
        browser: Browser,
        handler: JoinHandle<()>,
    },
    Unavailable(String),
    Closed,
}

pub struct BrowserSession {
    settings: BrowserSettings,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BrowserSession {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        let state = if settings.enabled {
            SessionState::NotStarted
        } else {
            SessionState::Unavailable("rendering disabled by configuration".to_string())
        };
        Self {
            settings,
            state: Mutex::new(state),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Opens a blank tab, launching the browser first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::BrowserUnavailable`] when rendering is disabled,
    /// the launch failed now or earlier, or the session was shut down.
    /// Returns [`ScraperError::Browser`] if the running browser refuses a tab.
    pub(crate) async fn new_page(&self) -> Result<Page, ScraperError> {
        let mut state = self.state.lock().await;

        if matches!(*state, SessionState::NotStarted) {
            *state = match self.launch().await {
                Ok((browser, handler)) => {
                    tracing::info!("headless browser launched");
                    SessionState::Running { browser, handler }
                }
                Err(reason) => {
                    tracing::warn!(
                        %reason,
                        "headless browser unavailable; rendered stores will return no products"
                    );
                    SessionState::Unavailable(reason)
                }
            };
        }

        match &*state {
            SessionState::Running { browser, .. } => browser
                .new_page("about:blank")
                .await
                .map_err(ScraperError::browser("opening tab")),
            SessionState::Unavailable(reason) => Err(ScraperError::BrowserUnavailable {
                reason: reason.clone(),
            }),
            SessionState::Closed => Err(ScraperError::BrowserUnavailable {
                reason: "browser session has been shut down".to_string(),
            }),
            SessionState::NotStarted => Err(ScraperError::BrowserUnavailable {
                reason: "browser not started".to_string(),
            }),
        }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), String> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1);
        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| format!("invalid browser config: {e}"))?;

        let (browser, mut handler) =
            tokio::time::timeout(self.settings.navigation_timeout, Browser::launch(config))
                .await
                .map_err(|_| "browser launch timed out".to_string())?
                .map_err(|e| format!("browser launch failed: {e}"))?;

        // The handler drives the CDP connection and must be polled for the
        // browser to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
            tracing::debug!("CDP handler task completed");
        });

        Ok((browser, handler))
    }

    /// Closes the browser if it was started. Idempotent.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, SessionState::Closed);
        if let SessionState::Running {
            mut browser,
            handler,
        } = previous
        {
            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "browser close error (ignored)");
            }
            handler.abort();
            tracing::info!("headless browser closed");
        }
    }
}
