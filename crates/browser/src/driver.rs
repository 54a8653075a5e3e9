//! Page-level operations the monitor needs.

use std::time::Duration;

use {async_trait::async_trait, tracing::debug};

use crate::{error::BrowserError, locator::Locator};

const FIRST_POLL: Duration = Duration::from_millis(100);
const MAX_POLL: Duration = Duration::from_secs(1);

/// A page that can be probed and typed into.
///
/// [`BrowserSession`](crate::BrowserSession) implements this over CDP; tests
/// implement it with scripted fakes.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Whether an element matching `locator` is currently in the DOM.
    async fn query(&self, locator: &Locator) -> Result<bool, BrowserError>;

    /// Focus the first match of `locator` and type `text` into it.
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    /// Press a single named key (`"Enter"`, `"Tab"`, ...) on the focused element.
    async fn press_key(&self, key: &str) -> Result<(), BrowserError>;

    /// Poll until `locator` matches or `timeout` elapses.
    ///
    /// Polls start at 100ms and double up to 1s. A zero timeout checks once.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut poll = FIRST_POLL;

        loop {
            if self.query(locator).await? {
                return Ok(());
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                debug!(%locator, timeout_ms = timeout.as_millis() as u64, "element wait timed out");
                return Err(BrowserError::Timeout(format!(
                    "'{locator}' not found after {}ms",
                    timeout.as_millis()
                )));
            }

            tokio::time::sleep(poll.min(deadline - now)).await;
            poll = (poll * 2).min(MAX_POLL);
        }
    }
}
