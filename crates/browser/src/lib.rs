//! Chrome/Chromium over CDP for the auto-continue monitor.
//!
//! Launches a browser (headed by default, optionally with a persistent
//! profile so logins survive restarts) or attaches to one that is already
//! running, then exposes the small set of page operations the monitor needs
//! through [`PageDriver`].
//!
//! # Example
//!
//! ```ignore
//! use autocontinue_browser::{BrowserConfig, BrowserSession, Locator, PageDriver};
//!
//! let session = BrowserSession::open(&BrowserConfig::default()).await?;
//! session.navigate("https://claude.ai/chat").await?;
//!
//! let stop = Locator::parse(r#"button:has-text("Stop generating")"#)?;
//! if !session.query(&stop).await? {
//!     let input = Locator::parse(r#"textarea[placeholder="Message Claude..."]"#)?;
//!     session.type_text(&input, "Continue").await?;
//!     session.press_key("Enter").await?;
//! }
//! session.close().await?;
//! ```

pub mod detect;
pub mod driver;
pub mod error;
pub mod locator;
pub mod session;
pub mod types;

pub use {
    detect::{DetectionResult, DetectionSource, detect_browser, install_instructions},
    driver::PageDriver,
    error::BrowserError,
    locator::Locator,
    session::BrowserSession,
    types::{BrowserConfig, LaunchMode, ViewportSize, validate_url},
};
