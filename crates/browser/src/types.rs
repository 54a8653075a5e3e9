//! Runtime browser settings and URL checks.

use std::{path::PathBuf, time::Duration};

use tracing::warn;

use crate::error::BrowserError;

/// Emulated viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

/// How the session gets a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Start a local Chromium process owned by the session.
    Launch,
    /// Attach to an already running browser at this DevTools URL.
    Attach(String),
}

/// Browser settings resolved from the config file.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub mode: LaunchMode,
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    /// `None` keeps the real window size.
    pub viewport: Option<ViewportSize>,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from(&autocontinue_config::BrowserConfig::default())
    }
}

impl From<&autocontinue_config::BrowserConfig> for BrowserConfig {
    fn from(cfg: &autocontinue_config::BrowserConfig) -> Self {
        let mode = match cfg.connect_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => LaunchMode::Attach(url.to_string()),
            _ => LaunchMode::Launch,
        };
        let viewport = (cfg.viewport_width > 0 && cfg.viewport_height > 0).then_some(ViewportSize {
            width: cfg.viewport_width,
            height: cfg.viewport_height,
        });

        Self {
            mode,
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            user_data_dir: cfg
                .user_data_dir
                .as_deref()
                .map(autocontinue_config::expand_home),
            viewport,
            request_timeout: Duration::from_millis(cfg.request_timeout_ms),
            user_agent: cfg.user_agent.clone(),
            chrome_args: cfg.chrome_args.clone(),
        }
    }
}

/// Validate a navigation target: must parse and use http(s).
pub fn validate_url(url: &str) -> Result<(), BrowserError> {
    if url.is_empty() {
        return Err(BrowserError::InvalidAction("URL cannot be empty".to_string()));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        BrowserError::InvalidAction(format!("invalid URL '{}': {}", truncate_url(url), e))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => {
            warn!(url = %truncate_url(url), scheme, "rejecting navigation target");
            Err(BrowserError::InvalidAction(format!(
                "unsupported URL scheme '{scheme}', only http/https allowed"
            )))
        },
    }
}

/// Truncate a URL for error messages and logs.
pub(crate) fn truncate_url(url: &str) -> String {
    match url.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_launch_headed_with_real_window() {
        let cfg = BrowserConfig::default();
        assert_eq!(cfg.mode, LaunchMode::Launch);
        assert!(!cfg.headless);
        assert!(cfg.viewport.is_none());
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn connect_url_switches_to_attach() {
        let raw = autocontinue_config::BrowserConfig {
            connect_url: Some(" http://127.0.0.1:9222 ".into()),
            viewport_width: 1280,
            viewport_height: 800,
            ..Default::default()
        };
        let cfg = BrowserConfig::from(&raw);
        assert_eq!(cfg.mode, LaunchMode::Attach("http://127.0.0.1:9222".into()));
        assert_eq!(
            cfg.viewport,
            Some(ViewportSize {
                width: 1280,
                height: 800
            })
        );
    }

    #[test]
    fn blank_connect_url_still_launches() {
        let raw = autocontinue_config::BrowserConfig {
            connect_url: Some("   ".into()),
            viewport_width: 1280,
            ..Default::default()
        };
        let cfg = BrowserConfig::from(&raw);
        assert_eq!(cfg.mode, LaunchMode::Launch);
        assert!(cfg.viewport.is_none());
    }

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://claude.ai/chat").is_ok());
        assert!(validate_url("http://localhost:8080/path").is_ok());
    }

    #[test]
    fn validate_url_rejects_other_schemes_and_garbage() {
        assert!(validate_url("").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn truncate_url_respects_char_boundaries() {
        let long = "é".repeat(150);
        let truncated = truncate_url(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 103);
        assert_eq!(truncate_url("short"), "short");
    }
}
