//! Config schema types (target page, monitor loop, browser launch).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Chat page opened at startup.
pub const DEFAULT_TARGET_URL: &str = "https://claude.ai/chat";
/// Element present only while the assistant is streaming a response.
pub const DEFAULT_STOP_SELECTOR: &str = r#"button:has-text("Stop generating")"#;
/// Message box the continue command is typed into.
pub const DEFAULT_INPUT_SELECTOR: &str = r#"textarea[placeholder="Message Claude..."]"#;
pub const DEFAULT_CONTINUE_TEXT: &str = "Continue";
pub const DEFAULT_SUBMIT_KEY: &str = "Enter";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocontinueConfig {
    pub target: TargetConfig,
    pub monitor: MonitorConfig,
    pub browser: BrowserConfig,
}

/// The chat application being watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Page opened once the browser is up.
    pub url: String,
    /// How long to wait for the input box after navigation, which covers a
    /// manual login on first use. 0 starts polling immediately.
    pub login_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.into(),
            login_timeout_secs: 300,
        }
    }
}

/// What the monitor does when the generation probe itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorPolicy {
    /// A failed lookup counts as "not generating" and may trigger a submission.
    #[default]
    TreatAsIdle,
    /// A failed lookup skips the tick without submitting.
    SkipTick,
}

impl std::fmt::Display for ProbeErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TreatAsIdle => write!(f, "treat_as_idle"),
            Self::SkipTick => write!(f, "skip_tick"),
        }
    }
}

/// How the tick delay grows while ticks keep failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Always wait `poll_interval_ms`.
    #[default]
    Fixed,
    /// Double the delay per consecutive failing tick, up to `max_ms`.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub kind: BackoffKind,
    /// Upper bound for the exponential delay.
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            kind: BackoffKind::default(),
            max_ms: 30_000,
        }
    }
}

/// Generation monitor loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between ticks under normal operation.
    pub poll_interval_ms: u64,
    /// How long a submission waits for the input box.
    pub input_timeout_ms: u64,
    /// Text typed into the input box when generation has stopped.
    pub continue_text: String,
    /// Key pressed after typing to submit the message.
    pub submit_key: String,
    /// Selector for the "still generating" indicator. Supports
    /// `tag:has-text("...")` in addition to plain CSS.
    pub stop_selector: String,
    /// Selector for the message input box.
    pub input_selector: String,
    pub on_probe_error: ProbeErrorPolicy,
    /// Stop after this many successful submissions (0 = unlimited).
    pub max_continues: u32,
    pub backoff: BackoffConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            input_timeout_ms: 30_000,
            continue_text: DEFAULT_CONTINUE_TEXT.into(),
            submit_key: DEFAULT_SUBMIT_KEY.into(),
            stop_selector: DEFAULT_STOP_SELECTOR.into(),
            input_selector: DEFAULT_INPUT_SELECTOR.into(),
            on_probe_error: ProbeErrorPolicy::default(),
            max_continues: 0,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Browser launch / attach settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Headless mode. Off by default since login happens by hand.
    pub headless: bool,
    /// Persistent profile directory so a login survives restarts.
    pub user_data_dir: Option<PathBuf>,
    /// Attach to an already running browser (`ws://...` or
    /// `http://host:port`) instead of launching one.
    pub connect_url: Option<String>,
    /// Emulated viewport. 0 keeps the real window size.
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Timeout for a single CDP request.
    pub request_timeout_ms: u64,
    /// User agent string (uses default if not set).
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            user_data_dir: None,
            connect_url: None,
            viewport_width: 0,
            viewport_height: 0,
            request_timeout_ms: 30_000,
            user_agent: None,
            chrome_args: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_script() {
        let cfg = AutocontinueConfig::default();
        assert_eq!(cfg.target.url, "https://claude.ai/chat");
        assert_eq!(cfg.monitor.poll_interval_ms, 2000);
        assert_eq!(cfg.monitor.continue_text, "Continue");
        assert_eq!(cfg.monitor.submit_key, "Enter");
        assert_eq!(cfg.monitor.on_probe_error, ProbeErrorPolicy::TreatAsIdle);
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AutocontinueConfig = toml::from_str(
            r#"
            [monitor]
            poll_interval_ms = 500
            on_probe_error = "skip_tick"

            [monitor.backoff]
            kind = "fixed"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.monitor.poll_interval_ms, 500);
        assert_eq!(cfg.monitor.on_probe_error, ProbeErrorPolicy::SkipTick);
        assert_eq!(cfg.monitor.backoff.kind, BackoffKind::Fixed);
        assert_eq!(cfg.monitor.backoff.max_ms, 30_000);
        assert_eq!(cfg.monitor.stop_selector, DEFAULT_STOP_SELECTOR);
        assert_eq!(cfg.target, TargetConfig::default());
    }

    #[test]
    fn unknown_probe_policy_is_rejected() {
        let err = toml::from_str::<AutocontinueConfig>(
            r#"
            [monitor]
            on_probe_error = "panic"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut cfg = AutocontinueConfig::default();
        cfg.browser.user_data_dir = Some(PathBuf::from("/tmp/profile"));
        cfg.monitor.max_continues = 3;
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: AutocontinueConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
