//! Monitor settings resolved from config.

use std::time::Duration;

use {
    autocontinue_browser::Locator,
    autocontinue_config::{BackoffKind, MonitorConfig, ProbeErrorPolicy},
};

use crate::error::Error;

/// Delay between ticks after consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    Fixed,
    Exponential { max: Duration },
}

impl BackoffPolicy {
    /// Delay before the next tick given the current error streak.
    ///
    /// Never shorter than `interval`.
    #[must_use]
    pub fn delay(&self, interval: Duration, streak: u32) -> Duration {
        match self {
            Self::Fixed => interval,
            Self::Exponential { max } => interval
                .saturating_mul(2u32.saturating_pow(streak))
                .min(*max)
                .max(interval),
        }
    }
}

/// Everything the monitor loop needs, validated.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub input_timeout: Duration,
    pub continue_text: String,
    pub submit_key: String,
    pub stop_locator: Locator,
    pub input_locator: Locator,
    pub on_probe_error: ProbeErrorPolicy,
    /// `None` runs until cancelled.
    pub max_continues: Option<u32>,
    pub backoff: BackoffPolicy,
}

impl TryFrom<&MonitorConfig> for MonitorSettings {
    type Error = Error;

    fn try_from(cfg: &MonitorConfig) -> Result<Self, Self::Error> {
        if cfg.poll_interval_ms == 0 {
            return Err(Error::invalid_settings("poll_interval_ms must be greater than 0"));
        }
        if cfg.continue_text.trim().is_empty() {
            return Err(Error::invalid_settings("continue_text must not be empty"));
        }
        if cfg.submit_key.trim().is_empty() {
            return Err(Error::invalid_settings("submit_key must not be empty"));
        }

        let stop_locator = Locator::parse(&cfg.stop_selector)
            .map_err(|e| Error::invalid_settings(format!("stop_selector: {e}")))?;
        let input_locator = Locator::parse(&cfg.input_selector)
            .map_err(|e| Error::invalid_settings(format!("input_selector: {e}")))?;

        let backoff = match cfg.backoff.kind {
            BackoffKind::Fixed => BackoffPolicy::Fixed,
            BackoffKind::Exponential => BackoffPolicy::Exponential {
                max: Duration::from_millis(cfg.backoff.max_ms),
            },
        };

        Ok(Self {
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
            input_timeout: Duration::from_millis(cfg.input_timeout_ms),
            continue_text: cfg.continue_text.clone(),
            submit_key: cfg.submit_key.trim().to_string(),
            stop_locator,
            input_locator,
            on_probe_error: cfg.on_probe_error,
            max_continues: (cfg.max_continues > 0).then_some(cfg.max_continues),
            backoff,
        })
    }
}
