//! `autocontinue run`: open the chat and keep it generating.

use std::path::Path;

use {
    anyhow::{Context, Result},
    autocontinue_config::AutocontinueConfig,
    autocontinue_monitor::StopReason,
    clap::Args,
    tokio_util::sync::CancellationToken,
    tracing::info,
};

/// Per-run overrides for the config file.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Chat page to open.
    #[arg(long)]
    pub url: Option<String>,
    /// Delay between checks in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Run the browser without a window (needs an already logged-in profile).
    #[arg(long)]
    pub headless: bool,
    /// Attach to a running browser (`http://127.0.0.1:9222` or a `ws://` URL).
    #[arg(long)]
    pub connect: Option<String>,
    /// Stop after this many continues.
    #[arg(long)]
    pub max_continues: Option<u32>,
}

impl RunArgs {
    /// Combine with flags given before the subcommand; `self` wins.
    #[must_use]
    pub fn merged_over(&self, outer: &RunArgs) -> RunArgs {
        RunArgs {
            url: self.url.clone().or_else(|| outer.url.clone()),
            interval_ms: self.interval_ms.or(outer.interval_ms),
            headless: self.headless || outer.headless,
            connect: self.connect.clone().or_else(|| outer.connect.clone()),
            max_continues: self.max_continues.or(outer.max_continues),
        }
    }

    /// Layer the flags over a loaded config.
    pub fn apply(&self, config: &mut AutocontinueConfig) {
        if let Some(ref url) = self.url {
            config.target.url = url.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.monitor.poll_interval_ms = ms;
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(ref url) = self.connect {
            config.browser.connect_url = Some(url.clone());
        }
        if let Some(max) = self.max_continues {
            config.monitor.max_continues = max;
        }
    }
}

/// Load config with env and flag overrides applied, in that order.
pub fn resolve_config(config_path: Option<&Path>, args: &RunArgs) -> Result<AutocontinueConfig> {
    let (mut config, found) = autocontinue_config::load_from(config_path)?;
    match found {
        Some(ref path) => info!(path = %path.display(), "using config file"),
        None => info!("no config file found, using defaults"),
    }
    autocontinue_config::apply_env_overrides(&mut config);
    args.apply(&mut config);
    Ok(config)
}

pub async fn handle_run(
    config_path: Option<&Path>,
    args: &RunArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let config = resolve_config(config_path, args)?;

    eprintln!("Opening {} ...", config.target.url);
    eprintln!("Log in through the browser window if asked. Press Ctrl-C to stop.\n");

    let stats = autocontinue_monitor::run_session(&config, cancel)
        .await
        .context("monitoring session failed")?;

    let reason = match stats.stop_reason {
        StopReason::Cancelled => "stopped",
        StopReason::LimitReached => "continue limit reached",
        StopReason::ConnectionLost => "browser closed",
    };
    eprintln!(
        "\n{reason}: {} continue(s) sent over {} check(s), {} failed submission(s), {} failed check(s)",
        stats.submissions, stats.ticks, stats.submit_failures, stats.probe_failures
    );
    Ok(())
}
