//! Full session: open the browser, load the chat, wait for login, monitor, close.

use std::{sync::Arc, time::Duration};

use {
    autocontinue_browser::{BrowserError, BrowserSession, Locator, PageDriver},
    autocontinue_config::AutocontinueConfig,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    monitor::Monitor,
    settings::MonitorSettings,
    state::MonitorStats,
};

/// How the login wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginWait {
    Ready,
    TimedOut,
    Skipped,
    Cancelled,
}

/// Run one monitoring session end to end.
///
/// The browser is closed on every path once it has been opened.
pub async fn run_session(
    config: &AutocontinueConfig,
    cancel: CancellationToken,
) -> Result<MonitorStats> {
    let settings = MonitorSettings::try_from(&config.monitor)?;
    let browser_config = autocontinue_browser::BrowserConfig::from(&config.browser);

    let Some(session) = open_unless_cancelled(BrowserSession::open(&browser_config), &cancel).await?
    else {
        info!("cancelled while opening the browser");
        return Ok(MonitorStats::default());
    };
    let session = Arc::new(session);

    let result = drive(&session, config, settings, &cancel).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser session");
    }
    result
}

/// Await a browser open unless `cancel` fires first. A launch abandoned this
/// way is dropped with its future.
async fn open_unless_cancelled<T>(
    open: impl Future<Output = std::result::Result<T, BrowserError>>,
    cancel: &CancellationToken,
) -> Result<Option<T>> {
    match cancel.run_until_cancelled(open).await {
        Some(opened) => opened.map(Some).map_err(Error::Open),
        None => Ok(None),
    }
}

async fn drive(
    session: &Arc<BrowserSession>,
    config: &AutocontinueConfig,
    settings: MonitorSettings,
    cancel: &CancellationToken,
) -> Result<MonitorStats> {
    let url = &config.target.url;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(MonitorStats::default()),
        loaded = session.navigate(url) => {
            loaded.map_err(|source| Error::Navigate { url: url.clone(), source })?;
        },
    }

    let driver: Arc<dyn PageDriver> = Arc::clone(session) as Arc<dyn PageDriver>;
    let login_timeout = Duration::from_secs(config.target.login_timeout_secs);
    Ok(monitor_page(driver, settings, login_timeout, cancel).await)
}

/// Wait for login, then run the loop on an already loaded page.
pub async fn monitor_page(
    driver: Arc<dyn PageDriver>,
    settings: MonitorSettings,
    login_timeout: Duration,
    cancel: &CancellationToken,
) -> MonitorStats {
    let wait = wait_for_login(driver.as_ref(), &settings.input_locator, login_timeout, cancel).await;
    if wait == LoginWait::Cancelled {
        return MonitorStats::default();
    }

    Monitor::new(driver, settings).run(cancel).await
}

/// Give the user time to log in: wait for the input box to appear.
///
/// Timing out is not fatal; the loop starts anyway and submissions fail
/// until the input shows up.
pub async fn wait_for_login(
    driver: &dyn PageDriver,
    input: &Locator,
    timeout: Duration,
    cancel: &CancellationToken,
) -> LoginWait {
    if timeout.is_zero() {
        return LoginWait::Skipped;
    }

    match driver.query(input).await {
        Ok(true) => {
            debug!(%input, "input already present");
            return LoginWait::Ready;
        },
        Ok(false) => {},
        Err(e) => debug!(error = %e, "input probe failed before login wait"),
    }

    info!(
        timeout_secs = timeout.as_secs(),
        "waiting for the chat input; log in through the browser window if needed"
    );

    tokio::select! {
        biased;
        _ = cancel.cancelled() => LoginWait::Cancelled,
        result = driver.wait_for(input, timeout) => match result {
            Ok(()) => {
                info!("chat input ready");
                LoginWait::Ready
            },
            Err(BrowserError::Timeout(_)) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "chat input did not appear, starting monitor anyway"
                );
                LoginWait::TimedOut
            },
            Err(e) => {
                warn!(error = %e, "login wait failed, starting monitor anyway");
                LoginWait::TimedOut
            },
        },
    }
}
