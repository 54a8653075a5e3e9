//! A single CDP browser session with one page.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType},
        error::CdpError,
        handler::{Handler, HandlerConfig, viewport::Viewport},
    },
    futures::StreamExt,
    tokio::{sync::Mutex, task::JoinHandle},
    tracing::{debug, info, warn},
};

use crate::{
    detect,
    driver::PageDriver,
    error::BrowserError,
    locator::Locator,
    types::{BrowserConfig, LaunchMode, ViewportSize, truncate_url, validate_url},
};

/// One browser plus the page the monitor drives.
///
/// A launched browser is owned by the session and shut down by [`close`](Self::close).
/// An attached browser is left running; only the session's page is closed.
pub struct BrowserSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    attached: bool,
    link: ConnectionState,
}

/// Whether the session was closed locally or lost its DevTools connection.
#[derive(Debug, Default)]
struct ConnectionState {
    closed: AtomicBool,
    disconnected: Arc<AtomicBool>,
}

impl ConnectionState {
    /// Marks the session closed. Returns `false` if it already was.
    fn begin_close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), BrowserError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::BrowserClosed);
        }
        if self.is_disconnected() {
            return Err(BrowserError::ConnectionClosed(
                "DevTools connection dropped".into(),
            ));
        }
        Ok(())
    }

    /// Classify a failed command, flagging the connection as gone when the
    /// error says so.
    fn classify(&self, err: CdpError) -> BrowserError {
        let err = BrowserError::from(err);
        if err.is_connection_lost() {
            self.mark_disconnected();
            err
        } else if self.is_disconnected() {
            BrowserError::ConnectionClosed(err.to_string())
        } else {
            err
        }
    }
}

impl BrowserSession {
    /// Launch or attach to a browser and open a blank page.
    pub async fn open(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let (browser, handler, attached) = match &config.mode {
            LaunchMode::Launch => {
                let (browser, handler) = launch(config).await?;
                (browser, handler, false)
            },
            LaunchMode::Attach(url) => {
                let (browser, handler) = attach(url, config).await?;
                (browser, handler, true)
            },
        };

        let link = ConnectionState::default();
        let handler = spawn_handler(handler, Arc::clone(&link.disconnected));

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::LaunchFailed(format!("failed to open page: {e}")));
            },
        };

        if attached
            && let Some(ua) = config.user_agent.as_deref()
            && let Err(e) = page.set_user_agent(ua).await
        {
            warn!(error = %e, "failed to set user agent on attached page");
        }

        info!(attached, headless = config.headless, "browser session ready");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            attached,
            link,
        })
    }

    /// Navigate the page and wait for the load to settle. Returns the final URL.
    pub async fn navigate(&self, url: &str) -> Result<String, BrowserError> {
        validate_url(url)?;
        self.ensure_connected().await?;

        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {e}", truncate_url(url))))?;
        // Single-page apps often never fire a second load event.
        let _ = self.page.wait_for_navigation().await;

        let current = self.current_url().await?.unwrap_or_else(|| url.to_string());
        info!(url = %truncate_url(&current), "navigated");
        Ok(current)
    }

    /// URL of the page, if it has one.
    pub async fn current_url(&self) -> Result<Option<String>, BrowserError> {
        self.ensure_connected().await?;
        self.page.url().await.map_err(|e| self.link.classify(e))
    }

    /// Whether the DevTools connection has dropped.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.link.is_disconnected()
    }

    /// Release the browser. Safe to call more than once.
    pub async fn close(&self) -> Result<(), BrowserError> {
        if !self.link.begin_close() {
            return Ok(());
        }

        let result = if self.is_disconnected() {
            debug!("connection already gone, nothing to close");
            Ok(())
        } else if self.attached {
            self.page.clone().close().await.map_err(BrowserError::from)
        } else {
            let mut browser = self.browser.lock().await;
            match browser.close().await {
                Ok(_) => {
                    if let Err(e) = browser.wait().await {
                        warn!(error = %e, "browser process did not exit cleanly");
                    }
                    Ok(())
                },
                Err(e) => Err(BrowserError::from(e)),
            }
        };

        self.handler.abort();
        info!(attached = self.attached, "browser session closed");
        result
    }

    /// Fails fast once the connection is gone. A launched browser whose
    /// process has exited (window closed by the user) counts as gone, since
    /// the websocket does not always report the close.
    async fn ensure_connected(&self) -> Result<(), BrowserError> {
        self.link.check()?;
        if !self.attached
            && let Ok(Some(status)) = self.browser.lock().await.try_wait()
        {
            warn!(%status, "browser process exited");
            self.link.mark_disconnected();
        }
        self.link.check()
    }

    async fn eval_bool(&self, script: &str) -> Result<bool, BrowserError> {
        self.ensure_connected().await?;
        self.page
            .evaluate(script)
            .await
            .map_err(|e| self.link.classify(e))?
            .into_value::<bool>()
            .map_err(|e| BrowserError::JsEvalFailed(format!("expected a boolean: {e}")))
    }

    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: &KeyDefinition,
        with_text: bool,
    ) -> Result<(), BrowserError> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key.key.clone());
        if let Some(code) = key.code {
            builder = builder
                .code(code)
                .windows_virtual_key_code(key.key_code)
                .native_virtual_key_code(key.key_code);
        }
        if with_text && let Some(text) = &key.text {
            builder = builder.text(text.clone());
        }
        let params = builder.build().map_err(BrowserError::Cdp)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| self.link.classify(e))?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn query(&self, locator: &Locator) -> Result<bool, BrowserError> {
        self.eval_bool(&locator.presence_script()).await
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        if !self.eval_bool(&locator.focus_script()).await? {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }

        for c in text.chars() {
            let key = KeyDefinition::char(c);
            self.dispatch_key(DispatchKeyEventType::KeyDown, &key, true)
                .await?;
            self.dispatch_key(DispatchKeyEventType::KeyUp, &key, false)
                .await?;
        }

        debug!(%locator, chars = text.chars().count(), "typed text");
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), BrowserError> {
        let def = KeyDefinition::named(key)?;
        self.dispatch_key(DispatchKeyEventType::KeyDown, &def, true)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, &def, false)
            .await?;
        debug!(key, "pressed key");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn launch(config: &BrowserConfig) -> Result<(Browser, Handler), BrowserError> {
    let detection = detect::detect_browser(config.chrome_path.as_deref());
    let Some((path, source)) = detection.found else {
        return Err(BrowserError::LaunchFailed(format!(
            "Chrome/Chromium not found.\n\n{}",
            detection.install_hint
        )));
    };
    info!(path = %path.display(), %source, headless = config.headless, "launching browser");

    let mut builder = CdpBrowserConfig::builder()
        .chrome_executable(path)
        .viewport(config.viewport.map(to_cdp_viewport))
        .request_timeout(config.request_timeout);

    // chromiumoxide defaults to headless.
    if !config.headless {
        builder = builder.with_head();
    }

    if let Some(dir) = &config.user_data_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            return Err(BrowserError::LaunchFailed(format!(
                "cannot create profile directory {}: {e}",
                dir.display()
            )));
        }
        debug!(profile = %dir.display(), "using persistent profile");
        builder = builder.user_data_dir(dir);
    }

    if let Some(ua) = &config.user_agent {
        builder = builder.arg(format!("--user-agent={ua}"));
    }
    if let Some(vp) = config.viewport {
        builder = builder.window_size(vp.width, vp.height);
    }
    for arg in &config.chrome_args {
        builder = builder.arg(arg);
    }

    let cdp_config = builder.build().map_err(|e| {
        BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
    })?;

    Browser::launch(cdp_config).await.map_err(|e| {
        BrowserError::LaunchFailed(format!(
            "browser launch failed: {e}\n\n{}",
            detect::install_instructions()
        ))
    })
}

async fn attach(url: &str, config: &BrowserConfig) -> Result<(Browser, Handler), BrowserError> {
    info!(url = %truncate_url(url), "attaching to running browser");

    let handler_config = HandlerConfig {
        request_timeout: config.request_timeout,
        viewport: config.viewport.map(to_cdp_viewport),
        ..Default::default()
    };

    Browser::connect_with_config(url, handler_config)
        .await
        .map_err(|e| {
            BrowserError::LaunchFailed(format!(
                "failed to connect to browser at {}: {e}",
                truncate_url(url)
            ))
        })
}

fn spawn_handler(mut handler: Handler, disconnected: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The handler does not always end its stream when the socket goes
        // away, so a transport error is treated as the end too.
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let err = BrowserError::from(e);
                if err.is_connection_lost() {
                    warn!(error = %err, "browser connection error");
                    break;
                }
                debug!(error = %err, "browser event error");
            }
        }
        disconnected.store(true, Ordering::SeqCst);
        warn!("browser connection closed");
    })
}

fn to_cdp_viewport(size: ViewportSize) -> Viewport {
    Viewport {
        width: size.width,
        height: size.height,
        device_scale_factor: None,
        emulating_mobile: false,
        is_landscape: size.width >= size.height,
        has_touch: false,
    }
}

/// Fields of a CDP key event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyDefinition {
    key: String,
    code: Option<&'static str>,
    key_code: i64,
    text: Option<String>,
}

impl KeyDefinition {
    fn char(c: char) -> Self {
        Self {
            key: c.to_string(),
            code: None,
            key_code: 0,
            text: Some(c.to_string()),
        }
    }

    fn named(name: &str) -> Result<Self, BrowserError> {
        let (code, key_code, text) = match name {
            "Enter" => ("Enter", 13, Some("\r")),
            "Tab" => ("Tab", 9, Some("\t")),
            "Escape" => ("Escape", 27, None),
            "Backspace" => ("Backspace", 8, None),
            "Space" => ("Space", 32, Some(" ")),
            other => {
                let mut chars = other.chars();
                return match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Self::char(c)),
                    _ => Err(BrowserError::InvalidAction(format!("unsupported key '{other}'"))),
                };
            },
        };
        Ok(Self {
            key: if name == "Space" { " " } else { name }.to_string(),
            code: Some(code),
            key_code,
            text: text.map(str::to_string),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Enter", "Enter", 13, Some("\r"))]
    #[case("Tab", "Tab", 9, Some("\t"))]
    #[case("Escape", "Escape", 27, None)]
    #[case("Space", " ", 32, Some(" "))]
    fn named_keys(
        #[case] name: &str,
        #[case] key: &str,
        #[case] key_code: i64,
        #[case] text: Option<&str>,
    ) {
        let def = KeyDefinition::named(name).unwrap();
        assert_eq!(def.key, key);
        assert_eq!(def.key_code, key_code);
        assert_eq!(def.text.as_deref(), text);
    }

    #[test]
    fn single_characters_are_typed_literally() {
        assert_eq!(KeyDefinition::named("a").unwrap(), KeyDefinition::char('a'));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            KeyDefinition::named("Hyper"),
            Err(BrowserError::InvalidAction(_))
        ));
        assert!(KeyDefinition::named("").is_err());
    }

    #[test]
    fn close_is_only_started_once() {
        let link = ConnectionState::default();
        assert!(link.check().is_ok());
        assert!(link.begin_close());
        assert!(!link.begin_close());
        assert!(matches!(link.check(), Err(BrowserError::BrowserClosed)));
    }

    #[test]
    fn dropped_connection_fails_every_command() {
        let link = ConnectionState::default();
        link.mark_disconnected();
        let err = link.check().unwrap_err();
        assert!(matches!(err, BrowserError::ConnectionClosed(_)));
        assert!(err.is_connection_lost());

        // Even an unrelated failure is reported as a lost connection now.
        let bad_reply = serde_json::from_str::<u8>("{").unwrap_err();
        assert!(link.classify(CdpError::Serde(bad_reply)).is_connection_lost());
    }

    #[test]
    fn transport_error_flags_the_connection() {
        let link = ConnectionState::default();
        let err = link.classify(CdpError::Io(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        )));
        assert!(err.is_connection_lost());
        assert!(link.is_disconnected());
        assert!(link.check().is_err());
    }

    #[test]
    fn protocol_error_leaves_the_connection_alone() {
        let link = ConnectionState::default();
        let bad_reply = serde_json::from_str::<u8>("{").unwrap_err();
        let err = link.classify(CdpError::Serde(bad_reply));
        assert!(matches!(err, BrowserError::Cdp(_)));
        assert!(!link.is_disconnected());
    }

    #[test]
    fn viewport_orientation() {
        let vp = to_cdp_viewport(ViewportSize {
            width: 1280,
            height: 800,
        });
        assert!(vp.is_landscape);
        assert!(vp.device_scale_factor.is_none());
    }
}
