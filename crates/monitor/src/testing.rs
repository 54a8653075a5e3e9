//! Scripted page used by the loop tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    async_trait::async_trait,
    autocontinue_browser::{BrowserError, Locator, PageDriver},
    autocontinue_config::MonitorConfig,
    tokio::{sync::watch, time::Instant},
};

use crate::{settings::MonitorSettings, state::MonitorState};

/// Answers stop-indicator probes from a script; once the script runs out
/// every probe returns `then_generating`.
pub(crate) struct FakePage {
    stop: Locator,
    probes: Mutex<VecDeque<Result<bool, BrowserError>>>,
    then_generating: bool,
    input_present: AtomicBool,
    pub probe_times: Mutex<Vec<Instant>>,
    pub typed: Mutex<Vec<String>>,
    pub keys: Mutex<Vec<String>>,
    state: Mutex<Option<watch::Receiver<MonitorState>>>,
    states_while_typing: Mutex<Vec<MonitorState>>,
}

#[allow(clippy::unwrap_used)]
impl FakePage {
    pub fn new(settings: &MonitorSettings) -> Self {
        Self {
            stop: settings.stop_locator.clone(),
            probes: Mutex::new(VecDeque::new()),
            then_generating: true,
            input_present: AtomicBool::new(true),
            probe_times: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
            state: Mutex::new(None),
            states_while_typing: Mutex::new(Vec::new()),
        }
    }

    pub fn probes(self, script: impl IntoIterator<Item = Result<bool, BrowserError>>) -> Self {
        self.probes.lock().unwrap().extend(script);
        self
    }

    pub fn then_generating(mut self, generating: bool) -> Self {
        self.then_generating = generating;
        self
    }

    pub fn without_input(self) -> Self {
        self.input_present.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_input_present(&self, present: bool) {
        self.input_present.store(present, Ordering::SeqCst);
    }

    /// Record the monitor's state each time text is typed.
    pub fn observe_state(&self, state: watch::Receiver<MonitorState>) {
        *self.state.lock().unwrap() = Some(state);
    }

    pub fn states_while_typing(&self) -> Vec<MonitorState> {
        self.states_while_typing.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    /// Gaps between consecutive stop-indicator probes, in ms.
    pub fn probe_gaps_ms(&self) -> Vec<u64> {
        self.probe_times
            .lock()
            .unwrap()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis() as u64)
            .collect()
    }
}

#[allow(clippy::unwrap_used)]
#[async_trait]
impl PageDriver for FakePage {
    async fn query(&self, locator: &Locator) -> Result<bool, BrowserError> {
        if *locator != self.stop {
            return Ok(self.input_present.load(Ordering::SeqCst));
        }
        self.probe_times.lock().unwrap().push(Instant::now());
        self.probes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.then_generating))
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        if !self.input_present.load(Ordering::SeqCst) {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        if let Some(state) = self.state.lock().unwrap().as_ref() {
            self.states_while_typing.lock().unwrap().push(*state.borrow());
        }
        self.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), BrowserError> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Default settings with a short input timeout so failing submissions stay cheap.
#[allow(clippy::unwrap_used)]
pub(crate) fn settings(edit: impl FnOnce(&mut MonitorConfig)) -> MonitorSettings {
    let mut cfg = MonitorConfig {
        input_timeout_ms: 500,
        ..Default::default()
    };
    edit(&mut cfg);
    MonitorSettings::try_from(&cfg).unwrap()
}
