//! The generation monitor loop.

use std::sync::Arc;

use {
    autocontinue_browser::PageDriver,
    autocontinue_config::ProbeErrorPolicy,
    tokio::{
        sync::watch,
        task::{JoinError, JoinHandle},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    error::{ProbeError, SubmitError, SubmitStage},
    settings::MonitorSettings,
    state::{GenerationStatus, MonitorState, MonitorStats, StopReason, TickOutcome},
};

/// Watches one page and sends the continue message whenever generation stops.
pub struct Monitor {
    driver: Arc<dyn PageDriver>,
    settings: MonitorSettings,
    state: watch::Sender<MonitorState>,
    stats: MonitorStats,
    connection_lost: bool,
}

impl Monitor {
    pub fn new(driver: Arc<dyn PageDriver>, settings: MonitorSettings) -> Self {
        Self {
            driver,
            settings,
            state: watch::Sender::new(MonitorState::default()),
            stats: MonitorStats::default(),
            connection_lost: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Follow state changes from another task while the loop runs.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: MonitorState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    #[must_use]
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Look for the stop indicator once, without waiting.
    pub async fn is_generating(&self) -> Result<GenerationStatus, ProbeError> {
        let locator = &self.settings.stop_locator;
        match self.driver.query(locator).await {
            Ok(true) => Ok(GenerationStatus::Generating),
            Ok(false) => Ok(GenerationStatus::Idle),
            Err(source) => Err(ProbeError {
                selector: locator.to_string(),
                source,
            }),
        }
    }

    /// Wait for the input box, type the continue text and confirm.
    pub async fn send_continue(&self) -> Result<(), SubmitError> {
        let input = &self.settings.input_locator;
        let fail = |stage| move |source| SubmitError { stage, source };

        self.driver
            .wait_for(input, self.settings.input_timeout)
            .await
            .map_err(fail(SubmitStage::WaitForInput))?;
        self.driver
            .type_text(input, &self.settings.continue_text)
            .await
            .map_err(fail(SubmitStage::Type))?;
        self.driver
            .press_key(&self.settings.submit_key)
            .await
            .map_err(fail(SubmitStage::Confirm))?;
        Ok(())
    }

    /// One probe and, if generation has stopped, one submission.
    pub async fn tick(&mut self) -> TickOutcome {
        let tick = self.stats.ticks + 1;
        self.set_state(MonitorState::AwaitingCompletion);

        let (status, probe_failed) = match self.is_generating().await {
            Ok(status) => (Some(status), false),
            Err(e) => {
                self.connection_lost |= e.is_connection_lost();
                let policy = self.settings.on_probe_error;
                warn!(tick, error = %e, %policy, "generation probe failed");
                match policy {
                    ProbeErrorPolicy::TreatAsIdle => (Some(GenerationStatus::Idle), true),
                    ProbeErrorPolicy::SkipTick => (None, true),
                }
            },
        };

        let outcome = match status {
            None => TickOutcome::ProbeSkipped,
            Some(GenerationStatus::Generating) => {
                debug!(tick, "still generating");
                TickOutcome::Generating
            },
            Some(GenerationStatus::Idle) => {
                self.set_state(MonitorState::Submitting);
                let result = self.send_continue().await;
                self.set_state(MonitorState::AwaitingCompletion);
                match result {
                    Ok(()) => {
                        info!(tick, text = %self.settings.continue_text, "sent continue");
                        TickOutcome::Submitted
                    },
                    Err(e) => {
                        self.connection_lost |= e.is_connection_lost();
                        warn!(tick, error = %e, "failed to send continue");
                        TickOutcome::SubmitFailed
                    },
                }
            },
        };

        self.stats.record(outcome, probe_failed);
        outcome
    }

    /// Tick until cancelled, the submission limit is hit, or the browser goes away.
    pub async fn run(&mut self, cancel: &CancellationToken) -> MonitorStats {
        let interval = self.settings.poll_interval;
        info!(
            interval_ms = interval.as_millis() as u64,
            stop = %self.settings.stop_locator,
            input = %self.settings.input_locator,
            max_continues = ?self.settings.max_continues,
            "monitor started"
        );

        let reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("tick abandoned on cancellation");
                    break StopReason::Cancelled;
                },
                _ = self.tick() => {},
            }

            if self.connection_lost {
                warn!("browser connection lost, stopping monitor");
                break StopReason::ConnectionLost;
            }
            if let Some(max) = self.settings.max_continues
                && self.stats.submissions >= u64::from(max)
            {
                info!(max, "continue limit reached");
                break StopReason::LimitReached;
            }

            let streak = self.stats.consecutive_errors;
            let delay = self.settings.backoff.delay(interval, streak);
            if delay > interval {
                debug!(streak, delay_ms = delay.as_millis() as u64, "backing off");
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = tokio::time::sleep(delay) => {},
            }
        };

        self.set_state(MonitorState::AwaitingCompletion);
        self.stats.stop_reason = reason;
        info!(
            %reason,
            ticks = self.stats.ticks,
            submissions = self.stats.submissions,
            submit_failures = self.stats.submit_failures,
            probe_failures = self.stats.probe_failures,
            "monitor stopped"
        );
        self.stats
    }
}

/// A monitor running on its own task.
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<MonitorStats>,
}

/// Run `monitor` on a new task. Cancelling `cancel` (or calling
/// [`MonitorHandle::shutdown`]) stops it.
pub fn spawn(mut monitor: Monitor, cancel: CancellationToken) -> MonitorHandle {
    let token = cancel.clone();
    let task = tokio::spawn(async move { monitor.run(&token).await });
    MonitorHandle { cancel, task }
}

impl MonitorHandle {
    /// Whether the loop has already returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to stop on its own.
    pub async fn join(self) -> Result<MonitorStats, JoinError> {
        self.task.await
    }

    /// Cancel the loop and wait for its report.
    pub async fn shutdown(self) -> Result<MonitorStats, JoinError> {
        self.cancel.cancel();
        self.task.await
    }
}
