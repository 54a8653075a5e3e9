use std::fmt;

/// Where the loop is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    /// Watching for the stop indicator to disappear.
    #[default]
    AwaitingCompletion,
    /// Typing and confirming the continue message.
    Submitting,
}

/// Result of one stop-indicator lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Generating,
    Idle,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still generating, nothing sent.
    Generating,
    /// Continue message sent.
    Submitted,
    /// Generation had stopped but sending failed.
    SubmitFailed,
    /// Probe failed and the policy says to wait for the next tick.
    ProbeSkipped,
}

impl TickOutcome {
    /// Whether the tick hit an error and should extend the backoff streak.
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::SubmitFailed | Self::ProbeSkipped)
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generating => "generating",
            Self::Submitted => "submitted",
            Self::SubmitFailed => "submit_failed",
            Self::ProbeSkipped => "probe_skipped",
        })
    }
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    Cancelled,
    LimitReached,
    ConnectionLost,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cancelled => "cancelled",
            Self::LimitReached => "limit reached",
            Self::ConnectionLost => "connection lost",
        })
    }
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorStats {
    pub ticks: u64,
    pub submissions: u64,
    pub submit_failures: u64,
    pub probe_failures: u64,
    /// Error streak at the time the loop stopped.
    pub consecutive_errors: u32,
    pub stop_reason: StopReason,
}

impl MonitorStats {
    /// Count a finished tick. A failed probe extends the error streak even
    /// when the policy went on to submit.
    pub(crate) fn record(&mut self, outcome: TickOutcome, probe_failed: bool) {
        self.ticks += 1;
        if probe_failed {
            self.probe_failures += 1;
        }
        match outcome {
            TickOutcome::Submitted => self.submissions += 1,
            TickOutcome::SubmitFailed => self.submit_failures += 1,
            TickOutcome::Generating | TickOutcome::ProbeSkipped => {},
        }
        if probe_failed || outcome.is_error() {
            self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        } else {
            self.consecutive_errors = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_resets_on_clean_tick() {
        let mut stats = MonitorStats::default();
        stats.record(TickOutcome::SubmitFailed, false);
        stats.record(TickOutcome::ProbeSkipped, true);
        assert_eq!(stats.consecutive_errors, 2);
        stats.record(TickOutcome::Generating, false);
        assert_eq!(stats.consecutive_errors, 0);
        stats.record(TickOutcome::Submitted, false);
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.submissions, 1);
        assert_eq!(stats.submit_failures, 1);
        assert_eq!(stats.probe_failures, 1);
    }

    #[test]
    fn probe_failure_counts_as_error_even_when_submitted() {
        let mut stats = MonitorStats::default();
        stats.record(TickOutcome::Submitted, true);
        assert_eq!(stats.consecutive_errors, 1);
        assert_eq!(stats.submissions, 1);
    }

    #[test]
    fn initial_state_awaits_completion() {
        assert_eq!(MonitorState::default(), MonitorState::AwaitingCompletion);
    }
}
