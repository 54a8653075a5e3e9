//! Generation monitor loop.
//!
//! Every tick probes the page for the "still generating" indicator. When it is
//! gone, the monitor types the continue text into the chat input and confirms
//! it. Ticks are spaced by the poll interval, stretched by backoff after
//! consecutive failures, and the loop stops on cancellation, an optional
//! submission limit, or a lost browser connection.

pub mod error;
pub mod monitor;
pub mod runner;
pub mod settings;
pub mod state;

#[cfg(test)]
mod testing;

pub use {
    error::{Error, ProbeError, Result, SubmitError, SubmitStage},
    monitor::{Monitor, MonitorHandle, spawn},
    runner::{LoginWait, monitor_page, run_session, wait_for_login},
    settings::{BackoffPolicy, MonitorSettings},
    state::{GenerationStatus, MonitorState, MonitorStats, StopReason, TickOutcome},
};
