use {autocontinue_browser::BrowserError, thiserror::Error};

/// The stop-indicator lookup itself failed (as opposed to finding nothing).
#[derive(Debug, Error)]
#[error("probe for '{selector}' failed: {source}")]
pub struct ProbeError {
    pub selector: String,
    #[source]
    pub source: BrowserError,
}

/// Which step of a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    WaitForInput,
    Type,
    Confirm,
}

impl std::fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::WaitForInput => "waiting for input",
            Self::Type => "typing",
            Self::Confirm => "confirming",
        })
    }
}

/// Sending the continue message failed.
#[derive(Debug, Error)]
#[error("submit failed while {stage}: {source}")]
pub struct SubmitError {
    pub stage: SubmitStage,
    #[source]
    pub source: BrowserError,
}

impl ProbeError {
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        self.source.is_connection_lost()
    }
}

impl SubmitError {
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        self.source.is_connection_lost()
    }
}

/// Errors that stop a monitoring session before or outside the loop.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid monitor settings: {message}")]
    InvalidSettings { message: String },

    #[error("failed to open browser: {0}")]
    Open(#[source] BrowserError),

    #[error("failed to load {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: BrowserError,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
