//! Browser error types.

use {chromiumoxide::error::CdpError, thiserror::Error};

/// Errors that can occur during browser operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("JavaScript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("browser closed")]
    BrowserClosed,

    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),
}

impl BrowserError {
    /// Whether the DevTools connection is gone and retrying on it is pointless.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::BrowserClosed | Self::ConnectionClosed(_) => true,
            _ => false,
        }
    }
}

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        match err {
            // Websocket and socket errors only come from the transport; the
            // channel error means the handler task is gone.
            CdpError::Ws(_) | CdpError::Io(_) | CdpError::ChannelSendError(_) => {
                BrowserError::ConnectionClosed(err.to_string())
            },
            other => BrowserError::Cdp(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::{Error as IoError, ErrorKind};

    use {super::*, chromiumoxide::error::ChannelError, futures::channel::oneshot::Canceled};

    #[test]
    fn transport_errors_mean_the_connection_is_gone() {
        let reset = BrowserError::from(CdpError::Io(IoError::from(ErrorKind::ConnectionReset)));
        assert!(matches!(reset, BrowserError::ConnectionClosed(_)));
        assert!(reset.is_connection_lost());

        let handler_gone = BrowserError::from(CdpError::ChannelSendError(ChannelError::Canceled(
            Canceled,
        )));
        assert!(matches!(handler_gone, BrowserError::ConnectionClosed(_)));
        assert!(handler_gone.is_connection_lost());
    }

    #[test]
    fn protocol_errors_keep_the_connection() {
        let bad_reply = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = BrowserError::from(CdpError::Serde(bad_reply));
        assert!(matches!(err, BrowserError::Cdp(_)));
        assert!(!err.is_connection_lost());
        assert!(!BrowserError::Timeout("input".into()).is_connection_lost());
        assert!(BrowserError::BrowserClosed.is_connection_lost());
    }
}
