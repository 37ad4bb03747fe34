use crate::util::human_duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::time::Duration;

/// Terminal failure tags reported for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureState {
    Timeout,
    Refused,
    TcpOpenNotTls,
    NoTls,
    Unknown,
    /// The target entry itself was unusable; it was never probed.
    InvalidTarget,
}

impl FailureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureState::Timeout => "timeout",
            FailureState::Refused => "refused",
            FailureState::TcpOpenNotTls => "tcp_open_not_tls",
            FailureState::NoTls => "no_tls",
            FailureState::Unknown => "unknown",
            FailureState::InvalidTarget => "invalid_target",
        }
    }
}

impl fmt::Display for FailureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What went wrong during a single handshake attempt.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("connect timed out after {}", human_duration(.0))]
    ConnectTimeout(Duration),
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("handshake timed out after {}", human_duration(.0))]
    HandshakeTimeout(Duration),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("handshake completed without a peer certificate")]
    NoCertificate,
    #[error("could not configure TLS client: {0}")]
    Setup(String),
    /// The local TLS library cannot speak any version in the attempt's range.
    #[error("not supported by the local TLS library: {0}")]
    Unsupported(String),
}

impl AttemptError {
    /// True when the failure happened locally and says nothing about the peer.
    pub fn is_local(&self) -> bool {
        matches!(self, AttemptError::Unsupported(_))
    }
}

const VERSION_MISMATCH_MARKERS: &[&str] = &["wrong version", "unknown protocol"];

/// Applies the classification precedence to one attempt's error.
pub fn classify_error(err: &AttemptError) -> FailureState {
    match err {
        AttemptError::ConnectTimeout(_) | AttemptError::HandshakeTimeout(_) => FailureState::Timeout,
        AttemptError::Connect(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut => FailureState::Timeout,
            _ => FailureState::Refused,
        },
        AttemptError::Handshake(message) => {
            let lowered = message.to_ascii_lowercase();
            if VERSION_MISMATCH_MARKERS
                .iter()
                .any(|marker| lowered.contains(marker))
            {
                FailureState::TcpOpenNotTls
            } else {
                FailureState::NoTls
            }
        }
        AttemptError::NoCertificate => FailureState::NoTls,
        AttemptError::Setup(_) | AttemptError::Unsupported(_) => FailureState::Unknown,
    }
}
