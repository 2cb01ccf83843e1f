//! Error types for transaction assembly and dispatch

use std::fmt;
use thiserror::Error;

/// Pipeline phase in which a send failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolution,
    Estimation,
    Signing,
    Submission,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resolution => "resolution",
            Phase::Estimation => "estimation",
            Phase::Signing => "signing",
            Phase::Submission => "submission",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the RPC transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Timeout waiting for {method}")]
    Timeout { method: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed response to {method}: {message}")]
    Decode { method: String, message: String },
}

impl TransportError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::Connection(_)
        )
    }
}

/// Failure reported by the keyring
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyringError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("No local key for account {0}")]
    UnknownAccount(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Failure decoding a raw transaction or its signature
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("RLP error: {0}")]
    Rlp(#[from] ethers::utils::rlp::DecoderError),

    #[error("Expected {expected} items in {what}, found {found}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("Field {field} out of range")]
    OutOfRange { field: &'static str },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// Main error type for `send_transaction` and friends
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable during {phase} ({method}): {source}")]
    UpstreamUnavailable {
        phase: Phase,
        method: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] KeyringError),

    #[error("Submission via {method} failed: {source}")]
    SubmissionFailed {
        method: &'static str,
        #[source]
        source: TransportError,
    },
}

impl SendError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SendError::InvalidInput(message.into())
    }

    pub(crate) fn upstream(phase: Phase, method: &'static str, source: TransportError) -> Self {
        SendError::UpstreamUnavailable {
            phase,
            method,
            source,
        }
    }

    /// Phase the call failed in. Input validation precedes every phase.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SendError::InvalidInput(_) => None,
            SendError::UpstreamUnavailable { phase, .. } => Some(*phase),
            SendError::SigningFailed(_) => Some(Phase::Signing),
            SendError::SubmissionFailed { .. } => Some(Phase::Submission),
        }
    }

    /// Check if the whole call may be retried as-is.
    ///
    /// Submission failures are never retryable here: a broadcast that timed
    /// out may still have reached the node.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendError::UpstreamUnavailable { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SendError::InvalidInput(_) => "invalid_input",
            SendError::UpstreamUnavailable { phase, .. } => phase.as_str(),
            SendError::SigningFailed(_) => "signing",
            SendError::SubmissionFailed { .. } => "submission",
        }
    }
}

/// Result type for send operations
pub type SendResult<T> = Result<T, SendError>;
