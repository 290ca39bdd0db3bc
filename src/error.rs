//! Typed failures surfaced by engine clients, the oracle and the orchestrator

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure category for a deep-search operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty query or unknown engine
    InvalidInput,
    /// Engine call exceeded its budget
    Timeout,
    /// Transport or backend failure
    Unavailable,
    /// Missing or rejected credential
    AuthFailed,
    /// External abort or session budget exhausted
    Cancelled,
    /// Sufficiency judgment could not be obtained
    OracleFailure,
}

impl ErrorKind {
    /// Whether the round executor retries a call that failed this way
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::AuthFailed => write!(f, "authentication failed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::OracleFailure => write!(f, "oracle failure"),
        }
    }
}

/// Error returned by engine clients and recorded on failed sessions
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct SearchError {
    pub kind: ErrorKind,
    pub message: String,
    /// Engine that produced the failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl SearchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            engine: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthFailed, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OracleFailure, message)
    }

    /// Attach the engine that produced this error
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}
