use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure classes seen by callers of the control client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No connection could be established within the retry budget
    Unavailable,
    /// Malformed record, or the engine answered `status=error`
    Protocol,
    /// Connection dropped or timed out mid-exchange
    Io,
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("engine unavailable at {} after {attempts} attempts: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Record too large ({size} bytes, max {max} bytes)")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Engine rejected `{command}`: {message}")]
    Rejected { command: String, message: String },

    #[error("Connection closed before a response was received")]
    ConnectionClosed,
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Unavailable { .. } => ErrorKind::Unavailable,
            ControlError::Io(_) | ControlError::ConnectionClosed => ErrorKind::Io,
            ControlError::Decode(_)
            | ControlError::Protocol(_)
            | ControlError::RecordTooLarge { .. }
            | ControlError::Rejected { .. } => ErrorKind::Protocol,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
