//! Per-channel delivery senders.
//!
//! Each sender owns the full send path for its channel and surfaces
//! failures as [`SenderError`] values; nothing here panics or leaks an
//! error past the channel boundary. The dispatcher converts these into
//! per-channel `{ attempted, sent, error }` results.

pub mod email;
pub mod whatsapp;

pub use email::EmailSender;
pub use whatsapp::WhatsAppSender;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("canal não configurado: {0}")]
    NotConfigured(String),

    #[error("falha na requisição: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provedor retornou {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    #[error("falha de armazenamento: {0}")]
    Store(#[from] crate::store::StoreError),
}

/// Result of one channel attempt, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelOutcome {
    pub attempted: bool,
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn sent() -> Self {
        Self {
            attempted: true,
            sent: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            attempted: true,
            sent: false,
            error: Some(error.into()),
        }
    }

    pub fn skipped(error: impl Into<String>) -> Self {
        Self {
            attempted: false,
            sent: false,
            error: Some(error.into()),
        }
    }

    /// Channel was not in the rule's requested set.
    pub fn not_requested() -> Self {
        Self {
            attempted: false,
            sent: false,
            error: None,
        }
    }
}
