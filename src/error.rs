// Error taxonomy for the search -> confirm -> book -> ticket pipeline

use crate::models::SupplierFamily;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Local precondition failure. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure or timeout, with the elapsed budget in milliseconds
    /// so callers can render "timed out after {elapsed_ms}ms".
    #[error("Transport error after {elapsed_ms}ms: {message}")]
    Transport { message: String, elapsed_ms: u64 },

    /// The remote call completed but reported a structured failure.
    #[error("Supplier error ({status}): {message}")]
    Supplier { status: u16, message: String },

    /// Ticket issuance failed. The reservation stays valid and retryable.
    #[error("Ticketing failed on {family} path: {message}")]
    Ticketing {
        family: SupplierFamily,
        message: String,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>, elapsed_ms: u64) -> Self {
        Error::Transport {
            message: message.into(),
            elapsed_ms,
        }
    }

    pub fn supplier(status: u16, message: impl Into<String>) -> Self {
        Error::Supplier {
            status,
            message: message.into(),
        }
    }

    /// True for failures where a plain "try again" is a sensible affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Ticketing { .. })
    }
}

/// Non-fatal outcome of a fare confirmation: the mandatory quote succeeded
/// but the descriptive fare-rules call did not. Carried alongside a usable
/// `FareConfirmation`, never in place of one.
#[derive(Debug, Clone, PartialEq)]
pub struct RulesWarning {
    pub trace_id: String,
    pub offer_id: String,
    pub message: String,
}

impl RulesWarning {
    pub fn new(trace_id: &str, offer_id: &str, message: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.to_string(),
            offer_id: offer_id.to_string(),
            message: message.into(),
        }
    }
}
