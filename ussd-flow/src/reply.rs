use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::Session;

/// Text sent back when a request fails for reasons the subscriber cannot fix.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Screen shown to the subscriber after one round-trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub message: String,
    /// `true` closes the USSD dialog; the session is discarded.
    pub end_session: bool,
}

impl Reply {
    /// A prompt that keeps the dialog open for another input.
    pub fn prompt(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            end_session: false,
        }
    }

    /// A final screen that closes the dialog.
    pub fn end(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            end_session: true,
        }
    }

    pub fn generic_error() -> Self {
        Self::end(GENERIC_ERROR_MESSAGE)
    }
}

/// Gateway wire form: `CON <message>` to continue, `END <message>` to close.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.end_session { "END" } else { "CON" };
        write!(f, "{} {}", prefix, self.message)
    }
}

/// Result of feeding one input to the state machine
#[derive(Debug, Clone)]
pub struct Transition {
    pub reply: Reply,
    /// The session as it should be persisted, unless `reply` ends the dialog.
    pub session: Session,
}
