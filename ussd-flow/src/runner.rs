//! UssdRunner – loads a session, feeds it one gateway request, and persists or
//! discards the result.
//!
//! A transport handler only needs to deserialize a [`UssdRequest`], call
//! [`UssdRunner::handle`] and render the [`Reply`]. The runner is the error
//! boundary: whatever fails below it is logged and turned into the generic
//! apology, and the session is dropped so the next dial starts clean.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    error::Result,
    machine::{MenuStateMachine, latest_input},
    reply::{Reply, Transition},
    storage::SessionStorage,
};

/// One gateway callback, as posted by the USSD aggregator. Missing fields
/// decode as empty strings so that a malformed post still gets a USSD reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UssdRequest {
    pub session_id: String,
    pub phone_number: String,
    /// Every answer so far in this dialog, joined with `*`.
    pub text: String,
    pub service_code: String,
}

/// Shared handle around the state machine and the session store.
#[derive(Clone)]
pub struct UssdRunner {
    machine: Arc<MenuStateMachine>,
    storage: Arc<dyn SessionStorage>,
}

impl UssdRunner {
    pub fn new(machine: Arc<MenuStateMachine>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { machine, storage }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Run one round-trip. Never fails; internal errors become [`Reply::generic_error`].
    pub async fn handle(&self, request: &UssdRequest) -> Reply {
        info!(
            session_id = %request.session_id,
            phone = %mask_phone(&request.phone_number),
            service_code = %request.service_code,
            "USSD request"
        );

        if request.session_id.trim().is_empty() || request.phone_number.trim().is_empty() {
            warn!(
                has_session_id = !request.session_id.trim().is_empty(),
                has_phone = !request.phone_number.trim().is_empty(),
                "Rejecting USSD request without session id or phone number"
            );
            return Reply::generic_error();
        }

        match self.run(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    session_id = %request.session_id,
                    error = %e,
                    "Failed to process USSD request"
                );
                if let Err(e) = self.storage.delete(&request.session_id).await {
                    warn!(
                        session_id = %request.session_id,
                        error = %e,
                        "Failed to discard session after error"
                    );
                }
                Reply::generic_error()
            }
        }
    }

    async fn run(&self, request: &UssdRequest) -> Result<Reply> {
        // 1. Load or open the session
        let session = self
            .storage
            .get_or_create(&request.session_id, &request.phone_number)
            .await?;

        // 2. Advance exactly one step
        let Transition { reply, session } = self
            .machine
            .process(latest_input(&request.text), session)
            .await?;

        // 3. Keep the session for the next round-trip, or drop it with the dialog
        if reply.end_session {
            // the flow's action already happened; a stale session just ages out
            if let Err(e) = self.storage.delete(&session.id).await {
                warn!(
                    session_id = %session.id,
                    error = %e,
                    "Failed to remove finished session"
                );
            }
        } else {
            self.storage.save(session).await?;
        }

        Ok(reply)
    }
}

/// Phone numbers are logged with everything but the last four digits hidden.
pub fn mask_phone(phone_number: &str) -> String {
    let chars: Vec<char> = phone_number.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}
