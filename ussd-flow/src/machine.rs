use tracing::{debug, info};

use crate::{
    error::Result,
    flows::{
        Outcome, buy_insurance, check_claim, check_policy, main_menu, pay_premium, registration,
        renew_policy, submit_claim, support,
    },
    ledger::Ledgers,
    reply::Transition,
    state::MenuState,
    storage::Session,
};

/// Decides the next screen and session state for one subscriber input.
///
/// The machine never touches a session store: it takes a session by value
/// and hands the updated one back inside the [`Transition`]. Persisting it,
/// or discarding it when the reply ends the dialog, is up to the caller.
#[derive(Clone)]
pub struct MenuStateMachine {
    ledgers: Ledgers,
}

impl MenuStateMachine {
    pub fn new(ledgers: Ledgers) -> Self {
        Self { ledgers }
    }

    /// Feed `input` (already reduced to the newest `*` segment) to the session.
    pub async fn process(&self, input: &str, mut session: Session) -> Result<Transition> {
        let state = std::mem::take(&mut session.menu);
        let menu = state.menu();
        debug!(
            session_id = %session.id,
            menu = %menu,
            step = ?state.step(),
            "Processing input"
        );

        let outcome = self.dispatch(state, &session.phone_number, input).await?;

        if outcome.reply.end_session {
            info!(session_id = %session.id, menu = %menu, "Flow finished");
        } else if outcome.next.menu() != menu {
            info!(
                session_id = %session.id,
                from = %menu,
                to = %outcome.next.menu(),
                "Entered flow"
            );
        }

        session.menu = outcome.next;
        Ok(Transition {
            reply: outcome.reply,
            session,
        })
    }

    async fn dispatch(&self, state: MenuState, phone_number: &str, input: &str) -> Result<Outcome> {
        let ledgers = &self.ledgers;
        match state {
            MenuState::Main => main_menu::handle(ledgers, phone_number, input).await,
            MenuState::Registering(step) => {
                registration::resume(ledgers, phone_number, step, input).await
            }
            MenuState::BuyingInsurance(step) => {
                buy_insurance::resume(ledgers, phone_number, step, input).await
            }
            MenuState::CheckingPolicy => check_policy::handle(ledgers, phone_number).await,
            MenuState::PayingPremium(selection) => {
                pay_premium::resume(ledgers, selection, input).await
            }
            MenuState::RenewingPolicy(selection) => {
                renew_policy::resume(ledgers, selection, input).await
            }
            MenuState::SubmittingClaim(step) => submit_claim::resume(ledgers, step, input).await,
            MenuState::CheckingClaim => check_claim::handle(ledgers, phone_number).await,
            MenuState::Support => Ok(support::handle()),
        }
    }
}

/// The part of a gateway `Text` field this round-trip answers.
///
/// Gateways resend the whole dialog history joined with `*` (`"1*Jane Doe"`);
/// only the last segment is new.
pub fn latest_input(text: &str) -> &str {
    text.rsplit('*').next().unwrap_or_default()
}
