use tracing::debug;

use super::{
    Outcome, buy_insurance, check_claim, check_policy, menus::MAIN_MENU, pay_premium,
    registration, renew_policy, submit_claim, support,
};
use crate::{error::Result, ledger::Ledgers, state::MenuState};

/// Route a main-menu choice into its flow. Anything unrecognised, including
/// an empty first dial, just shows the menu again.
pub(crate) async fn handle(ledgers: &Ledgers, phone_number: &str, input: &str) -> Result<Outcome> {
    let choice = input.trim();
    debug!(choice, "Main menu selection");

    match choice {
        "1" => Ok(registration::start()),
        "2" => Ok(buy_insurance::start()),
        "3" => check_policy::handle(ledgers, phone_number).await,
        "4" => pay_premium::start(ledgers, phone_number).await,
        "5" => renew_policy::start(ledgers, phone_number).await,
        "6" => submit_claim::start(ledgers, phone_number).await,
        "7" => check_claim::handle(ledgers, phone_number).await,
        "8" => Ok(support::handle()),
        _ => Ok(Outcome::prompt(MAIN_MENU, MenuState::Main)),
    }
}
