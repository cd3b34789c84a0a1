use tracing::{info, warn};

use super::{
    Outcome,
    menus::{INVALID_SELECTION, REGISTER_FIRST, format_date, numbered},
};
use crate::{
    error::Result,
    ledger::Ledgers,
    state::{MenuState, PolicySelection},
};

pub(crate) async fn start(ledgers: &Ledgers, phone_number: &str) -> Result<Outcome> {
    let Some(customer) = ledgers.customers.find_by_phone(phone_number).await? else {
        return Ok(Outcome::end(REGISTER_FIRST));
    };

    let policies = ledgers.policies.list_expired(customer.id).await?;
    if policies.is_empty() {
        return Ok(Outcome::end("No policies need renewal."));
    }

    let message = numbered(
        "Select policy to renew:",
        policies
            .iter()
            .map(|p| format!("{} - {}", p.policy_number, p.policy_type)),
    );
    let selection = PolicySelection::new(policies.iter().map(|p| p.id).collect());

    Ok(Outcome::prompt(message, MenuState::RenewingPolicy(selection)))
}

pub(crate) async fn resume(
    ledgers: &Ledgers,
    selection: PolicySelection,
    input: &str,
) -> Result<Outcome> {
    let Some(policy_id) = selection.pick(input) else {
        warn!(input, candidates = selection.candidates.len(), "Invalid policy selection");
        return Ok(Outcome::end(INVALID_SELECTION));
    };

    let renewed = ledgers.policies.renew(policy_id).await?;
    info!(policy_number = %renewed.policy_number, "Policy renewed");

    Ok(Outcome::end(format!(
        "Policy renewed successfully!\nPolicy No: {}\nNew End Date: {}",
        renewed.policy_number,
        format_date(renewed.end_date)
    )))
}
