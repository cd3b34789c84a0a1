use tracing::{info, warn};

use super::{
    Outcome,
    menus::{INVALID_SELECTION, REGISTER_FIRST, numbered},
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

    let policies = ledgers.policies.list_by_customer(customer.id).await?;
    if policies.is_empty() {
        return Ok(Outcome::end("No policies found."));
    }

    let message = numbered(
        "Select policy to pay:",
        policies
            .iter()
            .map(|p| format!("{} - ${}", p.policy_number, p.premium)),
    );
    let selection = PolicySelection::new(policies.iter().map(|p| p.id).collect());

    Ok(Outcome::prompt(message, MenuState::PayingPremium(selection)))
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

    let payment = ledgers.payments.initiate(policy_id).await?;
    info!(
        policy_id,
        reference = %payment.transaction_reference,
        amount = payment.amount,
        "Payment initiated"
    );

    Ok(Outcome::end(format!(
        "Payment initiated!\nAmount: ${}\nReference: {}\nComplete payment via M-Pesa to activate.",
        payment.amount, payment.transaction_reference
    )))
}
