use chrono::Utc;
use tracing::{info, warn};

use super::{
    Outcome,
    menus::{CoverTier, INVALID_SELECTION_RETRY, POLICY_TYPE_MENU, cover_options, policy_type_for_choice},
};
use crate::{
    domain::{NewPolicy, PolicyStatus, PolicyTerm, PolicyType},
    error::Result,
    ledger::Ledgers,
    state::{MenuState, PurchaseStep},
};

pub(crate) fn start() -> Outcome {
    Outcome::prompt(
        POLICY_TYPE_MENU,
        MenuState::BuyingInsurance(PurchaseStep::SelectType),
    )
}

pub(crate) async fn resume(
    ledgers: &Ledgers,
    phone_number: &str,
    step: PurchaseStep,
    input: &str,
) -> Result<Outcome> {
    match step {
        PurchaseStep::SelectType => Ok(select_type(input)),
        PurchaseStep::SelectCover { policy_type } => {
            select_cover(ledgers, phone_number, policy_type, input).await
        }
    }
}

fn select_type(input: &str) -> Outcome {
    match policy_type_for_choice(input) {
        Some(policy_type) => Outcome::prompt(
            format!("Select Cover Amount:\n{}", cover_options(policy_type)),
            MenuState::BuyingInsurance(PurchaseStep::SelectCover { policy_type }),
        ),
        None => {
            warn!(input, "Invalid insurance type selection");
            Outcome::end(INVALID_SELECTION_RETRY)
        }
    }
}

async fn select_cover(
    ledgers: &Ledgers,
    phone_number: &str,
    policy_type: PolicyType,
    input: &str,
) -> Result<Outcome> {
    let Some(tier) = CoverTier::parse(input) else {
        warn!(input, "Invalid cover tier selection");
        return Ok(Outcome::end(INVALID_SELECTION_RETRY));
    };

    let Some(customer) = ledgers.customers.find_by_phone(phone_number).await? else {
        return Ok(Outcome::end("Please register first (option 1 from main menu)"));
    };

    let premium = tier.premium(policy_type);
    let term = PolicyTerm::starting(Utc::now())?;
    let policy = ledgers
        .policies
        .create(NewPolicy {
            customer_id: customer.id,
            policy_type,
            status: PolicyStatus::Pending,
            premium,
            cover_amount: tier.cover_amount(),
            start_date: term.start_date,
            end_date: term.end_date,
            next_payment_date: Some(term.next_payment_date),
        })
        .await?;
    info!(
        policy_number = %policy.policy_number,
        policy_type = %policy_type,
        premium,
        "Policy created"
    );

    Ok(Outcome::end(format!(
        "Policy Created!\nPolicy No: {}\nPremium: ${}/month\nCover: ${}\nComplete payment to activate.",
        policy.policy_number, policy.premium, policy.cover_amount
    )))
}
