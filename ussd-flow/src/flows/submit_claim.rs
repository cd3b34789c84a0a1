use chrono::Utc;
use tracing::{info, warn};

use super::{
    Outcome,
    menus::{CLAIM_TYPE_MENU, INVALID_SELECTION, REGISTER_FIRST, claim_type_for_choice, numbered},
};
use crate::{
    domain::{ClaimStatus, ClaimType, NewClaim, PolicyId},
    error::Result,
    ledger::Ledgers,
    state::{ClaimStep, MenuState, PolicySelection},
};

pub(crate) async fn start(ledgers: &Ledgers, phone_number: &str) -> Result<Outcome> {
    let Some(customer) = ledgers.customers.find_by_phone(phone_number).await? else {
        return Ok(Outcome::end(REGISTER_FIRST));
    };

    let policies = ledgers.policies.list_active(customer.id).await?;
    if policies.is_empty() {
        return Ok(Outcome::end("No active policies found."));
    }

    let message = numbered(
        "Select policy for claim:",
        policies
            .iter()
            .map(|p| format!("{} - {}", p.policy_number, p.policy_type)),
    );
    let selection = PolicySelection::new(policies.iter().map(|p| p.id).collect());

    Ok(Outcome::prompt(
        message,
        MenuState::SubmittingClaim(ClaimStep::SelectPolicy(selection)),
    ))
}

pub(crate) async fn resume(ledgers: &Ledgers, step: ClaimStep, input: &str) -> Result<Outcome> {
    match step {
        ClaimStep::SelectPolicy(selection) => {
            let Some(policy_id) = selection.pick(input) else {
                warn!(input, candidates = selection.candidates.len(), "Invalid policy selection");
                return Ok(Outcome::end(INVALID_SELECTION));
            };
            Ok(Outcome::prompt(
                CLAIM_TYPE_MENU,
                MenuState::SubmittingClaim(ClaimStep::ClaimType { policy_id }),
            ))
        }
        ClaimStep::ClaimType { policy_id } => Ok(Outcome::prompt(
            "Brief description of incident:",
            MenuState::SubmittingClaim(ClaimStep::Description {
                policy_id,
                claim_type: claim_type_for_choice(input),
            }),
        )),
        ClaimStep::Description {
            policy_id,
            claim_type,
        } => submit(ledgers, policy_id, claim_type, input).await,
    }
}

async fn submit(
    ledgers: &Ledgers,
    policy_id: PolicyId,
    claim_type: ClaimType,
    description: &str,
) -> Result<Outcome> {
    let claim = ledgers
        .claims
        .submit(NewClaim {
            policy_id,
            claim_type,
            description: description.trim().to_string(),
            incident_date: Utc::now(),
            status: ClaimStatus::Submitted,
        })
        .await?;
    info!(
        claim_number = %claim.claim_number,
        claim_type = %claim.claim_type,
        policy_id,
        "Claim submitted"
    );

    Ok(Outcome::end(format!(
        "Claim submitted successfully!\nClaim No: {}\nStatus: Under Review\nYou'll be contacted within 48 hours.",
        claim.claim_number
    )))
}
