use super::{Outcome, menus::format_date};
use crate::{error::Result, ledger::Ledgers};

pub(crate) async fn handle(ledgers: &Ledgers, phone_number: &str) -> Result<Outcome> {
    let Some(customer) = ledgers.customers.find_by_phone(phone_number).await? else {
        return Ok(Outcome::end("No customer account found. Please register first."));
    };

    let policies = ledgers.policies.list_by_customer(customer.id).await?;
    if policies.is_empty() {
        return Ok(Outcome::end("You have no policies."));
    }

    let mut message = String::from("Your Policies:\n");
    for policy in &policies {
        let next_payment = policy
            .next_payment_date
            .map(format_date)
            .unwrap_or_else(|| "N/A".to_string());
        message.push_str(&format!(
            "\n{}\nType: {}\nStatus: {}\nPremium: ${}\nNext Payment: {}\n",
            policy.policy_number, policy.policy_type, policy.status, policy.premium, next_payment
        ));
    }

    Ok(Outcome::end(message))
}
