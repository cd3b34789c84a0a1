use super::{Outcome, menus::format_date};
use crate::{error::Result, ledger::Ledgers};

pub(crate) async fn handle(ledgers: &Ledgers, phone_number: &str) -> Result<Outcome> {
    let Some(customer) = ledgers.customers.find_by_phone(phone_number).await? else {
        return Ok(Outcome::end("No customer account found."));
    };

    let claims = ledgers.claims.list_by_customer(customer.id).await?;
    if claims.is_empty() {
        return Ok(Outcome::end("No claims found."));
    }

    let mut message = String::from("Your Claims:\n");
    for claim in &claims {
        message.push_str(&format!(
            "\n{}\nType: {}\nStatus: {}\nAmount: ${}\nDate: {}\n",
            claim.claim_number,
            claim.claim_type,
            claim.status,
            claim.amount,
            format_date(claim.created_at)
        ));
    }

    Ok(Outcome::end(message))
}
