use chrono::NaiveDate;
use tracing::{info, warn};

use super::Outcome;
use crate::{
    domain::NewCustomer,
    error::Result,
    ledger::Ledgers,
    state::{MenuState, RegistrationStep},
};

pub(crate) fn start() -> Outcome {
    Outcome::prompt(
        "Registration\nEnter your full name:",
        MenuState::Registering(RegistrationStep::Name),
    )
}

pub(crate) async fn resume(
    ledgers: &Ledgers,
    phone_number: &str,
    step: RegistrationStep,
    input: &str,
) -> Result<Outcome> {
    match step {
        RegistrationStep::Name => Ok(Outcome::prompt(
            "Enter your ID number:",
            MenuState::Registering(RegistrationStep::IdNumber {
                name: input.trim().to_string(),
            }),
        )),
        RegistrationStep::IdNumber { name } => Ok(Outcome::prompt(
            "Enter date of birth (YYYY-MM-DD):",
            MenuState::Registering(RegistrationStep::DateOfBirth {
                name,
                id_number: input.trim().to_string(),
            }),
        )),
        RegistrationStep::DateOfBirth { name, id_number } => {
            let Ok(date_of_birth) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") else {
                warn!(input, "Unparseable date of birth");
                return Ok(Outcome::end("Invalid date format. Use YYYY-MM-DD."));
            };

            let customer = ledgers
                .customers
                .register(NewCustomer {
                    phone_number: phone_number.to_string(),
                    name,
                    id_number,
                    date_of_birth,
                })
                .await?;
            info!(customer_id = customer.id, "Customer registered");

            Ok(Outcome::end(format!(
                "Registration successful!\nWelcome {}.\nYou can now buy insurance policies.",
                customer.name
            )))
        }
    }
}
