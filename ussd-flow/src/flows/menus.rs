//! Screen text and the numeric choice tables behind it.

use chrono::{DateTime, Utc};

use crate::domain::{Amount, ClaimType, PolicyType};

pub const MAIN_MENU: &str = "Welcome to Insurance Services\n\
    1. Register/Onboard\n\
    2. Buy Insurance\n\
    3. Check Policy Status\n\
    4. Pay Premium\n\
    5. Renew Policy\n\
    6. Submit Claim\n\
    7. Check Claim Status\n\
    8. Customer Support";

pub const POLICY_TYPE_MENU: &str = "Select Insurance Type:\n\
    1. Micro Insurance\n\
    2. Health Insurance\n\
    3. Motor Insurance\n\
    4. Funeral Cover\n\
    5. Life Insurance";

pub const CLAIM_TYPE_MENU: &str = "Claim Type:\n\
    1. Medical\n\
    2. Accident\n\
    3. Death\n\
    4. Theft\n\
    5. Damage";

pub const SUPPORT_TEXT: &str = "Customer Support:\n\
    Call: 0800-123-456\n\
    Email: support@insurance.com\n\
    Hours: Mon-Fri 8AM-6PM\n\n\
    FAQs:\n\
    1. How to claim?\n\
    2. Payment methods?\n\
    3. Coverage details?";

pub const INVALID_SELECTION: &str = "Invalid selection.";
pub const INVALID_SELECTION_RETRY: &str = "Invalid selection. Please try again.";
pub const REGISTER_FIRST: &str = "Please register first.";

pub fn policy_type_for_choice(choice: &str) -> Option<PolicyType> {
    match choice.trim() {
        "1" => Some(PolicyType::MicroInsurance),
        "2" => Some(PolicyType::Health),
        "3" => Some(PolicyType::Motor),
        "4" => Some(PolicyType::Funeral),
        "5" => Some(PolicyType::Life),
        _ => None,
    }
}

/// Unknown codes are filed as [`ClaimType::Other`] rather than rejected.
pub fn claim_type_for_choice(choice: &str) -> ClaimType {
    match choice.trim() {
        "1" => ClaimType::Medical,
        "2" => ClaimType::Accident,
        "3" => ClaimType::Death,
        "4" => ClaimType::Theft,
        "5" => ClaimType::Damage,
        _ => ClaimType::Other,
    }
}

/// Cover options as shown on screen for each product.
pub fn cover_options(policy_type: PolicyType) -> &'static str {
    match policy_type {
        PolicyType::MicroInsurance => "1. $1,000\n2. $2,500\n3. $5,000",
        PolicyType::Health => "1. $10,000\n2. $25,000\n3. $50,000",
        PolicyType::Motor => "1. $15,000\n2. $30,000\n3. $50,000",
        PolicyType::Funeral => "1. $3,000\n2. $5,000\n3. $10,000",
        PolicyType::Life => "1. $50,000\n2. $100,000\n3. $250,000",
        PolicyType::Property => "1. $5,000\n2. $10,000\n3. $25,000",
    }
}

/// Monthly premium per cover tier.
pub fn base_premium_rate(policy_type: PolicyType) -> Amount {
    match policy_type {
        PolicyType::MicroInsurance => 5,
        PolicyType::Health => 50,
        PolicyType::Motor => 75,
        PolicyType::Funeral => 15,
        PolicyType::Life => 100,
        PolicyType::Property => 25,
    }
}

/// A cover tier the subscriber picked, 1 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverTier(u8);

impl CoverTier {
    pub fn parse(choice: &str) -> Option<Self> {
        match choice.trim().parse::<u8>().ok()? {
            tier @ 1..=3 => Some(Self(tier)),
            _ => None,
        }
    }

    pub fn premium(self, policy_type: PolicyType) -> Amount {
        base_premium_rate(policy_type) * Amount::from(self.0)
    }

    /// Cover actually written on the policy. The same for every product,
    /// even though [`cover_options`] advertises per-product figures.
    pub fn cover_amount(self) -> Amount {
        match self.0 {
            1 => 10_000,
            2 => 25_000,
            _ => 50_000,
        }
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `header` followed by one `"<n>. <line>"` row per item, numbered from 1.
pub fn numbered<I>(header: &str, lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut message = header.to_string();
    for (i, line) in lines.into_iter().enumerate() {
        message.push_str(&format!("\n{}. {}", i + 1, line));
    }
    message
}
