//! Insurance records the menu reads and writes through the ledger traits.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlowError, Result};

pub type CustomerId = u64;
pub type PolicyId = u64;
pub type ClaimId = u64;
pub type PaymentId = u64;

/// Whole currency units. Premiums and cover amounts are never fractional.
pub type Amount = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub phone_number: String,
    pub name: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration details collected by the menu, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub phone_number: String,
    pub name: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    MicroInsurance,
    Health,
    Motor,
    Funeral,
    Life,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Pending,
    Expired,
    Cancelled,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub customer_id: CustomerId,
    pub policy_number: String,
    pub policy_type: PolicyType,
    pub status: PolicyStatus,
    pub premium: Amount,
    pub cover_amount: Amount,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// A policy is up for renewal once it is marked expired or its term has run out.
    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        self.status == PolicyStatus::Expired || self.end_date < now
    }
}

/// Dates of a one-year policy term with monthly premiums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyTerm {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub next_payment_date: DateTime<Utc>,
}

impl PolicyTerm {
    pub fn starting(now: DateTime<Utc>) -> Result<Self> {
        let end_date = now
            .checked_add_months(Months::new(12))
            .ok_or_else(|| FlowError::Ledger(format!("policy end date overflows: {now}")))?;
        let next_payment_date = now
            .checked_add_months(Months::new(1))
            .ok_or_else(|| FlowError::Ledger(format!("payment date overflows: {now}")))?;
        Ok(Self {
            start_date: now,
            end_date,
            next_payment_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPolicy {
    pub customer_id: CustomerId,
    pub policy_type: PolicyType,
    pub status: PolicyStatus,
    pub premium: Amount,
    pub cover_amount: Amount,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub next_payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimType {
    Medical,
    Accident,
    Death,
    Theft,
    Damage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub policy_id: PolicyId,
    pub claim_number: String,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub amount: Amount,
    pub description: String,
    pub incident_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub policy_id: PolicyId,
    pub claim_type: ClaimType,
    pub description: String,
    pub incident_date: DateTime<Utc>,
    pub status: ClaimStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub policy_id: PolicyId,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub transaction_reference: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// Display renders the bare variant name; that is what subscribers see on screen.
macro_rules! display_as_debug {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

display_as_debug!(PolicyType, PolicyStatus, ClaimType, ClaimStatus, PaymentStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy(status: PolicyStatus, end_date: DateTime<Utc>) -> Policy {
        let now = Utc::now();
        Policy {
            id: 1,
            customer_id: 1,
            policy_number: "POL20260101000001".to_string(),
            policy_type: PolicyType::Health,
            status,
            premium: 50,
            cover_amount: 10000,
            start_date: now,
            end_date,
            next_payment_date: None,
            created_at: now,
        }
    }

    #[test]
    fn test_renewal_is_due_for_expired_status_or_past_end_date() {
        let now = Utc::now();
        assert!(policy(PolicyStatus::Expired, now + Duration::days(30)).needs_renewal(now));
        assert!(policy(PolicyStatus::Active, now - Duration::days(1)).needs_renewal(now));
        assert!(!policy(PolicyStatus::Active, now + Duration::days(30)).needs_renewal(now));
    }

    #[test]
    fn test_policy_term_runs_one_year_with_first_payment_after_a_month() {
        let now = DateTime::parse_from_rfc3339("2026-01-31T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let term = PolicyTerm::starting(now).unwrap();
        assert_eq!(term.start_date, now);
        assert_eq!(term.end_date.format("%Y-%m-%d").to_string(), "2027-01-31");
        // clamped to the last day of February
        assert_eq!(term.next_payment_date.format("%Y-%m-%d").to_string(), "2026-02-28");
    }

    #[test]
    fn test_enums_display_their_variant_name() {
        assert_eq!(PolicyType::MicroInsurance.to_string(), "MicroInsurance");
        assert_eq!(ClaimStatus::UnderReview.to_string(), "UnderReview");
        assert_eq!(PaymentStatus::Pending.to_string(), "Pending");
    }
}
