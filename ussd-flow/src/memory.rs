//! In-memory ledger backing every collaborator trait.
//!
//! One struct owns customers, policies, claims and payments so that claim
//! listing can join through the customer's policies and payment initiation
//! can read the policy premium. Ids come from per-table atomic counters
//! starting at 1.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    domain::{
        Claim, ClaimId, ClaimStatus, Customer, CustomerId, NewClaim, NewCustomer, NewPolicy,
        Payment, PaymentId, PaymentStatus, Policy, PolicyId, PolicyStatus, PolicyTerm,
    },
    error::{FlowError, Result},
    ledger::{ClaimLedger, CustomerRegistry, PaymentLedger, PolicyLedger},
};

#[derive(Debug)]
struct Sequence(AtomicU64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// In-memory implementation of all four ledgers
#[derive(Debug)]
pub struct InMemoryLedger {
    customers: DashMap<CustomerId, Customer>,
    policies: DashMap<PolicyId, Policy>,
    claims: DashMap<ClaimId, Claim>,
    payments: DashMap<PaymentId, Payment>,
    customer_ids: Sequence,
    policy_ids: Sequence,
    claim_ids: Sequence,
    payment_ids: Sequence,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            policies: DashMap::new(),
            claims: DashMap::new(),
            payments: DashMap::new(),
            customer_ids: Sequence::new(),
            policy_ids: Sequence::new(),
            claim_ids: Sequence::new(),
            payment_ids: Sequence::new(),
        }
    }

    fn policies_where(&self, predicate: impl Fn(&Policy) -> bool) -> Vec<Policy> {
        let mut policies: Vec<Policy> = self
            .policies
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        policies.sort_by_key(|p| p.id);
        policies
    }

    /// Overwrite a stored policy. Lets operators and tests move policies
    /// between statuses outside of the menu flows.
    pub fn put_policy(&self, policy: Policy) {
        self.policies.insert(policy.id, policy);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRegistry for InMemoryLedger {
    async fn register(&self, customer: NewCustomer) -> Result<Customer> {
        let customer = Customer {
            id: self.customer_ids.next(),
            phone_number: customer.phone_number,
            name: customer.name,
            id_number: customer.id_number,
            date_of_birth: customer.date_of_birth,
            email: None,
            created_at: Utc::now(),
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>> {
        // earliest registration wins if a number was registered twice
        Ok(self
            .customers
            .iter()
            .filter(|entry| entry.phone_number == phone_number)
            .min_by_key(|entry| entry.id)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl PolicyLedger for InMemoryLedger {
    async fn create(&self, policy: NewPolicy) -> Result<Policy> {
        let now = Utc::now();
        let id = self.policy_ids.next();
        let policy = Policy {
            id,
            customer_id: policy.customer_id,
            policy_number: format!("POL{}{:06}", now.format("%Y%m%d"), id),
            policy_type: policy.policy_type,
            status: policy.status,
            premium: policy.premium,
            cover_amount: policy.cover_amount,
            start_date: policy.start_date,
            end_date: policy.end_date,
            next_payment_date: policy.next_payment_date,
            created_at: now,
        };
        self.policies.insert(id, policy.clone());
        Ok(policy)
    }

    async fn find(&self, policy_id: PolicyId) -> Result<Option<Policy>> {
        Ok(self.policies.get(&policy_id).map(|entry| entry.clone()))
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Policy>> {
        Ok(self.policies_where(|p| p.customer_id == customer_id))
    }

    async fn list_active(&self, customer_id: CustomerId) -> Result<Vec<Policy>> {
        Ok(self.policies_where(|p| {
            p.customer_id == customer_id && p.status == PolicyStatus::Active
        }))
    }

    async fn list_expired(&self, customer_id: CustomerId) -> Result<Vec<Policy>> {
        let now = Utc::now();
        Ok(self.policies_where(|p| p.customer_id == customer_id && p.needs_renewal(now)))
    }

    async fn renew(&self, policy_id: PolicyId) -> Result<Policy> {
        let term = PolicyTerm::starting(Utc::now())?;
        let mut policy = self
            .policies
            .get_mut(&policy_id)
            .ok_or(FlowError::PolicyNotFound(policy_id))?;
        policy.status = PolicyStatus::Active;
        policy.start_date = term.start_date;
        policy.end_date = term.end_date;
        policy.next_payment_date = Some(term.next_payment_date);
        Ok(policy.clone())
    }
}

#[async_trait]
impl ClaimLedger for InMemoryLedger {
    async fn submit(&self, claim: NewClaim) -> Result<Claim> {
        let now = Utc::now();
        let id = self.claim_ids.next();
        let claim = Claim {
            id,
            policy_id: claim.policy_id,
            claim_number: format!("CLM{}{:06}", now.format("%Y%m%d"), id),
            claim_type: claim.claim_type,
            status: ClaimStatus::Submitted,
            amount: 0,
            description: claim.description,
            incident_date: claim.incident_date,
            created_at: now,
            processed_at: None,
        };
        self.claims.insert(id, claim.clone());
        Ok(claim)
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Claim>> {
        let policy_ids: Vec<PolicyId> = self
            .policies_where(|p| p.customer_id == customer_id)
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut claims: Vec<Claim> = self
            .claims
            .iter()
            .filter(|entry| policy_ids.contains(&entry.policy_id))
            .map(|entry| entry.value().clone())
            .collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(claims)
    }

    async fn find_by_number(&self, claim_number: &str) -> Result<Option<Claim>> {
        Ok(self
            .claims
            .iter()
            .find(|entry| entry.claim_number == claim_number)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl PaymentLedger for InMemoryLedger {
    async fn initiate(&self, policy_id: PolicyId) -> Result<Payment> {
        let amount = self
            .policies
            .get(&policy_id)
            .map(|policy| policy.premium)
            .ok_or(FlowError::PolicyNotFound(policy_id))?;

        let now = Utc::now();
        let id = self.payment_ids.next();
        let payment = Payment {
            id,
            policy_id,
            amount,
            status: PaymentStatus::Pending,
            transaction_reference: format!("TXN{}{}", now.format("%Y%m%d%H%M%S"), id),
            created_at: now,
            completed_at: None,
        };
        self.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn complete(&self, reference: &str) -> Result<Payment> {
        let payment = {
            let mut entry = self
                .payments
                .iter_mut()
                .find(|entry| entry.transaction_reference == reference)
                .ok_or_else(|| FlowError::PaymentNotFound(reference.to_string()))?;
            entry.status = PaymentStatus::Completed;
            entry.completed_at = Some(Utc::now());
            entry.value().clone()
        };

        // the first completed payment is what activates a freshly bought policy
        if let Some(mut policy) = self.policies.get_mut(&payment.policy_id) {
            if policy.status == PolicyStatus::Pending {
                policy.status = PolicyStatus::Active;
            }
        }

        Ok(payment)
    }

    async fn list_by_policy(&self, policy_id: PolicyId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|entry| entry.policy_id == policy_id)
            .map(|entry| entry.value().clone())
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClaimType, PolicyType};
    use chrono::{Duration, NaiveDate};

    async fn customer(ledger: &InMemoryLedger, phone: &str) -> Customer {
        ledger
            .register(NewCustomer {
                phone_number: phone.to_string(),
                name: "Jane Doe".to_string(),
                id_number: "ID123".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .await
            .unwrap()
    }

    async fn policy(ledger: &InMemoryLedger, customer_id: CustomerId, status: PolicyStatus) -> Policy {
        let term = PolicyTerm::starting(Utc::now()).unwrap();
        ledger
            .create(NewPolicy {
                customer_id,
                policy_type: PolicyType::Health,
                status,
                premium: 50,
                cover_amount: 10000,
                start_date: term.start_date,
                end_date: term.end_date,
                next_payment_date: Some(term.next_payment_date),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_find_by_phone() {
        let ledger = InMemoryLedger::new();
        let created = customer(&ledger, "+254700000001").await;
        assert_eq!(created.id, 1);

        let found = ledger.find_by_phone("+254700000001").await.unwrap();
        assert_eq!(found, Some(created));
        assert!(ledger.find_by_phone("+254799999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_policy_number_format() {
        let ledger = InMemoryLedger::new();
        let c = customer(&ledger, "+254700000001").await;
        let p = policy(&ledger, c.id, PolicyStatus::Pending).await;

        let expected = format!("POL{}000001", Utc::now().format("%Y%m%d"));
        assert_eq!(p.policy_number, expected);
        assert_eq!(p.policy_number.len(), 3 + 8 + 6);
    }

    #[tokio::test]
    async fn test_active_and_expired_listing() {
        let ledger = InMemoryLedger::new();
        let c = customer(&ledger, "+254700000001").await;
        let active = policy(&ledger, c.id, PolicyStatus::Active).await;
        let expired = policy(&ledger, c.id, PolicyStatus::Expired).await;
        let mut lapsed = policy(&ledger, c.id, PolicyStatus::Active).await;
        lapsed.end_date = Utc::now() - Duration::days(1);
        ledger.put_policy(lapsed.clone());

        let active_ids: Vec<_> = ledger.list_active(c.id).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(active_ids, vec![active.id, lapsed.id]);

        let expired_ids: Vec<_> = ledger.list_expired(c.id).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(expired_ids, vec![expired.id, lapsed.id]);

        assert_eq!(PolicyLedger::list_by_customer(&ledger, c.id).await.unwrap().len(), 3);
        assert!(PolicyLedger::list_by_customer(&ledger, c.id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_renew_resets_term() {
        let ledger = InMemoryLedger::new();
        let c = customer(&ledger, "+254700000001").await;
        let mut p = policy(&ledger, c.id, PolicyStatus::Expired).await;
        p.end_date = Utc::now() - Duration::days(10);
        ledger.put_policy(p.clone());

        let renewed = ledger.renew(p.id).await.unwrap();
        assert_eq!(renewed.status, PolicyStatus::Active);
        assert!(renewed.end_date > Utc::now() + Duration::days(360));
        assert!(renewed.next_payment_date.unwrap() > Utc::now() + Duration::days(27));

        assert!(matches!(
            ledger.renew(999).await,
            Err(FlowError::PolicyNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_claims_join_through_customer_policies() {
        let ledger = InMemoryLedger::new();
        let jane = customer(&ledger, "+254700000001").await;
        let john = customer(&ledger, "+254700000002").await;
        let janes = policy(&ledger, jane.id, PolicyStatus::Active).await;
        let johns = policy(&ledger, john.id, PolicyStatus::Active).await;

        let submit = |policy_id, description: &str| NewClaim {
            policy_id,
            claim_type: ClaimType::Theft,
            description: description.to_string(),
            incident_date: Utc::now(),
            status: ClaimStatus::Submitted,
        };
        let first = ledger.submit(submit(janes.id, "phone stolen")).await.unwrap();
        let second = ledger.submit(submit(janes.id, "bike stolen")).await.unwrap();
        ledger.submit(submit(johns.id, "car stolen")).await.unwrap();

        assert!(first.claim_number.starts_with("CLM"));
        assert!(first.claim_number.ends_with("000001"));

        let claims = ClaimLedger::list_by_customer(&ledger, jane.id).await.unwrap();
        let ids: Vec<_> = claims.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let found = ledger.find_by_number(&second.claim_number).await.unwrap();
        assert_eq!(found.map(|c| c.description), Some("bike stolen".to_string()));
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let ledger = InMemoryLedger::new();
        let c = customer(&ledger, "+254700000001").await;
        let p = policy(&ledger, c.id, PolicyStatus::Pending).await;

        let first = ledger.initiate(p.id).await.unwrap();
        let second = ledger.initiate(p.id).await.unwrap();
        assert_eq!(first.amount, 50);
        assert_eq!(first.status, PaymentStatus::Pending);
        assert!(first.transaction_reference.starts_with("TXN"));
        assert!(first.transaction_reference.ends_with('1'));
        assert_eq!(first.transaction_reference.len(), 3 + 14 + 1);
        assert_ne!(first.transaction_reference, second.transaction_reference);

        let completed = ledger.complete(&first.transaction_reference).await.unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
        assert!(completed.completed_at.is_some());
        let activated = ledger.find(p.id).await.unwrap().unwrap();
        assert_eq!(activated.status, PolicyStatus::Active);

        let payments = ledger.list_by_policy(p.id).await.unwrap();
        let ids: Vec<_> = payments.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(matches!(
            ledger.complete("TXN-missing").await,
            Err(FlowError::PaymentNotFound(_))
        ));
        assert!(matches!(
            ledger.initiate(42).await,
            Err(FlowError::PolicyNotFound(42))
        ));
    }
}
