use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    domain::{
        Claim, Customer, CustomerId, NewClaim, NewCustomer, NewPolicy, Payment, Policy, PolicyId,
    },
    error::Result,
    memory::InMemoryLedger,
};

/// Trait for registering and looking up subscribers
#[async_trait]
pub trait CustomerRegistry: Send + Sync {
    /// Store a new customer and assign its id.
    async fn register(&self, customer: NewCustomer) -> Result<Customer>;
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>>;
}

/// Trait for creating, listing and renewing policies
#[async_trait]
pub trait PolicyLedger: Send + Sync {
    /// Store a new policy, assigning its id and a `POL<yyyyMMdd><id:06>` number.
    async fn create(&self, policy: NewPolicy) -> Result<Policy>;
    async fn find(&self, policy_id: PolicyId) -> Result<Option<Policy>>;
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Policy>>;
    async fn list_active(&self, customer_id: CustomerId) -> Result<Vec<Policy>>;
    /// Policies marked expired or whose end date has already passed.
    async fn list_expired(&self, customer_id: CustomerId) -> Result<Vec<Policy>>;
    /// Reactivate a policy for another year starting now.
    async fn renew(&self, policy_id: PolicyId) -> Result<Policy>;
}

/// Trait for claim submission and lookup
#[async_trait]
pub trait ClaimLedger: Send + Sync {
    /// Store a new claim, assigning its id and a `CLM<yyyyMMdd><id:06>` number.
    async fn submit(&self, claim: NewClaim) -> Result<Claim>;
    /// Claims across all of the customer's policies, newest first.
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Claim>>;
    async fn find_by_number(&self, claim_number: &str) -> Result<Option<Claim>>;
}

/// Trait for premium payments
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Open a pending payment for the policy premium with a fresh `TXN` reference.
    async fn initiate(&self, policy_id: PolicyId) -> Result<Payment>;
    /// Mark the payment behind `reference` as completed.
    async fn complete(&self, reference: &str) -> Result<Payment>;
    /// Payments for one policy, newest first.
    async fn list_by_policy(&self, policy_id: PolicyId) -> Result<Vec<Payment>>;
}

/// The collaborators a menu flow may call
#[derive(Clone)]
pub struct Ledgers {
    pub customers: Arc<dyn CustomerRegistry>,
    pub policies: Arc<dyn PolicyLedger>,
    pub claims: Arc<dyn ClaimLedger>,
    pub payments: Arc<dyn PaymentLedger>,
}

impl Ledgers {
    /// Back every collaborator with the same in-memory ledger.
    pub fn in_memory(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            customers: ledger.clone(),
            policies: ledger.clone(),
            claims: ledger.clone(),
            payments: ledger,
        }
    }
}
