//! Conversation state carried between USSD round-trips.
//!
//! A session's [`MenuState`] is the whole state-machine state: the flow it
//! is in plus the step within that flow, with the answers collected so far
//! stored in the variant that needs them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ClaimType, PolicyId, PolicyType};

/// Top-level flow a session is in, without any step data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Menu {
    Main,
    Registering,
    BuyingInsurance,
    CheckingPolicy,
    PayingPremium,
    RenewingPolicy,
    SubmittingClaim,
    CheckingClaim,
    Support,
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RegistrationStep {
    Name,
    IdNumber { name: String },
    DateOfBirth { name: String, id_number: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PurchaseStep {
    SelectType,
    SelectCover { policy_type: PolicyType },
}

/// Policies offered as a numbered list; the subscriber answers with a 1-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySelection {
    pub candidates: Vec<PolicyId>,
}

impl PolicySelection {
    pub fn new(candidates: Vec<PolicyId>) -> Self {
        Self { candidates }
    }

    /// Resolve a subscriber's answer to a policy id.
    ///
    /// Anything that is not a number within `1..=candidates.len()` yields `None`.
    pub fn pick(&self, input: &str) -> Option<PolicyId> {
        let index: usize = input.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| self.candidates.get(i))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ClaimStep {
    SelectPolicy(PolicySelection),
    ClaimType { policy_id: PolicyId },
    Description { policy_id: PolicyId, claim_type: ClaimType },
}

/// Where a conversation is. Each variant routes to exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "menu", content = "state", rename_all = "snake_case")]
pub enum MenuState {
    #[default]
    Main,
    Registering(RegistrationStep),
    BuyingInsurance(PurchaseStep),
    CheckingPolicy,
    PayingPremium(PolicySelection),
    RenewingPolicy(PolicySelection),
    SubmittingClaim(ClaimStep),
    CheckingClaim,
    Support,
}

impl MenuState {
    pub fn menu(&self) -> Menu {
        match self {
            MenuState::Main => Menu::Main,
            MenuState::Registering(_) => Menu::Registering,
            MenuState::BuyingInsurance(_) => Menu::BuyingInsurance,
            MenuState::CheckingPolicy => Menu::CheckingPolicy,
            MenuState::PayingPremium(_) => Menu::PayingPremium,
            MenuState::RenewingPolicy(_) => Menu::RenewingPolicy,
            MenuState::SubmittingClaim(_) => Menu::SubmittingClaim,
            MenuState::CheckingClaim => Menu::CheckingClaim,
            MenuState::Support => Menu::Support,
        }
    }

    /// Name of the step within the current flow, if the flow has steps.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            MenuState::Registering(RegistrationStep::Name) => Some("name"),
            MenuState::Registering(RegistrationStep::IdNumber { .. }) => Some("id_number"),
            MenuState::Registering(RegistrationStep::DateOfBirth { .. }) => Some("dob"),
            MenuState::BuyingInsurance(PurchaseStep::SelectType) => Some("select_type"),
            MenuState::BuyingInsurance(PurchaseStep::SelectCover { .. }) => Some("select_cover"),
            MenuState::PayingPremium(_) | MenuState::RenewingPolicy(_) => Some("select_policy"),
            MenuState::SubmittingClaim(ClaimStep::SelectPolicy(_)) => Some("select_policy"),
            MenuState::SubmittingClaim(ClaimStep::ClaimType { .. }) => Some("claim_type"),
            MenuState::SubmittingClaim(ClaimStep::Description { .. }) => Some("description"),
            MenuState::Main
            | MenuState::CheckingPolicy
            | MenuState::CheckingClaim
            | MenuState::Support => None,
        }
    }
}
