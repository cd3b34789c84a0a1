//! One module per top-level menu option.
//!
//! Every handler returns an [`Outcome`]: the screen to show and the state the
//! session moves to. Terminal outcomes always move back to [`MenuState::Main`]
//! because the caller discards the session anyway.

pub mod menus;

pub(crate) mod buy_insurance;
pub(crate) mod check_claim;
pub(crate) mod check_policy;
pub(crate) mod main_menu;
pub(crate) mod pay_premium;
pub(crate) mod registration;
pub(crate) mod renew_policy;
pub(crate) mod submit_claim;
pub(crate) mod support;

use crate::{reply::Reply, state::MenuState};

#[derive(Debug)]
pub(crate) struct Outcome {
    pub reply: Reply,
    pub next: MenuState,
}

impl Outcome {
    pub fn prompt(message: impl Into<String>, next: MenuState) -> Self {
        Self {
            reply: Reply::prompt(message),
            next,
        }
    }

    pub fn end(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::end(message),
            next: MenuState::Main,
        }
    }
}
