use super::{Outcome, menus::SUPPORT_TEXT};

pub(crate) fn handle() -> Outcome {
    Outcome::end(SUPPORT_TEXT)
}
