pub mod domain;
pub mod error;
pub mod flows;
pub mod ledger;
pub mod machine;
pub mod memory;
pub mod reply;
pub mod runner;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use error::{FlowError, Result};
pub use ledger::{ClaimLedger, CustomerRegistry, Ledgers, PaymentLedger, PolicyLedger};
pub use machine::{MenuStateMachine, latest_input};
pub use memory::InMemoryLedger;
pub use reply::{GENERIC_ERROR_MESSAGE, Reply, Transition};
pub use runner::{UssdRequest, UssdRunner, mask_phone};
pub use state::{Menu, MenuState};
pub use storage::{
    DEFAULT_SESSION_TTL_SECS, InMemorySessionStorage, Session, SessionStorage,
    spawn_session_sweeper,
};
