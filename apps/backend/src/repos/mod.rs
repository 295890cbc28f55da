//! Store contract, change feed and the in-memory implementation.

pub mod change_feed;
pub mod memory;
pub mod session_store;

pub use change_feed::{ChangeEvent, ChangeFeed};
pub use memory::InMemorySessionStore;
pub use session_store::{
    ClaimTarget, DispatchClaim, InsertOutcome, SessionSnapshot, SessionStore, StateGuard,
    StateUpdate,
};
