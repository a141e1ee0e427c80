// Authentication module
// Manages credential storage, decoding and the session lifecycle

mod api;
pub(crate) mod claims;
mod manager;
mod store;
mod types;

pub use api::AuthApi;
pub use claims::{decode, Claims, DecodeError};
pub use manager::{RenewalSchedule, ResumeOutcome, SessionManager, DEFAULT_RENEWAL_MARGIN};
pub use store::{MemoryStorage, Session, SessionStorage, SessionStore};
pub use types::{RefreshOutcome, TokenPair};
