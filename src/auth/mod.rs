//! Session management
//!
//! Holds the access credential (persisted between runs), signs in against
//! the API, and decides what happens when the session can no longer be
//! renewed.

pub mod session;
pub mod tokens;

pub use session::{login, logout, status, LoginPrompt, Navigator, LOGIN_ROUTE};
pub use tokens::{Credential, CredentialStore, FileTokenStorage};
