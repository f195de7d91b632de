//! Authentication: the session lifecycle and where the bearer token lives.
//!
//! - `Session`: login / logout / restore over an `AuthBackend`
//! - `TokenStore`: persisted token storage (file, OS keychain, memory)

pub mod session;
pub mod token_store;

pub use session::{AuthBackend, AuthError, Session};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
