//! Authentication core: credential verification, token signing, refresh
//! session storage, and lifecycle orchestration.
//!
//! Nothing in here knows about HTTP. The boundary layer in `crate::api`
//! maps [`AuthError`] variants to transport responses and moves refresh
//! tokens over whatever secure channel it chooses.

pub mod config;
pub mod error;
pub mod manager;
pub mod password;
pub mod store;
pub mod token;
pub mod users;

pub use config::{AuthConfig, BindingPolicy};
pub use error::AuthError;
pub use manager::{ClientContext, IssuedTokens, SessionManager, SignedIn};
pub use token::{Claims, TokenKind};
