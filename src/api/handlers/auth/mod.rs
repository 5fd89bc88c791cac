//! Auth endpoint modules.
//!
//! The refresh token only ever travels in the `atesti_refresh` cookie;
//! handlers never echo it in a body. Access tokens are presented back as
//! `Authorization: Bearer` headers.

pub(crate) mod session;
pub(crate) mod types;
mod utils;

pub use session::{refresh, session, signin, signout};

/// Cookie carrying the raw refresh token.
pub(crate) const REFRESH_COOKIE_NAME: &str = "atesti_refresh";
