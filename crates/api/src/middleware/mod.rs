//! Request extractors shared by handlers.
//!
//! - [`admin::RequireAdmin`] -- Requires admin basic-auth credentials.
//! - [`client_addr::ClientAddr`] -- Resolves the caller's network address.

pub mod admin;
pub mod client_addr;
