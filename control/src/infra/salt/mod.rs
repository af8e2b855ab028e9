//! salt-api HTTP session: login, token cache, command and wheel calls.

pub mod client;
pub mod keys;
pub mod session;

pub use client::SaltClient;
pub use session::TokenCache;
