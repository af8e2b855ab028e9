pub mod auth;
pub mod keys;
pub mod types;

pub use auth::{EAUTH_PAM, LoginRequest, LoginResponse, Token, TokenGrant};
pub use keys::{KEY_ACCEPT, KEY_LIST_ALL, KeySet, WheelRequest};
pub use types::*;
