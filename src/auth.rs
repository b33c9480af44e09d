//! Credential model and the redacting wrappers used for token and client secrets.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
