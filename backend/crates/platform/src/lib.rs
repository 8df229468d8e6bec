//! Technical building blocks shared by the feature crates:
//! - Argon2id credential hashing
//! - bearer credential parsing
//! - client address resolution
//! - environment variable access
//! - random secrets and base64

pub mod bearer;
pub mod client;
pub mod crypto;
pub mod env;
pub mod password;
