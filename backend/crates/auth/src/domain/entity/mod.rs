pub mod account;
pub mod identity;

pub use account::{Account, NewAccount};
pub use identity::AuthenticatedIdentity;
