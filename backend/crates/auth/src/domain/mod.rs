//! Domain layer: accounts, identities, value objects and the credential store contract.

pub mod entity;
pub mod repository;
pub mod value_object;
