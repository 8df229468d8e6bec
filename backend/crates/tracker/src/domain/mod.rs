//! Domain Layer
//!
//! Entities, value objects and store contracts. No I/O.

pub mod entity;
pub mod repository;
pub mod value_object;
