//! Infrastructure Layer
//!
//! Credential store implementations.

pub mod memory;
pub mod postgres;
