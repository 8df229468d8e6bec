//! Shared kernel for the tracker backend.
//!
//! Holds the vocabulary every feature crate agrees on:
//! - the wire error type ([`error::app_error::AppError`]) and its classification
//! - typed numeric identifiers ([`id::Id`])
//!
//! HTTP rendering and the request extractors in [`extract`] are behind the
//! `axum` feature.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
#[cfg(feature = "axum")]
pub mod extract;
pub mod id;

pub use error::app_error::{AppError, AppResult};
pub use error::kind::ErrorKind;
pub use id::Id;
