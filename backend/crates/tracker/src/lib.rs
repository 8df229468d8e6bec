//! Tracker domain: the continent, country and company reference hierarchy
//! and per-account daily tasks.
//!
//! Clean Architecture structure:
//! - `domain/` - entities, value objects, store contracts
//! - `application/` - reference and daily task use cases
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! Authentication and ownership checks come from the `auth` crate.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use domain::repository::TrackerStore;
pub use error::{TrackerError, TrackerResult};
pub use infra::memory::MemoryTrackerStore;
pub use infra::postgres::PgTrackerStore;
pub use presentation::{TrackerAppState, tracker_router};
