//! Application Layer
//!
//! Use cases over the domain stores.

pub mod daily_tasks;
pub mod reference;

pub use daily_tasks::{DailyTaskService, TaskInput, parse_task_date};
pub use reference::{CompanyInput, ContinentInput, CountryInput, ReferenceService};
