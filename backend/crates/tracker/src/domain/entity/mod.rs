pub mod daily_task;
pub mod reference;

pub use daily_task::{
    Activity, Challenge, Comment, DailyTask, Deliverable, NextStep, Note, ProductFocus,
    TaskContent, TaskDraft, TaskEntry, weekday_name,
};
pub use reference::{Company, CompanyDraft, Continent, ContinentDraft, Country, CountryDraft};
