//! Daily Task Entity
//!
//! A task is owned by exactly one account and carries seven lists of
//! nested entries. Entry ids are positions (1-based) within their list and
//! are reassigned on every write.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use kernel::id::{AccountId, TaskId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::TaskStatus;

/// Shared shape of nested task entries.
pub trait TaskEntry {
    const LIST: &'static str;

    fn attach(&mut self, position: i64, task_id: TaskId);

    /// True when every text field is empty after trimming.
    fn is_blank(&self) -> bool;
}

macro_rules! task_entry {
    ($(#[$meta:meta])* $name:ident, $list:literal { $($field:ident),+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default)]
            pub id: i64,
            #[serde(default)]
            pub task_id: i64,
            $(
                #[serde(default)]
                pub $field: String,
            )+
        }

        impl TaskEntry for $name {
            const LIST: &'static str = $list;

            fn attach(&mut self, position: i64, task_id: TaskId) {
                self.id = position;
                self.task_id = task_id.value();
            }

            fn is_blank(&self) -> bool {
                true $(&& self.$field.trim().is_empty())+
            }
        }
    };
}

task_entry!(Deliverable, "deliverables" { item });
task_entry!(Activity, "activities" { name });
task_entry!(ProductFocus, "product_focus" { area });
task_entry!(NextStep, "next_steps" { step });
task_entry!(Challenge, "challenges" { issue });
task_entry!(Note, "notes" { text });
task_entry!(
    /// `author` is a free-form label such as "Manager".
    Comment, "comments" { author, content }
);

/// The nested lists of a task, stored together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContent {
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub product_focus: Vec<ProductFocus>,
    #[serde(default)]
    pub next_steps: Vec<NextStep>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

fn attach_all<T: TaskEntry>(entries: &mut [T], task_id: TaskId) {
    for (position, entry) in (1_i64..).zip(entries.iter_mut()) {
        entry.attach(position, task_id);
    }
}

fn first_blank<T: TaskEntry>(entries: &[T]) -> Option<&'static str> {
    entries.iter().any(TaskEntry::is_blank).then_some(T::LIST)
}

impl TaskContent {
    pub fn attach(&mut self, task_id: TaskId) {
        attach_all(&mut self.deliverables, task_id);
        attach_all(&mut self.activities, task_id);
        attach_all(&mut self.product_focus, task_id);
        attach_all(&mut self.next_steps, task_id);
        attach_all(&mut self.challenges, task_id);
        attach_all(&mut self.notes, task_id);
        attach_all(&mut self.comments, task_id);
    }

    /// Name of the first list holding an empty entry.
    pub fn blank_list(&self) -> Option<&'static str> {
        first_blank(&self.deliverables)
            .or_else(|| first_blank(&self.activities))
            .or_else(|| first_blank(&self.product_focus))
            .or_else(|| first_blank(&self.next_steps))
            .or_else(|| first_blank(&self.challenges))
            .or_else(|| first_blank(&self.notes))
            .or_else(|| first_blank(&self.comments))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTask {
    pub id: TaskId,
    pub user_id: AccountId,
    pub day: String,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: TaskStatus,
    pub score: i32,
    pub productivity_score: i32,
    #[serde(flatten)]
    pub content: TaskContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated write model. The owner is supplied separately by the caller's
/// identity, never by the payload.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub day: String,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: TaskStatus,
    pub score: i32,
    pub productivity_score: i32,
    pub content: TaskContent,
}

impl TaskDraft {
    pub fn into_task(self, id: TaskId, owner: AccountId, created_at: DateTime<Utc>) -> DailyTask {
        let mut content = self.content;
        content.attach(id);
        DailyTask {
            id,
            user_id: owner,
            day: self.day,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
            score: self.score,
            productivity_score: self.productivity_score,
            content,
            created_at,
            updated_at: Utc::now(),
        }
    }
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TaskDraft {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let start = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        TaskDraft {
            day: weekday_name(date).to_owned(),
            date,
            start_time: start,
            end_time: start + chrono::Duration::hours(8),
            status: TaskStatus::Pending,
            score: 7,
            productivity_score: 80,
            content: TaskContent {
                deliverables: vec![
                    Deliverable {
                        item: "report".into(),
                        ..Default::default()
                    },
                    Deliverable {
                        id: 42,
                        item: "slides".into(),
                        ..Default::default()
                    },
                ],
                comments: vec![Comment {
                    author: "Manager".into(),
                    content: "good".into(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_weekday_name() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(weekday_name(monday), "Monday");
        assert_eq!(weekday_name(monday.succ_opt().unwrap()), "Tuesday");
    }

    #[test]
    fn test_into_task_numbers_entries() {
        let task = draft().into_task(TaskId::new(9), AccountId::new(3), Utc::now());
        let ids: Vec<_> = task.content.deliverables.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(task.content.deliverables.iter().all(|d| d.task_id == 9));
        assert_eq!(task.content.comments[0].task_id, 9);
        assert_eq!(task.user_id, AccountId::new(3));
    }

    #[test]
    fn test_blank_list() {
        let mut draft = draft();
        assert_eq!(draft.content.blank_list(), None);
        draft.content.notes.push(Note {
            text: "   ".into(),
            ..Default::default()
        });
        assert_eq!(draft.content.blank_list(), Some("notes"));
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let task = draft().into_task(TaskId::new(1), AccountId::new(1), Utc::now());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["date"], "2024-01-15");
        assert_eq!(value["deliverables"][1]["item"], "slides");
        assert!(value["next_steps"].as_array().unwrap().is_empty());
        assert!(value.get("content").is_none());
    }
}
