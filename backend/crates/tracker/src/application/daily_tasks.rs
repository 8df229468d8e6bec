//! Daily task use cases.
//!
//! The owner of a new task is always the caller. Updates and deletes load
//! the task first and run the ownership check before touching the payload.

use std::sync::Arc;

use auth::{AuthenticatedIdentity, OwnershipPolicy, ensure_owner};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::TaskId;

use crate::domain::entity::{DailyTask, TaskContent, TaskDraft, weekday_name};
use crate::domain::repository::DailyTaskRepository;
use crate::domain::value_object::TaskStatus;
use crate::error::{TrackerError, TrackerResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MAX_SCORE: i32 = 10;
pub const MAX_PRODUCTIVITY: i32 = 100;

const UPDATE_DENIED: &str = "You can only update your own tasks";
const DELETE_DENIED: &str = "You can only delete your own tasks";

pub struct TaskInput {
    /// Weekday name of `date` when absent or blank.
    pub day: Option<String>,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `pending` when absent.
    pub status: Option<String>,
    pub score: i32,
    pub productivity_score: i32,
    pub content: TaskContent,
}

impl TaskInput {
    fn into_draft(self) -> TrackerResult<TaskDraft> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?
            .unwrap_or_default();

        if !(0..=MAX_SCORE).contains(&self.score) {
            return Err(TrackerError::validation(format!(
                "Score must be between 0 and {MAX_SCORE}"
            )));
        }
        if !(0..=MAX_PRODUCTIVITY).contains(&self.productivity_score) {
            return Err(TrackerError::validation(format!(
                "Productivity score must be between 0 and {MAX_PRODUCTIVITY}"
            )));
        }
        if self.end_time < self.start_time {
            return Err(TrackerError::validation(
                "End time must not be before start time",
            ));
        }
        if let Some(list) = self.content.blank_list() {
            return Err(TrackerError::validation(format!(
                "Entries in {list} must not be empty"
            )));
        }

        let day = self
            .day
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| weekday_name(self.date).to_owned());

        Ok(TaskDraft {
            day,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status,
            score: self.score,
            productivity_score: self.productivity_score,
            content: self.content,
        })
    }
}

/// Parse a `YYYY-MM-DD` path segment.
pub fn parse_task_date(raw: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| TrackerError::validation("Date must be in YYYY-MM-DD format"))
}

pub struct DailyTaskService<S> {
    store: Arc<S>,
    ownership: OwnershipPolicy,
}

impl<S> DailyTaskService<S>
where
    S: DailyTaskRepository,
{
    pub fn new(store: Arc<S>, ownership: OwnershipPolicy) -> Self {
        Self { store, ownership }
    }

    pub async fn create(
        &self,
        identity: &AuthenticatedIdentity,
        input: TaskInput,
    ) -> TrackerResult<DailyTask> {
        let draft = input.into_draft()?;
        let task = self.store.insert_task(identity.id, &draft).await?;
        tracing::info!(task_id = %task.id, account_id = %identity.id, "Task created");
        Ok(task)
    }

    /// Only the caller's own tasks, whatever their role.
    pub async fn for_date(
        &self,
        identity: &AuthenticatedIdentity,
        date: NaiveDate,
    ) -> TrackerResult<Vec<DailyTask>> {
        let tasks = self
            .store
            .list_tasks_by_owner_and_date(identity.id, date)
            .await?;
        tracing::info!(
            account_id = %identity.id,
            date = %date,
            count = tasks.len(),
            "Tasks retrieved"
        );
        Ok(tasks)
    }

    /// The owner is preserved; with the admin bypass it may differ from the caller.
    pub async fn update(
        &self,
        identity: &AuthenticatedIdentity,
        id: TaskId,
        input: TaskInput,
    ) -> TrackerResult<DailyTask> {
        let existing = self.load(id).await?;
        ensure_owner(identity, existing.user_id, self.ownership, UPDATE_DENIED)?;

        let draft = input.into_draft()?;
        let task = self
            .store
            .replace_task(id, existing.user_id, &draft)
            .await?
            .ok_or(TrackerError::NotFound("Task"))?;
        tracing::info!(task_id = %id, account_id = %identity.id, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, identity: &AuthenticatedIdentity, id: TaskId) -> TrackerResult<()> {
        let existing = self.load(id).await?;
        ensure_owner(identity, existing.user_id, self.ownership, DELETE_DENIED)?;

        if !self.store.delete_task(id).await? {
            return Err(TrackerError::NotFound("Task"));
        }
        tracing::info!(task_id = %id, account_id = %identity.id, "Task deleted");
        Ok(())
    }

    async fn load(&self, id: TaskId) -> TrackerResult<DailyTask> {
        self.store
            .find_task(id)
            .await?
            .ok_or(TrackerError::NotFound("Task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryTrackerStore;
    use crate::tests::fixtures;
    use auth::Role;
    use kernel::ErrorKind;

    fn service(policy: OwnershipPolicy) -> DailyTaskService<MemoryTrackerStore> {
        DailyTaskService::new(Arc::new(MemoryTrackerStore::new()), policy)
    }

    #[tokio::test]
    async fn test_create_sets_owner_and_defaults() {
        let service = service(OwnershipPolicy::STRICT);
        let alice = fixtures::identity(1, Role::User);

        let task = service.create(&alice, fixtures::task_input()).await.unwrap();
        assert_eq!(task.user_id, alice.id);
        assert_eq!(task.day, "Monday");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.content.deliverables[0].task_id, task.id.value());
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let service = service(OwnershipPolicy::STRICT);
        let alice = fixtures::identity(1, Role::User);

        let mut input = fixtures::task_input();
        input.score = 11;
        assert!(matches!(
            service.create(&alice, input).await,
            Err(TrackerError::Validation(_))
        ));

        let mut input = fixtures::task_input();
        input.productivity_score = -1;
        assert!(service.create(&alice, input).await.is_err());

        let mut input = fixtures::task_input();
        input.end_time = input.start_time - chrono::Duration::minutes(1);
        assert!(service.create(&alice, input).await.is_err());

        let mut input = fixtures::task_input();
        input.status = Some("done".into());
        assert!(service.create(&alice, input).await.is_err());

        let mut input = fixtures::task_input();
        input.end_time = input.start_time;
        assert!(service.create(&alice, input).await.is_ok());
    }

    #[tokio::test]
    async fn test_for_date_is_scoped_to_caller() {
        let service = service(OwnershipPolicy::STRICT);
        let alice = fixtures::identity(1, Role::User);
        let bob = fixtures::identity(2, Role::User);

        service.create(&alice, fixtures::task_input()).await.unwrap();
        service.create(&bob, fixtures::task_input()).await.unwrap();

        let date = fixtures::task_date();
        let mine = service.for_date(&alice, date).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|t| t.user_id == alice.id));

        let other_day = date.succ_opt().unwrap();
        assert!(service.for_date(&alice, other_day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_foreign_task_is_forbidden() {
        let service = service(OwnershipPolicy::STRICT);
        let alice = fixtures::identity(1, Role::User);
        let bob = fixtures::identity(2, Role::User);
        let task = service.create(&bob, fixtures::task_input()).await.unwrap();

        let err = service
            .update(&alice, task.id, fixtures::task_input())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_app_error().message(), UPDATE_DENIED);

        let err = service.delete(&alice, task.id).await.unwrap_err();
        assert_eq!(err.to_app_error().message(), DELETE_DENIED);
    }

    #[tokio::test]
    async fn test_admin_bypass_is_opt_in() {
        let bob = fixtures::identity(2, Role::User);
        let admin = fixtures::identity(9, Role::Admin);

        let strict = service(OwnershipPolicy::STRICT);
        let task = strict.create(&bob, fixtures::task_input()).await.unwrap();
        assert!(strict.delete(&admin, task.id).await.is_err());

        let relaxed = service(OwnershipPolicy { admin_bypass: true });
        let task = relaxed.create(&bob, fixtures::task_input()).await.unwrap();
        let mut input = fixtures::task_input();
        input.status = Some("completed".into());
        let updated = relaxed.update(&admin, task.id, input).await.unwrap();
        assert_eq!(updated.user_id, bob.id);
        assert_eq!(updated.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_task() {
        let service = service(OwnershipPolicy::STRICT);
        let alice = fixtures::identity(1, Role::User);
        assert!(matches!(
            service.delete(&alice, TaskId::new(404)).await,
            Err(TrackerError::NotFound("Task"))
        ));
    }

    #[test]
    fn test_parse_task_date() {
        assert_eq!(
            parse_task_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_task_date("15/01/2024").is_err());
        assert!(parse_task_date("2024-02-30").is_err());
    }
}
