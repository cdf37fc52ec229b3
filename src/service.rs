//! Entity services: the CRUD facade page controllers talk to.
//!
//! One generic [`EntityService`] serves every entity. It never returns a
//! store error: failures are logged, reported to the notice sink, and turned
//! into an empty collection, an absent record, or `false`.

use std::sync::Arc;

use crate::category::Category;
use crate::client::Client;
use crate::error::StoreError;
use crate::notice::Notices;
use crate::project::Project;
use crate::record::Record;
use crate::store::RecordStore;
use crate::task::{Task, TaskPatch};

pub type TaskService = EntityService<Task>;
pub type CategoryService = EntityService<Category>;
pub type ClientService = EntityService<Client>;
pub type ProjectService = EntityService<Project>;

pub struct EntityService<R: Record> {
    store: Arc<dyn RecordStore<R>>,
    notices: Notices,
}

impl<R: Record> Clone for EntityService<R> {
    fn clone(&self) -> Self {
        EntityService { store: Arc::clone(&self.store), notices: self.notices.clone() }
    }
}

impl<R: Record> EntityService<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>, notices: Notices) -> Self {
        EntityService { store, notices }
    }

    /// Log and push a notice for `error`. Returns the notice text.
    fn report(&self, error: StoreError, action: &str) -> String {
        tracing::error!(record = R::LABEL, action, error = %error, "store operation failed");
        let message = match error {
            StoreError::Rejected(message) => message,
            _ => format!("Failed to {} {}", action, R::LABEL.to_lowercase()),
        };
        self.notices.error(message.clone());
        message
    }

    pub async fn get_all(&self) -> Vec<R> {
        self.try_get_all().await.unwrap_or_default()
    }

    /// Like [`get_all`](Self::get_all), but a failed load comes back as the
    /// reported message so callers can tell "empty" from "unreachable".
    pub async fn try_get_all(&self) -> Result<Vec<R>, String> {
        self.store.list().await.map_err(|error| self.report(error, "load"))
    }

    pub async fn get_by_id(&self, id: u64) -> Option<R> {
        match self.store.get(id).await {
            Ok(record) => record,
            Err(error) => {
                self.report(error, "fetch");
                None
            }
        }
    }

    pub async fn create(&self, draft: R::Draft) -> Option<R> {
        match self.store.insert(draft).await {
            Ok(record) => Some(record),
            Err(error) => {
                self.report(error, "create");
                None
            }
        }
    }

    pub async fn update(&self, id: u64, patch: R::Patch) -> Option<R> {
        match self.store.update(id, patch).await {
            Ok(record) => record,
            Err(error) => {
                self.report(error, "update");
                None
            }
        }
    }

    pub async fn delete(&self, id: u64) -> bool {
        match self.store.remove(id).await {
            Ok(removed) => removed,
            Err(error) => {
                self.report(error, "delete");
                false
            }
        }
    }
}

impl EntityService<Task> {
    /// Flip `completed`, setting or clearing `completed_at` with it.
    pub async fn toggle_complete(&self, id: u64) -> Option<Task> {
        let task = self.get_by_id(id).await?;
        let patch = TaskPatch { completed: Some(!task.completed), ..Default::default() };
        self.update(id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::store::{Latency, MemoryStore};
    use crate::task::TaskDraft;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn tasks() -> (TaskService, Notices) {
        let notices = Notices::default();
        let store: Arc<dyn RecordStore<Task>> = Arc::new(MemoryStore::new(Latency::NONE));
        (EntityService::new(store, notices.clone()), notices)
    }

    #[tokio::test]
    async fn buy_milk_round_trip() {
        let (svc, _) = tasks();
        let task = svc.create(TaskDraft::titled("Buy milk")).await.unwrap();
        assert!(!task.completed);

        let done = svc.toggle_complete(task.id).await.unwrap();
        assert!(done.completed);
        let completed_at = done.completed_at.unwrap();
        assert!(completed_at >= done.created_at);

        let reopened = svc.toggle_complete(task.id).await.unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_at, None);
        assert!(reopened.updated_at >= done.updated_at);
    }

    #[tokio::test]
    async fn toggle_keeps_completion_invariant_at_every_step() {
        let (svc, _) = tasks();
        let task = svc.create(TaskDraft::titled("x")).await.unwrap();
        let original = task.completed;
        let mut current = task;
        for step in 1..=6 {
            current = svc.toggle_complete(current.id).await.unwrap();
            assert_eq!(current.completed, current.completed_at.is_some());
            assert_eq!(current.completed, if step % 2 == 0 { original } else { !original });
        }
    }

    #[tokio::test]
    async fn unknown_ids_are_absent() {
        let (svc, notices) = tasks();
        svc.create(TaskDraft::titled("keep")).await.unwrap();
        let before = svc.get_all().await;
        assert!(svc.get_by_id(99).await.is_none());
        assert!(svc.update(99, TaskPatch::default()).await.is_none());
        assert!(svc.toggle_complete(99).await.is_none());
        assert!(!svc.delete(99).await);
        assert_eq!(svc.get_all().await, before);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_stamps() {
        let (svc, _) = tasks();
        let task = svc.create(TaskDraft::titled("Plan trip")).await.unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 1, 5);
        let updated = svc
            .update(task.id, TaskPatch { due_date: Some(due), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.due_date, due);
        assert_eq!(updated.title, "Plan trip");
        assert!(updated.updated_at >= task.updated_at);
    }

    struct DownStore;

    #[async_trait]
    impl RecordStore<Task> for DownStore {
        async fn list(&self) -> crate::error::StoreResult<Vec<Task>> {
            Err(StoreError::Transport("connection reset".into()))
        }
        async fn get(&self, _id: u64) -> crate::error::StoreResult<Option<Task>> {
            Err(StoreError::Transport("connection reset".into()))
        }
        async fn insert(&self, _draft: TaskDraft) -> crate::error::StoreResult<Task> {
            Err(StoreError::Rejected("Title: is required".into()))
        }
        async fn update(&self, _id: u64, _patch: TaskPatch) -> crate::error::StoreResult<Option<Task>> {
            Err(StoreError::Transport("connection reset".into()))
        }
        async fn remove(&self, _id: u64) -> crate::error::StoreResult<bool> {
            Err(StoreError::Transport("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_become_empty_results_and_notices() {
        let notices = Notices::default();
        let svc = EntityService::<Task>::new(Arc::new(DownStore), notices.clone());
        assert!(svc.get_all().await.is_empty());
        assert!(svc.create(TaskDraft::titled("x")).await.is_none());
        assert!(!svc.delete(1).await);
        let drained = notices.drain();
        assert!(drained.iter().all(|n| n.level == NoticeLevel::Error));
        let messages: Vec<&str> = drained.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["Failed to load task", "Title: is required", "Failed to delete task"]);
    }

    #[tokio::test]
    async fn try_get_all_returns_the_reported_message() {
        let notices = Notices::default();
        let svc = EntityService::<Task>::new(Arc::new(DownStore), notices.clone());
        assert_eq!(svc.try_get_all().await, Err("Failed to load task".to_string()));
        assert_eq!(notices.drain().len(), 1);

        let (svc, notices) = tasks();
        assert_eq!(svc.try_get_all().await, Ok(Vec::new()));
        assert!(notices.is_empty());
    }
}
