//! Page controllers.
//!
//! A controller owns one page's loaded records and UI state, derives the
//! visible list on demand, and reconciles its local copy after each
//! successful service call. Failures leave the local copy untouched; the
//! service has already reported them. A failed load is also kept in
//! [`LoadState::Failed`] until the next `load()` succeeds.

use crate::category::Category;
use crate::client::Client;
use crate::fields::{DirectorySort, TaskSort};
use crate::form::{quick_draft, EntityForm, TaskForm};
use crate::notice::Notices;
use crate::project::Project;
use crate::record::Record;
use crate::service::{CategoryService, EntityService, TaskService};
use crate::task::Task;
use crate::view::{
    category_counts, derive_directory, derive_tasks, distinct_tags, task_counts, DirectoryEntry,
    DirectoryQuery, TaskCounts, TaskQuery,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    /// The last load could not reach the store. Holds the reported message.
    Failed(String),
}

impl LoadState {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }
}

/// Which entry modal is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    New,
    Editing(u64),
}

fn replace_by_id<R: Record>(records: &mut [R], updated: R) {
    if let Some(slot) = records.iter_mut().find(|r| r.id() == updated.id()) {
        *slot = updated;
    }
}

pub struct TaskManager {
    tasks_service: TaskService,
    categories_service: CategoryService,
    notices: Notices,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    state: LoadState,
    query: TaskQuery,
    modal: Modal,
    celebrate: bool,
}

impl TaskManager {
    pub fn new(tasks_service: TaskService, categories_service: CategoryService, notices: Notices) -> Self {
        TaskManager {
            tasks_service,
            categories_service,
            notices,
            tasks: Vec::new(),
            categories: Vec::new(),
            state: LoadState::Loading,
            query: TaskQuery::default(),
            modal: Modal::Closed,
            celebrate: false,
        }
    }

    /// Fetch tasks and categories together. Calling it again is the retry.
    pub async fn load(&mut self) {
        self.state = LoadState::Loading;
        let (tasks, categories) =
            tokio::join!(self.tasks_service.try_get_all(), self.categories_service.try_get_all());
        let mut failure = None;
        match tasks {
            Ok(tasks) => self.tasks = tasks,
            Err(message) => failure = Some(message),
        }
        match categories {
            Ok(categories) => self.categories = categories,
            Err(message) => failure = failure.or(Some(message)),
        }
        tracing::debug!(
            tasks = self.tasks.len(),
            categories = self.categories.len(),
            failed = failure.is_some(),
            "task manager loaded"
        );
        self.state = failure.map_or(LoadState::Ready, LoadState::Failed);
    }

    pub fn state(&self) -> LoadState {
        self.state.clone()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Create a task from a bare title. Blank input does nothing.
    pub async fn quick_add(&mut self, input: &str) -> Option<Task> {
        let draft = quick_draft(input)?;
        let created = self.tasks_service.create(draft).await?;
        self.tasks.insert(0, created.clone());
        self.notices.success("Task created!");
        Some(created)
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn open_new(&mut self) -> TaskForm {
        self.modal = Modal::New;
        TaskForm::new()
    }

    /// Open the edit modal prefilled from a loaded task.
    pub fn open_edit(&mut self, id: u64) -> Option<TaskForm> {
        let form = TaskForm::from_task(self.task(id)?);
        self.modal = Modal::Editing(id);
        Some(form)
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    /// Submit the open modal. Invalid forms keep the modal open with their errors set.
    pub async fn save(&mut self, form: &mut TaskForm) -> Option<Task> {
        if !form.validate() {
            return None;
        }
        let saved = match self.modal {
            Modal::Closed => return None,
            Modal::New => {
                let created = self.tasks_service.create(form.draft()).await?;
                self.tasks.insert(0, created.clone());
                self.notices.success("Task created!");
                created
            }
            Modal::Editing(id) => {
                let updated = self.tasks_service.update(id, form.patch()).await?;
                replace_by_id(&mut self.tasks, updated.clone());
                self.notices.success("Task updated!");
                updated
            }
        };
        self.modal = Modal::Closed;
        Some(saved)
    }

    /// Flip completion. Completing a task raises the celebration flag.
    pub async fn toggle_complete(&mut self, id: u64) -> Option<Task> {
        let toggled = self.tasks_service.toggle_complete(id).await?;
        replace_by_id(&mut self.tasks, toggled.clone());
        if toggled.completed {
            self.celebrate = true;
            self.notices.success("Task completed!");
        }
        Some(toggled)
    }

    pub async fn delete(&mut self, id: u64) -> bool {
        if !self.tasks_service.delete(id).await {
            return false;
        }
        self.tasks.retain(|t| t.id != id);
        self.notices.success("Task deleted");
        true
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.query.category = category;
    }

    pub fn set_sort(&mut self, sort: TaskSort) {
        self.query.sort = sort;
    }

    /// Tasks still to do under the current search, category and sort.
    pub fn active_view(&self) -> Vec<&Task> {
        derive_tasks(&self.tasks, &TaskQuery { show_completed: false, ..self.query.clone() })
    }

    pub fn completed_view(&self) -> Vec<&Task> {
        derive_tasks(&self.tasks, &TaskQuery { show_completed: true, ..self.query.clone() })
    }

    pub fn counts(&self) -> TaskCounts {
        task_counts(&self.tasks)
    }

    pub fn category_counts(&self) -> Vec<(&Category, usize)> {
        category_counts(&self.categories, &self.tasks)
    }

    /// Consume the celebration raised by the last completion, if any.
    pub fn take_celebration(&mut self) -> bool {
        std::mem::take(&mut self.celebrate)
    }
}

/// Searchable, tag-filtered listing used by the clients and projects pages.
pub struct DirectoryPage<R: DirectoryEntry> {
    service: EntityService<R>,
    notices: Notices,
    records: Vec<R>,
    state: LoadState,
    query: DirectoryQuery,
    modal: Modal,
}

pub type ClientsPage = DirectoryPage<Client>;
pub type ProjectsPage = DirectoryPage<Project>;

impl<R: DirectoryEntry> DirectoryPage<R> {
    pub fn new(service: EntityService<R>, notices: Notices) -> Self {
        DirectoryPage {
            service,
            notices,
            records: Vec::new(),
            state: LoadState::Loading,
            query: DirectoryQuery::default(),
            modal: Modal::Closed,
        }
    }

    /// Fetch the collection. Calling it again is the retry.
    pub async fn load(&mut self) {
        self.state = LoadState::Loading;
        self.state = match self.service.try_get_all().await {
            Ok(records) => {
                self.records = records;
                LoadState::Ready
            }
            Err(message) => LoadState::Failed(message),
        };
    }

    pub fn state(&self) -> LoadState {
        self.state.clone()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, id: u64) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn open_new(&mut self) {
        self.modal = Modal::New;
    }

    /// Open the edit modal for a loaded record. Returns it for prefilling the form.
    pub fn open_edit(&mut self, id: u64) -> Option<&R> {
        let pos = self.records.iter().position(|r| r.id() == id)?;
        self.modal = Modal::Editing(id);
        Some(&self.records[pos])
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    pub async fn save<F: EntityForm<Record = R>>(&mut self, form: &mut F) -> Option<R> {
        if !form.validate() {
            return None;
        }
        let label = R::LABEL;
        let saved = match self.modal {
            Modal::Closed => return None,
            Modal::New => {
                let created = self.service.create(form.draft()).await?;
                self.records.insert(0, created.clone());
                self.notices.success(format!("{label} created successfully"));
                created
            }
            Modal::Editing(id) => {
                let updated = self.service.update(id, form.patch()).await?;
                replace_by_id(&mut self.records, updated.clone());
                self.notices.success(format!("{label} updated successfully"));
                updated
            }
        };
        self.modal = Modal::Closed;
        Some(saved)
    }

    pub async fn delete(&mut self, id: u64) -> bool {
        if !self.service.delete(id).await {
            return false;
        }
        self.records.retain(|r| r.id() != id);
        self.notices.success(format!("{} deleted successfully", R::LABEL));
        true
    }

    pub fn query(&self) -> &DirectoryQuery {
        &self.query
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.query.tag = tag;
    }

    pub fn set_sort(&mut self, sort: DirectorySort) {
        self.query.sort = sort;
    }

    pub fn view(&self) -> Vec<&R> {
        derive_directory(&self.records, &self.query)
    }

    /// Filter chips: every tag in use, first-seen order.
    pub fn tags(&self) -> Vec<String> {
        distinct_tags(&self.records)
    }
}
