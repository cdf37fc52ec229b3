//! Task record and related functionality.
//!
//! This module defines the `Task` struct, its create/update inputs, and how
//! it maps onto a row of the remote `tasks_c` table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::StoreResult;
use crate::fields::{lenient_date, Priority};
use crate::record::Record;
use crate::remote::RemoteRecord;

pub const DEFAULT_CATEGORY: &str = "personal";
pub const DEFAULT_PROJECT: &str = "General";

/// A single to-do item.
///
/// `completed_at` is `Some` exactly when `completed` is true; every code path
/// that changes `completed` goes through [`Task::set_completed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Missing timestamps read as the Unix epoch.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

/// Fields accepted when creating a task. Only `title` is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Default::default() }
    }
}

/// Partial update for a task.
///
/// `due_date` is doubly optional: `None` leaves it alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "patch_due_date")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

fn patch_due_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<NaiveDate>>, D::Error> {
    lenient_date::deserialize(d).map(Some)
}

/// Trim `value` and fall back to `default` when nothing is left.
fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Task {
    /// Move the completion flag, keeping `completed_at` in step.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed == self.completed && completed == self.completed_at.is_some() {
            return;
        }
        self.completed = completed;
        self.completed_at = if completed { Some(now) } else { None };
    }

    /// Restore the completion invariant on records read from outside.
    pub fn repair_completion(&mut self) {
        self.updated_at = self.updated_at.max(self.created_at);
        match (self.completed, self.completed_at) {
            (true, None) => self.completed_at = Some(self.updated_at),
            (false, Some(_)) => self.completed_at = None,
            _ => {}
        }
    }
}

impl Record for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const LABEL: &'static str = "Task";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            due_date: draft.due_date,
            priority: draft.priority.unwrap_or_default(),
            category: or_default(draft.category, DEFAULT_CATEGORY),
            project: or_default(draft.project, DEFAULT_PROJECT),
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title { self.title = title.trim().to_string(); }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(due) = patch.due_date { self.due_date = due; }
        if let Some(priority) = patch.priority { self.priority = priority; }
        if let Some(category) = patch.category { self.category = or_default(Some(category), DEFAULT_CATEGORY); }
        if let Some(project) = patch.project { self.project = or_default(Some(project), DEFAULT_PROJECT); }
        if let Some(completed) = patch.completed { self.set_completed(completed, now); }
        self.updated_at = now;
    }
}

/// Row shape of the remote `tasks_c` table.
#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(default)]
    title_c: Option<String>,
    #[serde(default)]
    description_c: Option<String>,
    #[serde(default, with = "lenient_date")]
    due_date_c: Option<NaiveDate>,
    #[serde(default)]
    priority_c: Option<Priority>,
    #[serde(default)]
    category_c: Option<String>,
    #[serde(default)]
    project_c: Option<String>,
    #[serde(default)]
    completed_c: Option<bool>,
    #[serde(default)]
    completed_at_c: Option<DateTime<Utc>>,
    #[serde(rename = "CreatedOn", default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    modified_on: Option<DateTime<Utc>>,
}

impl RemoteRecord for Task {
    const TABLE: &'static str = "tasks_c";
    const FIELDS: &'static [&'static str] = &[
        "title_c", "description_c", "due_date_c", "priority_c", "category_c",
        "project_c", "completed_c", "completed_at_c", "CreatedOn", "ModifiedOn",
    ];

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: TaskRow = serde_json::from_value(row)?;
        let created_at = row.created_on.unwrap_or_default();
        let mut task = Task {
            id: row.id,
            title: row.title_c.unwrap_or_default(),
            description: row.description_c.unwrap_or_default(),
            due_date: row.due_date_c,
            priority: row.priority_c.unwrap_or_default(),
            category: or_default(row.category_c, DEFAULT_CATEGORY),
            project: or_default(row.project_c, DEFAULT_PROJECT),
            completed: row.completed_c.unwrap_or(false),
            completed_at: row.completed_at_c,
            created_at,
            updated_at: row.modified_on.unwrap_or(created_at),
        };
        task.repair_completion();
        Ok(task)
    }

    fn to_row(&self) -> Value {
        json!({
            "title_c": self.title,
            "description_c": self.description,
            "due_date_c": self.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            "priority_c": self.priority,
            "category_c": self.category,
            "project_c": self.project,
            "completed_c": self.completed,
            "completed_at_c": self.completed_at,
        })
    }
}
