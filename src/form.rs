//! Entry forms: the editable state behind the "new" and "edit" modals.
//!
//! A form holds raw user input, validates required fields before anything
//! reaches a service, and turns itself into a draft (create) or a full patch
//! (edit).

use std::collections::BTreeMap;

use crate::client::{Client, ClientDraft, ClientPatch};
use crate::fields::{parse_due_input, Priority};
use crate::project::{Project, ProjectDraft, ProjectPatch};
use crate::record::Record;
use crate::task::{Task, TaskDraft, TaskPatch};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }
}

/// A form that produces create and update input for one record type.
pub trait EntityForm {
    type Record: Record;

    /// Recompute errors. `true` when the form may be submitted.
    fn validate(&mut self) -> bool;

    fn errors(&self) -> &FormErrors;

    fn draft(&self) -> <Self::Record as Record>::Draft;

    /// Every field of the form, for overwriting an existing record.
    fn patch(&self) -> <Self::Record as Record>::Patch;
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

fn trimmed(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// Draft for the task manager's one-line quick add. `None` for blank input.
pub fn quick_draft(input: &str) -> Option<TaskDraft> {
    trimmed(input).map(TaskDraft::titled)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Due,
    Category,
    Project,
}

impl TaskField {
    fn key(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Due => "due_date",
            TaskField::Category => "category",
            TaskField::Project => "project",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// Raw due date input: "tomorrow", "in 3d", "2024-01-05", or empty.
    pub due: String,
    pub priority: Priority,
    pub category: String,
    pub project: String,
    errors: FormErrors,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone(),
            due: task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            priority: task.priority,
            category: task.category.clone(),
            project: task.project.clone(),
            errors: FormErrors::default(),
        }
    }

    /// Replace one field and drop its pending error.
    pub fn edit(&mut self, field: TaskField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TaskField::Title => self.title = value,
            TaskField::Description => self.description = value,
            TaskField::Due => self.due = value,
            TaskField::Category => self.category = value,
            TaskField::Project => self.project = value,
        }
        self.errors.clear(field.key());
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }
}

impl EntityForm for TaskForm {
    type Record = Task;

    fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        if !required(&self.title) {
            self.errors.set(TaskField::Title.key(), "Title is required");
        }
        if required(&self.due) && parse_due_input(&self.due).is_none() {
            self.errors.set(TaskField::Due.key(), format!("Unrecognised due date '{}'", self.due.trim()));
        }
        self.errors.is_empty()
    }

    fn errors(&self) -> &FormErrors {
        &self.errors
    }

    fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.trim().to_string(),
            description: trimmed(&self.description),
            due_date: parse_due_input(&self.due),
            priority: Some(self.priority),
            category: trimmed(&self.category),
            project: trimmed(&self.project),
        }
    }

    fn patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            due_date: Some(parse_due_input(&self.due)),
            priority: Some(self.priority),
            category: trimmed(&self.category),
            project: trimmed(&self.project),
            completed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectField {
    Name,
    Description,
    Tags,
}

impl ProjectField {
    fn key(self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Description => "description",
            ProjectField::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub tags: String,
    errors: FormErrors,
}

impl ProjectForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_project(project: &Project) -> Self {
        ProjectForm {
            name: project.name.clone(),
            description: project.description.clone(),
            tags: project.tags.clone(),
            errors: FormErrors::default(),
        }
    }

    pub fn edit(&mut self, field: ProjectField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProjectField::Name => self.name = value,
            ProjectField::Description => self.description = value,
            ProjectField::Tags => self.tags = value,
        }
        self.errors.clear(field.key());
    }
}

impl EntityForm for ProjectForm {
    type Record = Project;

    fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        if !required(&self.name) {
            self.errors.set(ProjectField::Name.key(), "Project name is required");
        }
        self.errors.is_empty()
    }

    fn errors(&self) -> &FormErrors {
        &self.errors
    }

    fn draft(&self) -> ProjectDraft {
        ProjectDraft {
            name: self.name.trim().to_string(),
            description: trimmed(&self.description),
            tags: trimmed(&self.tags),
        }
    }

    fn patch(&self) -> ProjectPatch {
        ProjectPatch {
            name: Some(self.name.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            tags: Some(self.tags.trim().to_string()),
        }
    }
}

/// Client entry. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub tags: String,
    errors: FormErrors,
}

impl ClientForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: &Client) -> Self {
        ClientForm {
            name: client.name.clone(),
            email: client.contact.email.clone(),
            phone: client.contact.phone.clone(),
            company: client.contact.company.clone(),
            tags: client.tags.clone(),
            errors: FormErrors::default(),
        }
    }
}

impl EntityForm for ClientForm {
    type Record = Client;

    fn validate(&mut self) -> bool {
        true
    }

    fn errors(&self) -> &FormErrors {
        &self.errors
    }

    fn draft(&self) -> ClientDraft {
        ClientDraft {
            name: self.name.trim().to_string(),
            email: trimmed(&self.email),
            phone: trimmed(&self.phone),
            company: trimmed(&self.company),
            tags: trimmed(&self.tags),
        }
    }

    fn patch(&self) -> ClientPatch {
        ClientPatch {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            phone: Some(self.phone.trim().to_string()),
            company: Some(self.company.trim().to_string()),
            tags: Some(self.tags.trim().to_string()),
        }
    }
}
