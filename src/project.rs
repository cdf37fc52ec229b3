//! Project records for the project portfolio page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreResult;
use crate::record::{split_tags, Record};
use crate::remote::RemoteRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "Id")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Project {
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Record for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    const LABEL: &'static str = "Project";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: ProjectDraft, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: draft.name.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            tags: draft.tags.unwrap_or_default(),
            created_on: Some(now),
            modified_on: Some(now),
        }
    }

    fn apply(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(tags) = patch.tags { self.tags = tags; }
        self.modified_on = Some(now);
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(default)]
    name_c: Option<String>,
    #[serde(default)]
    description_c: Option<String>,
    #[serde(rename = "Tags", default)]
    tags: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    modified_on: Option<DateTime<Utc>>,
}

impl RemoteRecord for Project {
    const TABLE: &'static str = "projects_c";
    const FIELDS: &'static [&'static str] =
        &["name_c", "description_c", "Tags", "CreatedOn", "ModifiedOn"];

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: ProjectRow = serde_json::from_value(row)?;
        Ok(Project {
            id: row.id,
            name: row.name_c.unwrap_or_default(),
            description: row.description_c.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            created_on: row.created_on,
            modified_on: row.modified_on,
        })
    }

    fn to_row(&self) -> Value {
        json!({
            "name_c": self.name,
            "description_c": self.description,
            "Tags": self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_stamps_creation() {
        let now = Utc::now();
        let draft = ProjectDraft { name: " Website Redesign ".into(), ..Default::default() };
        let project = Project::from_draft(5, draft, now);
        assert_eq!(project.name, "Website Redesign");
        assert_eq!(project.created_on, Some(now));
        assert_eq!(project.description, "");
    }

    #[test]
    fn remote_row_without_timestamps() {
        let project = Project::from_row(json!({
            "Id": 2, "name_c": "Q1 Campaign", "Tags": "marketing, q1"
        }))
        .unwrap();
        assert_eq!(project.tag_list(), vec!["marketing", "q1"]);
        assert_eq!(project.created_on, None);
    }
}
