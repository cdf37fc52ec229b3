//! Task categories shown as filter chips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreResult;
use crate::record::Record;
use crate::remote::RemoteRecord;

pub const DEFAULT_COLOR: &str = "#6366F1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "Id")]
    pub id: u64,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub task_count: u32,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub task_count: Option<u32>,
}

impl Record for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const LABEL: &'static str = "Category";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: CategoryDraft, _now: DateTime<Utc>) -> Self {
        Category {
            id,
            name: draft.name.trim().to_string(),
            color: draft.color.unwrap_or_else(default_color),
            task_count: 0,
        }
    }

    // Categories carry no timestamps.
    fn apply(&mut self, patch: CategoryPatch, _now: DateTime<Utc>) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(color) = patch.color { self.color = color; }
        if let Some(count) = patch.task_count { self.task_count = count; }
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(default)]
    name_c: Option<String>,
    #[serde(default)]
    color_c: Option<String>,
    #[serde(default)]
    task_count_c: Option<u32>,
}

impl RemoteRecord for Category {
    const TABLE: &'static str = "categories_c";
    const FIELDS: &'static [&'static str] = &["name_c", "color_c", "task_count_c"];

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: CategoryRow = serde_json::from_value(row)?;
        Ok(Category {
            id: row.id,
            name: row.name_c.unwrap_or_default(),
            color: row.color_c.unwrap_or_else(default_color),
            task_count: row.task_count_c.unwrap_or(0),
        })
    }

    fn to_row(&self) -> Value {
        json!({
            "name_c": self.name,
            "color_c": self.color,
            "task_count_c": self.task_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_category_starts_with_zero_tasks() {
        let draft = CategoryDraft { name: " work ".into(), color: None };
        let cat = Category::from_draft(3, draft, Utc::now());
        assert_eq!(cat.name, "work");
        assert_eq!(cat.color, DEFAULT_COLOR);
        assert_eq!(cat.task_count, 0);
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let mut cat = Category { id: 1, name: "work".into(), color: "#000".into(), task_count: 4 };
        cat.apply(CategoryPatch { color: Some("#fff".into()), ..Default::default() }, Utc::now());
        assert_eq!(cat, Category { id: 1, name: "work".into(), color: "#fff".into(), task_count: 4 });
    }
}
