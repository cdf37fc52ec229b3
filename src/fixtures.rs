//! Seed data and the optional JSON data file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::client::Client;
use crate::project::Project;
use crate::record::Record;
use crate::task::Task;

const SEED: &str = include_str!("../fixtures/seed.json");

/// Every collection the in-memory backend is seeded from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Saved id high-water marks, so ids freed by deletion stay retired across runs.
    #[serde(default)]
    pub next_ids: NextIds,
}

/// Next identifier per collection. Zero means "derive from the records".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    #[serde(default)]
    pub tasks: u64,
    #[serde(default)]
    pub categories: u64,
    #[serde(default)]
    pub clients: u64,
    #[serde(default)]
    pub projects: u64,
}

fn reject_duplicate_ids<R: Record>(records: &[R]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            bail!("duplicate {} id {}", R::LABEL.to_lowercase(), record.id());
        }
    }
    Ok(())
}

impl Fixtures {
    /// The dataset compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(SEED).context("parsing built-in seed data")
    }

    fn parse(raw: &str) -> Result<Self> {
        let mut fixtures: Fixtures = serde_json::from_str(raw)?;
        reject_duplicate_ids(&fixtures.tasks)?;
        reject_duplicate_ids(&fixtures.categories)?;
        reject_duplicate_ids(&fixtures.clients)?;
        reject_duplicate_ids(&fixtures.projects)?;
        for task in &mut fixtures.tasks {
            task.repair_completion();
        }
        Ok(fixtures)
    }

    /// Read a data file. A missing file yields the built-in dataset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "data file not found, using built-in seed");
            return Self::builtin();
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading data file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing data file {}", path.display()))
    }

    /// Write to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, path).with_context(|| format!("replacing data file {}", path.display()))?;
        tracing::debug!(path = %path.display(), tasks = self.tasks.len(), "data file saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    #[test]
    fn builtin_seed_is_consistent() {
        let seed = Fixtures::builtin().unwrap();
        assert!(!seed.tasks.is_empty());
        assert!(seed.tasks.iter().all(|t| t.completed == t.completed_at.is_some()));
        assert!(!seed.categories.is_empty());
        let acme = &seed.clients[0];
        assert_eq!(acme.contact.email, "ops@acme.example");
        assert_eq!(acme.tag_list(), vec!["enterprise", "retail"]);
    }

    #[test]
    fn missing_file_falls_back_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Fixtures::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Fixtures::builtin().unwrap());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut data = Fixtures::builtin().unwrap();
        data.tasks.truncate(1);
        data.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(Fixtures::load(&path).unwrap(), data);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Fixtures::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing data file"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{"categories":[{"Id":1,"name":"a"},{"Id":1,"name":"b"}]}"#;
        let err = Fixtures::parse(raw).unwrap_err();
        assert_eq!(err.to_string(), "duplicate category id 1");
    }

    #[tokio::test]
    async fn deleted_ids_stay_retired_across_save_and_load() {
        use crate::backend::MemoryBackend;
        use crate::notice::Notices;
        use crate::store::Latency;
        use crate::task::TaskDraft;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let backend = MemoryBackend::from_fixtures(Fixtures::builtin().unwrap(), Latency::NONE);
        let services = backend.services(Notices::default());
        let doomed = services.tasks.create(TaskDraft::titled("Temporary")).await.unwrap();
        assert!(services.tasks.delete(doomed.id).await);
        backend.snapshot().await.save(&path).unwrap();

        let reloaded = Fixtures::load(&path).unwrap();
        assert_eq!(reloaded.next_ids.tasks, doomed.id + 1);
        let backend = MemoryBackend::from_fixtures(reloaded, Latency::NONE);
        let services = backend.services(Notices::default());
        let next = services.tasks.create(TaskDraft::titled("Fresh")).await.unwrap();
        assert_eq!(next.id, doomed.id + 1);
    }

    #[test]
    fn tasks_without_timestamps_still_load() {
        let raw = r#"{"tasks":[
            {"Id":1,"title":"bare"},
            {"Id":2,"title":"created only","createdAt":"2024-03-01T00:00:00Z"}]}"#;
        let fixtures = Fixtures::parse(raw).unwrap();
        let epoch = DateTime::<Utc>::default();
        assert_eq!(fixtures.tasks[0].created_at, epoch);
        assert_eq!(fixtures.tasks[0].updated_at, epoch);
        assert_eq!(fixtures.tasks[1].updated_at, fixtures.tasks[1].created_at);
    }

    #[test]
    fn completion_is_repaired_on_load() {
        let raw = r#"{"tasks":[{"Id":1,"title":"x","completed":true,
            "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z"}]}"#;
        let fixtures = Fixtures::parse(raw).unwrap();
        assert_eq!(fixtures.tasks[0].completed_at, Some(fixtures.tasks[0].updated_at));
        assert!(fixtures.clients.is_empty());
    }
}
