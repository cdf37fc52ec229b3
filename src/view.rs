//! Derived views: filtered, sorted projections of a loaded collection.
//!
//! Everything here is a pure function of the collection and the page's
//! query. Results borrow from the source slice, which is never reordered or
//! modified.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::category::Category;
use crate::client::Client;
use crate::fields::{DirectorySort, TaskSort};
use crate::project::Project;
use crate::record::{has_tag, split_tags, Record};
use crate::task::Task;

/// Task list inputs owned by the task manager page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: String,
    /// Exact category name; `None` shows every category.
    pub category: Option<String>,
    pub sort: TaskSort,
    /// Show the completed partition instead of the active one.
    pub show_completed: bool,
}

/// Client/project list inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryQuery {
    pub search: String,
    pub tag: Option<String>,
    pub sort: DirectorySort,
}

/// Case-insensitive substring test; `needle` must already be lowercase.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// Case-insensitive ordering with a case-sensitive tie-break, so the result is total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub fn derive_tasks<'a>(tasks: &'a [Task], query: &TaskQuery) -> Vec<&'a Task> {
    let needle = query.search.trim().to_lowercase();
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.completed == query.show_completed)
        .filter(|t| match &query.category {
            Some(c) => &t.category == c,
            None => true,
        })
        .filter(|t| {
            contains_ci(&t.title, &needle)
                || contains_ci(&t.description, &needle)
                || contains_ci(&t.project, &needle)
        })
        .collect();
    sort_tasks(&mut view, query.sort);
    view
}

pub fn sort_tasks(tasks: &mut [&Task], sort: TaskSort) {
    match sort {
        TaskSort::CreatedAt => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        // `None` sorts after every date.
        TaskSort::DueDate => tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
        TaskSort::Priority => tasks.sort_by_key(|t| t.priority.rank()),
        TaskSort::Title => tasks.sort_by(|a, b| compare_text(&a.title, &b.title)),
    }
}

/// Active and completed totals over the whole collection, ignoring filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
}

pub fn task_counts(tasks: &[Task]) -> TaskCounts {
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskCounts { active: tasks.len() - completed, completed }
}

/// Number of tasks referencing each category by name.
pub fn category_counts<'a>(categories: &'a [Category], tasks: &[Task]) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|c| (c, tasks.iter().filter(|t| t.category == c.name).count()))
        .collect()
}

/// A record listed on a searchable, tag-filtered directory page.
pub trait DirectoryEntry: Record {
    fn name(&self) -> &str;
    fn tags(&self) -> &str;
    fn created_on(&self) -> Option<DateTime<Utc>>;
    /// Fields the text search looks at.
    fn search_fields(&self) -> Vec<&str>;
}

impl DirectoryEntry for Client {
    fn name(&self) -> &str {
        &self.name
    }
    fn tags(&self) -> &str {
        &self.tags
    }
    fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.contact.email.as_str(),
            self.contact.phone.as_str(),
            self.contact.company.as_str(),
        ]
    }
}

impl DirectoryEntry for Project {
    fn name(&self) -> &str {
        &self.name
    }
    fn tags(&self) -> &str {
        &self.tags
    }
    fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }
}

pub fn derive_directory<'a, R: DirectoryEntry>(records: &'a [R], query: &DirectoryQuery) -> Vec<&'a R> {
    let needle = query.search.trim().to_lowercase();
    let mut view: Vec<&R> = records
        .iter()
        .filter(|r| match &query.tag {
            Some(tag) => has_tag(r.tags(), tag),
            None => true,
        })
        .filter(|r| r.search_fields().into_iter().any(|f| contains_ci(f, &needle)))
        .collect();
    match query.sort {
        // Missing timestamps count as the epoch, i.e. oldest.
        DirectorySort::CreatedAt => view.sort_by(|a, b| {
            b.created_on().unwrap_or_default().cmp(&a.created_on().unwrap_or_default())
        }),
        DirectorySort::Name => view.sort_by(|a, b| compare_text(a.name(), b.name())),
    }
    view
}

/// Every distinct tag across `records`, in first-seen order.
pub fn distinct_tags<R: DirectoryEntry>(records: &[R]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for record in records {
        for tag in split_tags(record.tags()) {
            if seen.insert(tag) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ContactInfo;
    use crate::fields::Priority;
    use crate::task::TaskDraft;
    use chrono::{NaiveDate, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
    }

    fn task(id: u64, title: &str, created: u32) -> Task {
        Task::from_draft(id, TaskDraft::titled(title), at(created))
    }

    fn sample() -> Vec<Task> {
        let mut a = task(1, "write Report", 1);
        a.description = "quarterly numbers".into();
        a.category = "work".into();
        a.priority = Priority::Low;
        let mut b = task(2, "Buy milk", 3);
        b.category = "personal".into();
        b.priority = Priority::High;
        let mut c = task(3, "call plumber", 2);
        c.project = "House".into();
        c.category = "personal".into();
        let mut d = task(4, "File taxes", 4);
        d.set_completed(true, at(5));
        vec![a, b, c, d]
    }

    fn ids(view: &[&Task]) -> Vec<u64> {
        view.iter().map(|t| t.id).collect()
    }

    #[test]
    fn default_query_keeps_the_whole_active_partition() {
        let tasks = sample();
        let view = derive_tasks(&tasks, &TaskQuery::default());
        assert_eq!(ids(&view), vec![2, 3, 1]);
        let done = derive_tasks(&tasks, &TaskQuery { show_completed: true, ..Default::default() });
        assert_eq!(ids(&done), vec![4]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let tasks = sample();
        let q = |s: &str| TaskQuery { search: s.into(), ..Default::default() };
        assert_eq!(ids(&derive_tasks(&tasks, &q("REPORT"))), vec![1]);
        assert_eq!(ids(&derive_tasks(&tasks, &q("quarterly"))), vec![1]);
        assert_eq!(ids(&derive_tasks(&tasks, &q("house"))), vec![3]);
        assert!(derive_tasks(&tasks, &q("nothing like this")).is_empty());
    }

    #[test]
    fn category_filter_is_exact() {
        let tasks = sample();
        let q = TaskQuery { category: Some("personal".into()), ..Default::default() };
        assert_eq!(ids(&derive_tasks(&tasks, &q)), vec![2, 3]);
        let q = TaskQuery { category: Some("Personal".into()), ..Default::default() };
        assert!(derive_tasks(&tasks, &q).is_empty());
    }

    #[test]
    fn priority_sort_is_high_medium_low() {
        let tasks = sample();
        let q = TaskQuery { sort: TaskSort::Priority, ..Default::default() };
        assert_eq!(ids(&derive_tasks(&tasks, &q)), vec![2, 3, 1]);
    }

    #[test]
    fn title_sort_is_non_decreasing() {
        let tasks = sample();
        let q = TaskQuery { sort: TaskSort::Title, ..Default::default() };
        let view = derive_tasks(&tasks, &q);
        assert_eq!(ids(&view), vec![2, 3, 1]);
        assert!(view.windows(2).all(|w| compare_text(&w[0].title, &w[1].title) != Ordering::Greater));
    }

    #[test]
    fn due_date_sort_puts_undated_last() {
        let mut tasks = vec![task(1, "a", 1), task(2, "b", 1), task(3, "c", 1)];
        tasks[0].due_date = NaiveDate::from_ymd_opt(2024, 1, 10);
        tasks[1].due_date = NaiveDate::from_ymd_opt(2024, 1, 5);
        let q = TaskQuery { sort: TaskSort::DueDate, ..Default::default() };
        let view = derive_tasks(&tasks, &q);
        assert_eq!(ids(&view), vec![2, 1, 3]);
        let first_none = view.iter().position(|t| t.due_date.is_none()).unwrap();
        assert!(view[first_none..].iter().all(|t| t.due_date.is_none()));
    }

    #[test]
    fn source_is_left_untouched() {
        let tasks = sample();
        let before = tasks.clone();
        let q = TaskQuery { sort: TaskSort::Title, search: "l".into(), ..Default::default() };
        let _ = derive_tasks(&tasks, &q);
        assert_eq!(tasks, before);
    }

    #[test]
    fn counts_ignore_filters() {
        let tasks = sample();
        assert_eq!(task_counts(&tasks), TaskCounts { active: 3, completed: 1 });
        let cats = vec![
            Category { id: 1, name: "personal".into(), color: "#0f0".into(), task_count: 0 },
            Category { id: 2, name: "errands".into(), color: "#00f".into(), task_count: 9 },
        ];
        let counts: Vec<usize> = category_counts(&cats, &tasks).into_iter().map(|(_, n)| n).collect();
        assert_eq!(counts, vec![3, 0]);
    }

    fn client(id: u64, name: &str, email: &str, tags: &str, created: Option<u32>) -> Client {
        Client {
            id,
            name: name.into(),
            contact: ContactInfo { email: email.into(), ..Default::default() },
            tags: tags.into(),
            created_on: created.map(at),
            modified_on: None,
        }
    }

    fn directory() -> Vec<Client> {
        vec![
            client(1, "beta labs", "hi@beta.test", "vip, research", Some(2)),
            client(2, "Acme", "ops@acme.test", "retail", None),
            client(3, "Zenith", "z@zenith.test", " vip ", Some(5)),
        ]
    }

    #[test]
    fn client_search_reads_contact_info() {
        let clients = directory();
        let q = DirectoryQuery { search: "ACME.TEST".into(), ..Default::default() };
        let view = derive_directory(&clients, &q);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 2);
    }

    #[test]
    fn tag_filter_uses_parsed_tags() {
        let clients = directory();
        let q = DirectoryQuery { tag: Some("vip".into()), ..Default::default() };
        let ids: Vec<u64> = derive_directory(&clients, &q).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn directory_sorts() {
        let clients = directory();
        let newest: Vec<u64> = derive_directory(&clients, &DirectoryQuery::default())
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(newest, vec![3, 1, 2]);
        let q = DirectoryQuery { sort: DirectorySort::Name, ..Default::default() };
        let by_name: Vec<u64> = derive_directory(&clients, &q).iter().map(|c| c.id).collect();
        assert_eq!(by_name, vec![2, 1, 3]);
    }

    #[test]
    fn distinct_tags_in_first_seen_order() {
        assert_eq!(distinct_tags(&directory()), vec!["vip", "research", "retail"]);
        let projects = vec![Project {
            id: 1,
            name: "Site".into(),
            description: String::new(),
            tags: "web,, web ,design".into(),
            created_on: None,
            modified_on: None,
        }];
        assert_eq!(distinct_tags(&projects), vec!["web", "design"]);
    }
}
