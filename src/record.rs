//! The record abstraction shared by every entity.
//!
//! Stores and services are generic over [`Record`]; each entity supplies its
//! create input (`Draft`), its partial update (`Patch`), and how those turn
//! into a full record.

use chrono::{DateTime, Utc};

/// One entity instance with a unique integer identifier.
pub trait Record: Clone + Send + Sync + 'static {
    /// Fields accepted on create. Omitted optionals get entity defaults.
    type Draft: Send + 'static;
    /// Partial update. Absent fields leave the record untouched.
    type Patch: Send + 'static;

    /// Singular display name, used in logs and notices.
    const LABEL: &'static str;

    fn id(&self) -> u64;

    /// Build a new record from its draft, stamping creation time.
    fn from_draft(id: u64, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge `patch` over the record and stamp the modification time.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

/// Split a comma-separated tag string, trimming segments and dropping empties.
pub fn split_tags(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether the comma-separated `raw` contains `tag` exactly (after trimming).
pub fn has_tag(raw: &str, tag: &str) -> bool {
    split_tags(raw).into_iter().any(|t| t == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tags_trims_and_drops_empty() {
        assert_eq!(split_tags(" vip, retail ,, ,wholesale"), vec!["vip", "retail", "wholesale"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn has_tag_is_exact() {
        assert!(has_tag("vip, retail", "retail"));
        assert!(!has_tag("vip, retail", "ret"));
        assert!(!has_tag("", "vip"));
    }
}
