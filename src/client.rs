//! Client records.
//!
//! Contact details (email, phone, company) travel as a JSON object packed
//! into a single description string, both in fixture files and in the remote
//! `clients_c` table. A blob that fails to parse reads as empty contact info.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreResult;
use crate::record::{split_tags, Record};
use crate::remote::RemoteRecord;

/// Contact details of a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
}

impl ContactInfo {
    /// Parse a packed contact blob. Anything unreadable yields empty contact info.
    pub fn parse(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(blob) {
            Ok(info) => info,
            Err(error) => {
                tracing::debug!(error = %error, "unreadable contact blob, treating as empty");
                Self::default()
            }
        }
    }

    pub fn pack(&self) -> String {
        // Three plain string fields always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Serde adapter storing [`ContactInfo`] as a JSON string.
mod contact_blob {
    use super::ContactInfo;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(info: &ContactInfo, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&info.pack())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ContactInfo, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().map(ContactInfo::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "description", default, with = "contact_blob")]
    pub contact: ContactInfo,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Client {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { "Unnamed Client" } else { &self.name }
    }

    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Partial update for a client. Contact fields merge individually into the blob.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Record for Client {
    type Draft = ClientDraft;
    type Patch = ClientPatch;

    const LABEL: &'static str = "Client";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: ClientDraft, now: DateTime<Utc>) -> Self {
        Client {
            id,
            name: draft.name.trim().to_string(),
            contact: ContactInfo {
                email: draft.email.unwrap_or_default(),
                phone: draft.phone.unwrap_or_default(),
                company: draft.company.unwrap_or_default(),
            },
            tags: draft.tags.unwrap_or_default(),
            created_on: Some(now),
            modified_on: Some(now),
        }
    }

    fn apply(&mut self, patch: ClientPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(email) = patch.email { self.contact.email = email; }
        if let Some(phone) = patch.phone { self.contact.phone = phone; }
        if let Some(company) = patch.company { self.contact.company = company; }
        if let Some(tags) = patch.tags { self.tags = tags; }
        self.modified_on = Some(now);
    }
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    description_c: Option<String>,
    #[serde(rename = "Tags", default)]
    tags: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    modified_on: Option<DateTime<Utc>>,
}

impl RemoteRecord for Client {
    const TABLE: &'static str = "clients_c";
    const FIELDS: &'static [&'static str] =
        &["Name", "description_c", "Tags", "CreatedOn", "CreatedBy", "ModifiedOn"];

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: ClientRow = serde_json::from_value(row)?;
        Ok(Client {
            id: row.id,
            name: row.name.unwrap_or_default(),
            contact: row.description_c.as_deref().map(ContactInfo::parse).unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            created_on: row.created_on,
            modified_on: row.modified_on,
        })
    }

    fn to_row(&self) -> Value {
        json!({
            "Name": self.name,
            "description_c": self.contact.pack(),
            "Tags": self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Client {
        Client::from_draft(
            1,
            ClientDraft {
                name: "Acme".into(),
                email: Some("ops@acme.test".into()),
                phone: Some("555-0100".into()),
                company: Some("Acme Corp".into()),
                tags: Some("vip, retail".into()),
            },
            Utc::now(),
        )
    }

    #[test]
    fn email_patch_leaves_other_contact_fields() {
        let mut client = acme();
        client.apply(ClientPatch { email: Some("new@acme.test".into()), ..Default::default() }, Utc::now());
        assert_eq!(client.contact.email, "new@acme.test");
        assert_eq!(client.contact.phone, "555-0100");
        assert_eq!(client.contact.company, "Acme Corp");
        assert_eq!(client.tags, "vip, retail");
    }

    #[test]
    fn contact_is_stored_as_a_json_string() {
        let value = serde_json::to_value(acme()).unwrap();
        let blob = value["description"].as_str().unwrap();
        assert_eq!(ContactInfo::parse(blob).company, "Acme Corp");
    }

    #[test]
    fn broken_blob_reads_as_empty_contact() {
        let client: Client = serde_json::from_str(
            r#"{"Id": 2, "name": "Beta", "description": "not json", "tags": ""}"#,
        )
        .unwrap();
        assert_eq!(client.contact, ContactInfo::default());
        assert_eq!(ContactInfo::parse(r#"{"email": "a@b.c"}"#).email, "a@b.c");
    }

    #[test]
    fn unnamed_clients_get_a_placeholder() {
        let client = Client::from_draft(1, ClientDraft::default(), Utc::now());
        assert_eq!(client.display_name(), "Unnamed Client");
        assert!(client.tag_list().is_empty());
    }

    #[test]
    fn remote_row_packs_contact_into_description() {
        let row = acme().to_row();
        assert_eq!(row["Name"], "Acme");
        assert_eq!(row["Tags"], "vip, retail");
        let mut row = row;
        row["Id"] = json!(9);
        let back = Client::from_row(row).unwrap();
        assert_eq!(back.contact.phone, "555-0100");
        assert_eq!(back.created_on, None);
    }
}
