//! Remote tabular record storage.
//!
//! The remote backend is a generic record-CRUD API over named tables. Reads
//! take a field list, an ordering and paging; writes take a batch of records
//! and answer per record. [`RecordsClient`] is the transport seam and
//! [`RemoteStore`] adapts it to [`RecordStore`] for any [`RemoteRecord`].
//!
//! Per-record failures inside an otherwise accepted batch are reported to the
//! notice sink with their field-level detail; only records that were actually
//! written are returned.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::notice::Notices;
use crate::record::Record;
use crate::store::RecordStore;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// A record that maps onto a row of a remote table.
pub trait RemoteRecord: Record {
    const TABLE: &'static str;
    /// Columns requested on reads.
    const FIELDS: &'static [&'static str];

    fn from_row(row: Value) -> StoreResult<Self>;

    /// Writable columns only; the store adds `Id` for updates.
    fn to_row(&self) -> Value;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: FieldName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Read request: which columns, in what order, which page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    pub fn for_fields(names: &[&str]) -> Self {
        FetchParams {
            fields: names
                .iter()
                .map(|n| FieldSpec { field: FieldName { name: n.to_string() } })
                .collect(),
            ..Default::default()
        }
    }

    pub fn ordered(mut self, field: &str, sort_type: SortType) -> Self {
        self.order_by.push(OrderBy { field_name: field.to_string(), sort_type });
        self
    }

    pub fn paged(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteParams {
    pub records: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_label: String,
    pub message: String,
}

/// Outcome for one record of a write batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

impl ApiResponse {
    fn refusal(&self) -> StoreError {
        StoreError::Rejected(self.message.clone().unwrap_or_else(|| "request refused".to_string()))
    }
}

/// Transport for the record-CRUD API. Implementations only move requests and
/// responses; interpretation is left to [`RemoteStore`].
#[async_trait]
pub trait RecordsClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: FetchParams) -> StoreResult<ApiResponse>;
    async fn get_record_by_id(&self, table: &str, id: u64, params: FetchParams) -> StoreResult<ApiResponse>;
    async fn create_record(&self, table: &str, params: WriteParams) -> StoreResult<ApiResponse>;
    async fn update_record(&self, table: &str, params: WriteParams) -> StoreResult<ApiResponse>;
    async fn delete_record(&self, table: &str, params: DeleteParams) -> StoreResult<ApiResponse>;
}

/// [`RecordStore`] backed by one remote table.
pub struct RemoteStore<R> {
    client: Arc<dyn RecordsClient>,
    notices: Notices,
    _record: PhantomData<fn() -> R>,
}

impl<R: RemoteRecord> RemoteStore<R> {
    pub fn new(client: Arc<dyn RecordsClient>, notices: Notices) -> Self {
        RemoteStore { client, notices, _record: PhantomData }
    }

    /// Rows that were written, after reporting the ones that were not.
    fn written(&self, response: ApiResponse, verb: &str) -> StoreResult<Vec<Value>> {
        if !response.success {
            return Err(response.refusal());
        }
        let results = response.results.unwrap_or_default();
        let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
        if !failed.is_empty() {
            tracing::warn!(
                table = R::TABLE,
                failed = failed.len(),
                "failed to {} records: {}",
                verb,
                serde_json::to_string(&failed).unwrap_or_default()
            );
            for record in &failed {
                for error in &record.errors {
                    self.notices.error(format!("{}: {}", error.field_label, error.message));
                }
                if let Some(message) = &record.message {
                    self.notices.error(message.clone());
                }
            }
        }
        Ok(ok.into_iter().map(|r| r.data.unwrap_or(Value::Null)).collect())
    }
}

#[async_trait]
impl<R: RemoteRecord> RecordStore<R> for RemoteStore<R> {
    async fn list(&self) -> StoreResult<Vec<R>> {
        let params = FetchParams::for_fields(R::FIELDS)
            .ordered("CreatedOn", SortType::Desc)
            .paged(DEFAULT_PAGE_SIZE, 0);
        let response = self.client.fetch_records(R::TABLE, params).await?;
        if !response.success {
            return Err(response.refusal());
        }
        let rows = match response.data {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => return Err(StoreError::Decode(format!("expected a row list, got {other}"))),
        };
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match R::from_row(row) {
                Ok(record) => records.push(record),
                Err(error) => tracing::warn!(table = R::TABLE, error = %error, "skipping malformed row"),
            }
        }
        Ok(records)
    }

    async fn get(&self, id: u64) -> StoreResult<Option<R>> {
        let params = FetchParams::for_fields(R::FIELDS);
        let response = self.client.get_record_by_id(R::TABLE, id, params).await?;
        // Refused is an error; only an empty payload means "no such record".
        if !response.success {
            tracing::debug!(table = R::TABLE, id, message = ?response.message, "record lookup refused");
            return Err(response.refusal());
        }
        match response.data {
            Some(Value::Null) | None => Ok(None),
            Some(row) => R::from_row(row).map(Some),
        }
    }

    async fn insert(&self, draft: R::Draft) -> StoreResult<R> {
        let row = R::from_draft(0, draft, Utc::now()).to_row();
        let response = self
            .client
            .create_record(R::TABLE, WriteParams { records: vec![row] })
            .await?;
        let mut written = self.written(response, "create")?;
        if written.is_empty() {
            return Err(StoreError::Rejected(format!("{} was not created", R::LABEL)));
        }
        R::from_row(written.swap_remove(0))
    }

    async fn update(&self, id: u64, patch: R::Patch) -> StoreResult<Option<R>> {
        // Fetch first so partial patches (e.g. one contact field) merge over current values.
        let Some(mut current) = self.get(id).await? else {
            return Ok(None);
        };
        current.apply(patch, Utc::now());
        let mut row = current.to_row();
        if let Value::Object(map) = &mut row {
            map.insert("Id".to_string(), Value::from(id));
        }
        let response = self
            .client
            .update_record(R::TABLE, WriteParams { records: vec![row] })
            .await?;
        let mut written = self.written(response, "update")?;
        if written.is_empty() {
            return Err(StoreError::Rejected(format!("{} was not updated", R::LABEL)));
        }
        match written.swap_remove(0) {
            Value::Null => Ok(Some(current)),
            data => R::from_row(data).map(Some),
        }
    }

    async fn remove(&self, id: u64) -> StoreResult<bool> {
        let response = self
            .client
            .delete_record(R::TABLE, DeleteParams { record_ids: vec![id] })
            .await?;
        Ok(!self.written(response, "delete")?.is_empty())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-process [`RecordsClient`] for tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Fetch(String, FetchParams),
        Get(String, u64),
        Create(String, WriteParams),
        Update(String, WriteParams),
        Delete(String, DeleteParams),
    }

    /// Answers each call with the next queued response and records the request.
    #[derive(Default)]
    pub struct ScriptedClient {
        responses: Mutex<VecDeque<StoreResult<ApiResponse>>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl ScriptedClient {
        pub fn respond(&self, response: StoreResult<ApiResponse>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, call: Call) -> StoreResult<ApiResponse> {
            self.calls.lock().unwrap().push(call);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StoreError::Transport("no scripted response".into())))
        }
    }

    #[async_trait]
    impl RecordsClient for ScriptedClient {
        async fn fetch_records(&self, table: &str, params: FetchParams) -> StoreResult<ApiResponse> {
            self.next(Call::Fetch(table.to_string(), params))
        }
        async fn get_record_by_id(&self, table: &str, id: u64, _params: FetchParams) -> StoreResult<ApiResponse> {
            self.next(Call::Get(table.to_string(), id))
        }
        async fn create_record(&self, table: &str, params: WriteParams) -> StoreResult<ApiResponse> {
            self.next(Call::Create(table.to_string(), params))
        }
        async fn update_record(&self, table: &str, params: WriteParams) -> StoreResult<ApiResponse> {
            self.next(Call::Update(table.to_string(), params))
        }
        async fn delete_record(&self, table: &str, params: DeleteParams) -> StoreResult<ApiResponse> {
            self.next(Call::Delete(table.to_string(), params))
        }
    }

    pub fn ok_data(data: Value) -> StoreResult<ApiResponse> {
        Ok(ApiResponse { success: true, data: Some(data), ..Default::default() })
    }

    pub fn ok_results(results: Vec<RecordResult>) -> StoreResult<ApiResponse> {
        Ok(ApiResponse { success: true, results: Some(results), ..Default::default() })
    }
}
