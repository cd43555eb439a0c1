//! Record operations against `api/v2/tables/{table}/records`.
//!
//! Reads go through the pagination engine and bulk writes through the batch
//! splitter, so no single request exceeds the configured page or batch size.

use std::fmt;

use noco_batch::{batch_with, paginate_source, BatchExecutor, BatchKind, Page};
use noco_config::{Config, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{ClientError, Result},
    http_client::{ApiRequest, HttpTransport, Method, Transport},
    query::QueryBuilder,
    table::Table,
};

/// Rows returned when a query names no limit.
pub const DEFAULT_LIMIT: usize = 25;

/// A record as the service returns it: column name to value.
pub type Record = Map<String, Value>;

/// Primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(id) => Value::from(*id),
            RecordId::Text(id) => Value::from(id.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        RecordId::Int(id.into())
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        RecordId::Int(id.into())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

/// Parameters of a multi-record read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Rendered sort string, e.g. `Name,-CreatedAt`.
    pub sort: Option<String>,
    /// Rendered filter string, e.g. `(Status,eq,active)`.
    pub where_: Option<String>,
    pub fields: Vec<String>,
    pub limit: usize,
    /// Offset of the first row; pagination continues from here.
    pub offset: usize,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            sort: None,
            where_: None,
            fields: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn where_(mut self, filter: impl Into<String>) -> Self {
        self.where_ = Some(filter.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Query parameters for one page request. Unset and empty values are left out.
    pub fn page_params(&self, offset: usize, limit: usize) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            params.push(("sort".to_string(), sort.to_string()));
        }
        if let Some(filter) = self.where_.as_deref().filter(|w| !w.is_empty()) {
            params.push(("where".to_string(), filter.to_string()));
        }
        if !self.fields.is_empty() {
            params.push(("fields".to_string(), self.fields.join(",")));
        }
        params
    }
}

pub(crate) fn records_path(table: &str) -> String {
    format!("api/v2/tables/{table}/records")
}

/// Synchronous client for the records API.
pub struct RecordsClient<T> {
    transport: T,
    max_page_size: usize,
    max_batch_size: usize,
}

impl RecordsClient<HttpTransport> {
    /// Builds an HTTP-backed client from a resolved [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_limits(
            HttpTransport::from_config(config)?,
            config.page_size(),
            config.batch_size(),
        )
    }
}

impl<T: Transport> RecordsClient<T> {
    /// A client with the default page and batch ceilings.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// A client with explicit ceilings; both must be non-zero.
    pub fn with_limits(transport: T, max_page_size: usize, max_batch_size: usize) -> Result<Self> {
        if max_page_size == 0 {
            return Err(ClientError::InvalidPageSize);
        }
        if max_batch_size == 0 {
            return Err(ClientError::InvalidBatchSize);
        }
        Ok(Self {
            transport,
            max_page_size,
            max_batch_size,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Binds this client to one table.
    pub fn table(&self, table_id: impl Into<String>) -> Table<'_, T> {
        Table::new(self, table_id)
    }

    /// Starts a [`QueryBuilder`] over `table_id`.
    pub fn query(&self, table_id: impl Into<String>) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self, table_id)
    }

    /// Reads up to `query.limit` records, one page request at a time.
    pub fn get_records(&self, table: &str, query: &RecordQuery) -> Result<Vec<Record>> {
        let path = records_path(table);
        let mut fetch_page = |offset: usize, limit: usize| -> Result<Page<Record>> {
            let mut request = ApiRequest::get(path.as_str());
            request.query = query.page_params(offset, limit);
            parse_page(self.transport.request(request)?)
        };

        let records = paginate_source(
            &mut fetch_page,
            query.offset,
            query.limit,
            self.max_page_size,
        )?;
        debug!(table, records = records.len(), "fetched records");
        Ok(records)
    }

    /// Reads one record by id, optionally limited to `fields`.
    pub fn get_record(
        &self,
        table: &str,
        id: impl Into<RecordId>,
        fields: &[&str],
    ) -> Result<Record> {
        let id = id.into();
        let mut request = ApiRequest::get(format!("{}/{id}", records_path(table)));
        if !fields.is_empty() {
            request = request.with_query("fields", fields.join(","));
        }
        into_record(self.transport.request(request)?)
    }

    /// Inserts a record and returns its new id.
    pub fn insert_record(&self, table: &str, record: &Record) -> Result<RecordId> {
        let request = ApiRequest::post(records_path(table), Value::Object(record.clone()));
        response_id(&self.transport.request(request)?)
    }

    /// Updates a record. `id`, when given, overrides any `Id` in `record`.
    pub fn update_record(
        &self,
        table: &str,
        mut record: Record,
        id: Option<RecordId>,
    ) -> Result<RecordId> {
        if let Some(id) = id {
            record.insert("Id".to_string(), id.to_value());
        }
        let request = ApiRequest::patch(records_path(table), Value::Object(record));
        response_id(&self.transport.request(request)?)
    }

    /// Deletes a record and returns its id.
    pub fn delete_record(&self, table: &str, id: impl Into<RecordId>) -> Result<RecordId> {
        let id: RecordId = id.into();
        let body = json!({ "Id": id });
        let request = ApiRequest::delete(records_path(table), body);
        response_id(&self.transport.request(request)?)
    }

    /// Counts records matching `where_`. A missing count reads as 0.
    pub fn count_records(&self, table: &str, where_: Option<&str>) -> Result<u64> {
        let mut request = ApiRequest::get(format!("{}/count", records_path(table)));
        if let Some(filter) = where_.filter(|w| !w.is_empty()) {
            request = request.with_query("where", filter);
        }
        let response = self.transport.request(request)?;
        Ok(response.get("count").and_then(Value::as_u64).unwrap_or(0))
    }

    /// Inserts records in chunks of at most `max_batch_size`.
    pub fn bulk_insert_records(&self, table: &str, records: &[Record]) -> Result<Vec<RecordId>> {
        let mut writer = BulkWriter::new(&self.transport, table);
        Ok(batch_with(
            &mut writer,
            BatchKind::Insert,
            records,
            self.max_batch_size,
        )?)
    }

    /// Updates records in bulk. Every record must carry its `Id`; nothing is
    /// sent otherwise.
    pub fn bulk_update_records(&self, table: &str, records: &[Record]) -> Result<Vec<RecordId>> {
        if records.iter().any(|record| !record.contains_key("Id")) {
            return Err(ClientError::Validation(
                "Record must include 'Id' for bulk update".to_string(),
            ));
        }

        let mut writer = BulkWriter::new(&self.transport, table);
        Ok(batch_with(
            &mut writer,
            BatchKind::Update,
            records,
            self.max_batch_size,
        )?)
    }

    /// Deletes records by id in chunks of at most `max_batch_size`.
    pub fn bulk_delete_records(&self, table: &str, ids: &[RecordId]) -> Result<Vec<RecordId>> {
        let mut writer = BulkWriter::new(&self.transport, table);
        Ok(batch_with(
            &mut writer,
            BatchKind::Delete,
            ids,
            self.max_batch_size,
        )?)
    }
}

/// Sends one bulk request per chunk.
struct BulkWriter<'a, T: ?Sized> {
    transport: &'a T,
    path: String,
}

impl<'a, T: Transport + ?Sized> BulkWriter<'a, T> {
    fn new(transport: &'a T, table: &str) -> Self {
        Self {
            transport,
            path: records_path(table),
        }
    }

    fn send(&self, kind: BatchKind, body: Vec<Value>) -> Result<Vec<RecordId>> {
        let request = ApiRequest::new(Method::from(kind), self.path.as_str())
            .with_body(Value::Array(body));
        parse_ids(self.transport.request(request)?)
    }
}

impl<T: Transport + ?Sized> BatchExecutor<Record> for BulkWriter<'_, T> {
    type Output = RecordId;
    type Error = ClientError;

    fn execute_batch(&mut self, kind: BatchKind, chunk: &[Record]) -> Result<Vec<RecordId>> {
        self.send(kind, chunk.iter().cloned().map(Value::Object).collect())
    }
}

impl<T: Transport + ?Sized> BatchExecutor<RecordId> for BulkWriter<'_, T> {
    type Output = RecordId;
    type Error = ClientError;

    fn execute_batch(&mut self, kind: BatchKind, chunk: &[RecordId]) -> Result<Vec<RecordId>> {
        self.send(kind, chunk.iter().map(|id| json!({ "Id": id })).collect())
    }
}

fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => {
            Err(ClientError::InvalidResponse(format!(
                "expected a record object, got {other}"
            )))
        }
    }
}

fn response_id(value: &Value) -> Result<RecordId> {
    value
        .get("Id")
        .and_then(RecordId::from_value)
        .ok_or_else(|| ClientError::InvalidResponse("response carries no 'Id'".to_string()))
}

/// Splits a list response into its rows and the last-page flag.
///
/// A missing `list` is an empty page; a missing `pageInfo.isLastPage` ends
/// the read.
fn parse_page(value: Value) -> Result<Page<Record>> {
    let Value::Object(mut body) = value else {
        return Err(ClientError::InvalidResponse(
            "expected a list response object".to_string(),
        ));
    };

    let items = match body.remove("list") {
        Some(Value::Array(items)) => items.into_iter().map(into_record).collect::<Result<_>>()?,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            return Err(ClientError::InvalidResponse(
                "'list' is not an array".to_string(),
            ))
        }
    };

    let is_last_page = match body
        .get("pageInfo")
        .and_then(|info| info.get("isLastPage"))
        .and_then(Value::as_bool)
    {
        Some(flag) => flag,
        None => {
            warn!("response has no pageInfo.isLastPage, treating it as the last page");
            true
        }
    };

    Ok(Page::new(items, is_last_page))
}

/// Reads the id list of a bulk response, one id per written record.
fn parse_ids(value: Value) -> Result<Vec<RecordId>> {
    let Value::Array(items) = value else {
        return Err(ClientError::InvalidResponse(
            "expected an array of ids".to_string(),
        ));
    };
    items.iter().map(response_id).collect()
}
