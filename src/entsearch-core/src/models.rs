use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// DocumentId identifies a document within a content source.
///
/// The service accepts both string and numeric identifiers and echoes back
/// whichever form was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Number(n) => write!(f, "{}", n),
            DocumentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Number(id)
    }
}

impl From<i32> for DocumentId {
    fn from(id: i32) -> Self {
        DocumentId::Number(i64::from(id))
    }
}

impl From<u32> for DocumentId {
    fn from(id: u32) -> Self {
        DocumentId::Number(i64::from(id))
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId::Text(id)
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        match id {
            DocumentId::Number(n) => Value::from(n),
            DocumentId::Text(s) => Value::String(s),
        }
    }
}

/// Document is one unit of indexable content, a flat mapping of field name to value.
///
/// Fields are not checked on construction; see [`crate::validation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create a document carrying all required fields
    pub fn new(
        id: impl Into<DocumentId>,
        title: impl Into<String>,
        body: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let id: DocumentId = id.into();
        let title: String = title.into();
        let body: String = body.into();
        let url: String = url.into();
        Self::default()
            .with_field("id", id)
            .with_field("title", title)
            .with_field("body", body)
            .with_field("url", url)
    }

    /// Set an arbitrary field, replacing any previous value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn with_created_at(self, at: DateTime<Utc>) -> Self {
        self.with_field("created_at", at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn with_updated_at(self, at: DateTime<Utc>) -> Self {
        self.with_field("updated_at", at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Set the `type` tag
    pub fn with_type(self, kind: impl Into<String>) -> Self {
        let kind: String = kind.into();
        self.with_field("type", kind)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// IndexOutcome is the per-document result of a bulk create.
///
/// Kept exactly as the service returned it; the accessors read the
/// well-known keys without dropping anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexOutcome(Map<String, Value>);

impl IndexOutcome {
    /// Identifier echoed back by the service, if it is a string or integer
    pub fn id(&self) -> Option<DocumentId> {
        self.0
            .get("id")
            .and_then(|id| DocumentId::deserialize(id).ok())
    }

    pub fn errors(&self) -> &[Value] {
        self.0
            .get("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_success(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// DestroyOutcome is the per-document result of a bulk destroy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyOutcome {
    pub id: DocumentId,
    pub success: bool,
}

/// ReceiptStatus is the processing state of an asynchronously indexed document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    #[default]
    Pending,
    Complete,
    Failed,
}

impl ReceiptStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReceiptStatus::Pending)
    }
}

/// DocumentReceipt tracks one document submitted for asynchronous indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReceipt {
    pub id: String,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
}

impl DocumentReceipt {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Response envelope of an asynchronous bulk create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub document_receipts: Vec<DocumentReceipt>,
}

/// UserPermissions is the ordered permission list of one user on a content source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub user: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// PermissionsRequest is the body of every permission mutation
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsRequest<'a> {
    pub permissions: &'a [String],
}

/// PageInfo describes the page returned by a paginated listing.
/// Values the service leaves out read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: PageInfo,
}

/// PermissionsPage is one page of a content source's user permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsPage {
    pub meta: PageMeta,
    pub results: Vec<UserPermissions>,
}

/// PageParams selects a page of a listing. Unset values use the server default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParams {
    pub current: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn with_current(mut self, current: u32) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Query pairs in `page[current]` / `page[size]` form
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(2);
        if let Some(current) = self.current {
            query.push(("page[current]".to_string(), current.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("page[size]".to_string(), size.to_string()));
        }
        query
    }
}
