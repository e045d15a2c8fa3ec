use crate::poller::AsyncIndexPoller;
use crate::transport::{HttpTransport, Transport};
use crate::{ClientError, Result};
use entsearch_core::validation::validate_documents;
use entsearch_core::{
    AccessToken, ClientConfig, ClientIdentity, DestroyOutcome, Document, DocumentId,
    DocumentReceipt, FieldRequirements, IndexOutcome, PageParams, PermissionsPage,
    PermissionsRequest, PollingConfig, SubmissionResponse, UserPermissions,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Content source API client
///
/// Every method maps to exactly one request, apart from
/// [`Client::index_documents_and_wait`] which submits and then polls.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    requirements: FieldRequirements,
    polling: PollingConfig,
}

impl Client {
    /// Create a client for the given base URL using the default identity
    pub fn new(access_token: impl Into<AccessToken>, base_url: impl Into<String>) -> Result<Self> {
        let transport = HttpTransport::new(base_url, access_token, ClientIdentity::default())?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::with_transport(Arc::new(transport)).with_polling(config.polling))
    }

    /// Create a client on top of an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            requirements: FieldRequirements::default(),
            polling: PollingConfig::default(),
        }
    }

    /// Replace the recognized document field set
    pub fn with_field_requirements(mut self, requirements: FieldRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    /// Index documents into a content source.
    ///
    /// The whole batch is validated first; one invalid document rejects the
    /// batch without sending anything.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn index_documents(
        &self,
        source_key: &str,
        documents: &[Document],
    ) -> Result<Vec<IndexOutcome>> {
        self.validate(documents)?;
        self.post(
            &format!("/sources/{}/documents/bulk_create", source_key),
            documents,
        )
        .await
    }

    /// Destroy documents from a content source by id
    #[instrument(skip(self, document_ids), fields(count = document_ids.len()))]
    pub async fn destroy_documents(
        &self,
        source_key: &str,
        document_ids: &[DocumentId],
    ) -> Result<Vec<DestroyOutcome>> {
        self.post(
            &format!("/sources/{}/documents/bulk_destroy", source_key),
            document_ids,
        )
        .await
    }

    /// List user permissions on a content source, one page at a time
    #[instrument(skip(self))]
    pub async fn list_permissions(
        &self,
        source_key: &str,
        page: Option<PageParams>,
    ) -> Result<PermissionsPage> {
        let query = page.map(|p| p.to_query()).unwrap_or_default();
        self.get(&format!("/sources/{}/permissions", source_key), &query)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_user_permissions(
        &self,
        source_key: &str,
        user: &str,
    ) -> Result<UserPermissions> {
        self.get(&permissions_path(source_key, user, None), &[])
            .await
    }

    /// Replace a user's permissions
    #[instrument(skip(self))]
    pub async fn update_user_permissions(
        &self,
        source_key: &str,
        user: &str,
        permissions: &[String],
    ) -> Result<UserPermissions> {
        self.post(
            &permissions_path(source_key, user, None),
            &PermissionsRequest { permissions },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn add_user_permissions(
        &self,
        source_key: &str,
        user: &str,
        permissions: &[String],
    ) -> Result<UserPermissions> {
        self.post(
            &permissions_path(source_key, user, Some("add")),
            &PermissionsRequest { permissions },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn remove_user_permissions(
        &self,
        source_key: &str,
        user: &str,
        permissions: &[String],
    ) -> Result<UserPermissions> {
        self.post(
            &permissions_path(source_key, user, Some("remove")),
            &PermissionsRequest { permissions },
        )
        .await
    }

    /// Submit documents for asynchronous indexing and return their receipts
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn submit_documents(
        &self,
        source_key: &str,
        documents: &[Document],
    ) -> Result<Vec<DocumentReceipt>> {
        self.validate(documents)?;
        let response: SubmissionResponse = self
            .post(
                &format!("/sources/{}/documents/async_bulk_create", source_key),
                documents,
            )
            .await?;
        Ok(response.document_receipts)
    }

    /// Look up the current state of several receipts in one request
    #[instrument(skip(self, receipt_ids), fields(count = receipt_ids.len()))]
    pub async fn document_receipts(&self, receipt_ids: &[String]) -> Result<Vec<DocumentReceipt>> {
        let query: Vec<(String, String)> = receipt_ids
            .iter()
            .map(|id| ("ids[]".to_string(), id.clone()))
            .collect();
        self.get("/document_receipts", &query).await
    }

    /// Submit documents and wait until every receipt is complete or failed
    pub async fn index_documents_and_wait(
        &self,
        source_key: &str,
        documents: &[Document],
    ) -> Result<Vec<DocumentReceipt>> {
        AsyncIndexPoller::new(self, self.polling)
            .index(source_key, documents)
            .await
    }

    fn validate(&self, documents: &[Document]) -> Result<()> {
        validate_documents(documents, &self.requirements).map_err(|(index, source)| {
            debug!(index, error = %source, "rejecting document batch");
            ClientError::Validation { index, source }
        })
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<R> {
        let body = self.transport.get(path, query).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<R> {
        let payload: Value = serde_json::to_value(payload)?;
        let body = self.transport.post(path, &payload).await?;
        Ok(serde_json::from_value(body)?)
    }
}

fn permissions_path(source_key: &str, user: &str, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("/sources/{}/permissions/{}/{}", source_key, user, action),
        None => format!("/sources/{}/permissions/{}", source_key, user),
    }
}
