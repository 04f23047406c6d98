use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::{CashflowApi, Query};
use crate::config::Settings;
use crate::models::{Category, LookupDraft, LookupKind, LookupRow, Paginated, Record, RecordDraft, ReferenceSnapshot, Subcategory, Summary};
use crate::types::{ApiError, Identifier, RecordId};

/// `CashflowApi` over HTTP/JSON.
pub struct HttpApi {
    http: Client,
    base_url: Url
}

impl HttpApi {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&settings.base_url)?;

        // Endpoint paths are relative; without the slash `join` would drop the last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str, query: Option<&Query>) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(path)?;

        if let Some(query) = query.filter(|query| !query.is_empty()) {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: Option<&Query>) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        self.execute(path, self.http.get(url)).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned
    {
        let url = self.endpoint(path, None)?;
        self.execute(path, self.http.request(method, url).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path, None)?;
        let response = self.http.delete(url).send().await?;
        Self::check(path, response).await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, ApiError> {
        debug!("Requesting [{path}]");
        let response = Self::check(path, request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn check(path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(path));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::status(path, status.as_u16(), body));
        }

        Ok(response)
    }
}

#[async_trait]
impl CashflowApi for HttpApi {
    async fn reference_data(&self) -> Result<ReferenceSnapshot, ApiError> {
        self.get("reference-data/", None).await
    }

    async fn categories_of_type(&self, type_id: Identifier) -> Result<Vec<Category>, ApiError> {
        self.get(&format!("transaction-types/{type_id}/categories/"), None).await
    }

    async fn subcategories_of_category(&self, category_id: Identifier) -> Result<Vec<Subcategory>, ApiError> {
        self.get(&format!("categories/{category_id}/subcategories/"), None).await
    }

    async fn list_transactions(&self, query: &Query) -> Result<Paginated<Record>, ApiError> {
        self.get("transactions/", Some(query)).await
    }

    async fn transaction(&self, id: RecordId) -> Result<Record, ApiError> {
        self.get(&format!("transactions/{id}/"), None).await
    }

    async fn create_transaction(&self, draft: &RecordDraft) -> Result<Record, ApiError> {
        self.send(Method::POST, "transactions/", draft).await
    }

    async fn update_transaction(&self, id: RecordId, draft: &RecordDraft) -> Result<Record, ApiError> {
        self.send(Method::PUT, &format!("transactions/{id}/"), draft).await
    }

    async fn delete_transaction(&self, id: RecordId) -> Result<(), ApiError> {
        self.delete(&format!("transactions/{id}/")).await
    }

    async fn summary(&self, query: &Query) -> Result<Summary, ApiError> {
        self.get("transactions/summary/", Some(query)).await
    }

    async fn list_lookups(&self, kind: LookupKind, query: &Query) -> Result<Paginated<LookupRow>, ApiError> {
        self.get(&format!("{}/", kind.endpoint()), Some(query)).await
    }

    async fn save_lookup(&self, kind: LookupKind, id: Option<Identifier>, draft: &LookupDraft) -> Result<LookupRow, ApiError> {
        let body = draft.to_body(kind);

        match id {
            Some(id) => self.send(Method::PUT, &format!("{}/{id}/", kind.endpoint()), &body).await,
            None => self.send(Method::POST, &format!("{}/", kind.endpoint()), &body).await
        }
    }

    async fn delete_lookup(&self, kind: LookupKind, id: Identifier) -> Result<(), ApiError> {
        self.delete(&format!("{}/{id}/", kind.endpoint())).await
    }
}
