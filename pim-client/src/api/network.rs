// pim-client/src/api/network.rs
// HTTP 客户端 - 目录 API

use super::{BulkDownloadRequest, CatalogApi, Download, ListOrPage, Page};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use shared::{
    ApiErrorBody, AttributeGroup, Brand, CategoryNode, Family, Product, ProductId, ProductPatch,
    QueryParams, Tag,
};

/// reqwest-backed [`CatalogApi`]
#[derive(Debug, Clone)]
pub struct NetworkCatalogApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    endpoints: Endpoints,
}

impl NetworkCatalogApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Turn a non-2xx response into a [`ClientError`]
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ClientError::Http(e),
        };

        // 尝试解析为 API 错误响应
        if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&text) {
            let err = body.into_app_error(status);
            return ClientError::from_app_error(status.as_u16(), err);
        }

        // 降级到状态码
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(text)
            }
            _ => ClientError::Internal(format!("{}: {}", status, text)),
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.authorize(self.client.get(self.url(path)));
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let body: ListOrPage<T> = self.get_json(path).await?;
        Ok(body.into_vec())
    }
}

#[async_trait]
impl CatalogApi for NetworkCatalogApi {
    async fn list_products(&self, params: &QueryParams) -> ClientResult<Page<Product>> {
        let req = self
            .authorize(self.client.get(self.url(&self.endpoints.products)))
            .query(&params.to_pairs());
        tracing::debug!(params = ?params, "GET products");
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn get_product(&self, id: &ProductId) -> ClientResult<Product> {
        self.get_json(&self.endpoints.product_path(id)).await
    }

    async fn patch_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> ClientResult<Option<Product>> {
        let req = self
            .authorize(self.client.patch(self.url(&self.endpoints.product_path(id))))
            .json(patch);
        let response = req.send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        // A body that isn't a row (e.g. `{"status": "ok"}`) just means no canonical copy
        match serde_json::from_slice::<Product>(&bytes) {
            Ok(product) => Ok(Some(product)),
            Err(e) => {
                tracing::debug!(product_id = %id, error = %e, "PATCH body is not a product row");
                Ok(None)
            }
        }
    }

    async fn bulk_download(
        &self,
        id: &ProductId,
        request: &BulkDownloadRequest,
    ) -> ClientResult<Download> {
        let req = self
            .authorize(
                self.client
                    .post(self.url(&self.endpoints.bulk_download_path(id))),
            )
            .json(request);
        let response = req.send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let headers = response.headers();
        let disposition = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(Download::from_response_parts(
            disposition.as_deref(),
            content_type.as_deref(),
            bytes.to_vec(),
        ))
    }

    async fn categories(&self) -> ClientResult<Vec<CategoryNode>> {
        self.get_list(&self.endpoints.categories).await
    }

    async fn tags(&self) -> ClientResult<Vec<Tag>> {
        self.get_list(&self.endpoints.tags).await
    }

    async fn families(&self) -> ClientResult<Vec<Family>> {
        self.get_list(&self.endpoints.families).await
    }

    async fn attribute_groups(&self) -> ClientResult<Vec<AttributeGroup>> {
        self.get_list(&self.endpoints.attribute_groups).await
    }

    async fn brands(&self) -> ClientResult<Vec<Brand>> {
        self.get_list(&self.endpoints.brands).await
    }
}
