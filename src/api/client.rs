use super::constants::{self, headers};
use super::error::ApiError;
use super::models::{Container, EntityKind, NewContainer, Workspace, WorkspacePath};
use super::resilience::{ApiLogger, OperationContext, RateLimiter, ResilienceConfig, RetryPolicy};
use super::TagManagerApi;
use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Tag Manager v2 client with retry, pacing and request logging
#[derive(Clone)]
pub struct TagManagerClient {
    base_url: String,
    http_client: reqwest::Client,
    access_token: String,
    retry_policy: RetryPolicy,
    rate_limiter: RateLimiter,
    api_logger: ApiLogger,
}

impl TagManagerClient {
    pub fn new(access_token: impl Into<String>, resilience: &ResilienceConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(constants::USER_AGENT)
            .build()
            .map_err(|source| ApiError::Network {
                method: "BUILD".to_string(),
                url: constants::API_BASE_URL.to_string(),
                source,
            })?;

        Ok(Self::with_http_client(access_token, resilience, http_client))
    }

    /// Create a client around an existing reqwest client
    pub fn with_http_client(
        access_token: impl Into<String>,
        resilience: &ResilienceConfig,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: constants::API_BASE_URL.to_string(),
            http_client,
            access_token: access_token.into(),
            retry_policy: RetryPolicy::new(resilience.retry.clone()),
            rate_limiter: RateLimiter::new(resilience.rate_limit.clone()),
            api_logger: ApiLogger::new(resilience.monitoring.clone()),
        }
    }

    /// Point the client at another API root (staging, local proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, parent: &str, collection: &str) -> String {
        constants::collection_endpoint(&self.base_url, parent, collection)
    }

    /// Follow `nextPageToken` until the collection is exhausted
    async fn list_all(&self, url: &str, field: &str) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let query: Vec<(&str, String)> = page_token
                .iter()
                .map(|token| ("pageToken", token.clone()))
                .collect();

            let page = self.send("list", Method::GET, url, &query, None).await?;

            if let Value::Object(mut page) = page {
                if let Some(Value::Array(batch)) = page.remove(field) {
                    items.extend(batch);
                }
                page_token = page
                    .remove("nextPageToken")
                    .and_then(|t| t.as_str().map(str::to_string))
                    .filter(|t| !t.is_empty());
            } else {
                page_token = None;
            }

            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} {} from {}", items.len(), field, url);
        Ok(items)
    }

    /// One logical API call: retried, paced and logged
    async fn send(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let context = self.api_logger.start_operation(operation, url);
        let mut retries = 0;

        let result = self
            .retry_policy
            .execute_observed(
                || self.attempt(&context, method.clone(), url, query, body),
                |attempt, error: &ApiError, delay| {
                    retries += 1;
                    self.api_logger.log_retry(&context, attempt, &error.to_string(), delay);
                },
            )
            .await;

        let metrics = context.create_metrics(
            result.is_ok(),
            retries,
            result.as_ref().err().and_then(ApiError::status),
            result.as_ref().err().map(|e| e.to_string()),
        );
        self.api_logger.complete_operation(&context, &metrics);

        result
    }

    async fn attempt(
        &self,
        context: &OperationContext,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let throttle_start = Instant::now();
        self.rate_limiter.acquire().await;
        let waited = throttle_start.elapsed();
        if waited > Duration::from_secs(1) {
            self.api_logger.log_throttled(context, waited);
        }

        let network_error = |source: reqwest::Error| ApiError::Network {
            method: method.to_string(),
            url: url.to_string(),
            source,
        };

        let mut request = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, headers::CONTENT_TYPE_JSON)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), method.as_str(), url, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn workspace_parent(workspace: &WorkspacePath) -> Result<String, ApiError> {
    workspace.parent().ok_or_else(|| ApiError::MissingWorkspace {
        account_id: workspace.account_id.clone(),
        container_id: workspace.container_id.clone(),
    })
}

#[async_trait]
impl TagManagerApi for TagManagerClient {
    async fn list_containers(&self, account_id: &str) -> Result<Vec<Container>, ApiError> {
        let url = self.endpoint(&constants::account_path(account_id), "containers");
        let items = self.list_all(&url, "container").await?;
        items.into_iter().map(|item| decode(&url, item)).collect()
    }

    async fn create_container(
        &self,
        account_id: &str,
        container: &NewContainer,
    ) -> Result<Container, ApiError> {
        let url = self.endpoint(&constants::account_path(account_id), "containers");
        let body = serde_json::to_value(container).map_err(|e| ApiError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let created = self.send("create", Method::POST, &url, &[], Some(&body)).await?;
        decode(&url, created)
    }

    async fn list_workspaces(&self, container: &Container) -> Result<Vec<Workspace>, ApiError> {
        let url = self.endpoint(&container.path(), "workspaces");
        let items = self.list_all(&url, "workspace").await?;
        items.into_iter().map(|item| decode(&url, item)).collect()
    }

    async fn list_entities(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
    ) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(&workspace_parent(workspace)?, kind.collection());
        self.list_all(&url, kind.list_field()).await
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(&workspace_parent(workspace)?, kind.collection());
        self.send("create", Method::POST, &url, &[], Some(body)).await
    }
}
