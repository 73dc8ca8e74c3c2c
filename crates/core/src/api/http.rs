//! reqwest-backed gateway speaking the task service's REST contract.

use std::sync::Weak;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{AuthApi, SessionObserver, TaskApi};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, ProblemDetails};
use crate::model::{
    AuthRequest, AuthResponse, SetCompletionRequest, StatusFilter, Task, TaskPayload,
};
use crate::storage::SessionStorage;

/// Whether an endpoint needs the stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Public,
    Session,
}

pub struct HttpGateway {
    client: Client,
    base_url: Url,
    auth_enabled: bool,
    storage: SessionStorage,
    observer: OnceCell<Weak<dyn SessionObserver>>,
}

impl HttpGateway {
    pub fn new(config: &AppConfig, storage: SessionStorage) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ApiError::Local(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_url().clone(),
            auth_enabled: config.auth_enabled(),
            storage,
            observer: OnceCell::new(),
        })
    }

    /// Register the process-wide controller told about rejected sessions.
    pub fn observe_session(&self, observer: Weak<dyn SessionObserver>) {
        if self.observer.set(observer).is_err() {
            tracing::warn!("session observer already registered; ignoring replacement");
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Local(format!("API URL {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str], scope: Scope) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        if !self.auth_enabled {
            return Ok(builder);
        }

        // A half-written credential counts as no session.
        match self.storage.load() {
            Some(session) => Ok(builder.bearer_auth(session.token)),
            None if scope == Scope::Session => Err(ApiError::NotAuthenticated),
            None => Ok(builder),
        }
    }

    async fn dispatch(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = builder
            .build()
            .map_err(|err| ApiError::Local(format!("failed to build request: {err}")))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(method = %method, path = path.as_str(), "dispatching request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::debug!(
            method = %method,
            path = path.as_str(),
            status = status.as_u16(),
            "request rejected"
        );
        if status == StatusCode::UNAUTHORIZED && self.auth_enabled {
            self.reject_session();
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            problem: ProblemDetails::from_body(&body),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.dispatch(builder).await?;
        let body = response.bytes().await.map_err(classify_transport)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn reject_session(&self) {
        tracing::warn!("server rejected the stored credential; clearing session");
        if let Err(err) = self.storage.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        if let Some(observer) = self.observer.get().and_then(Weak::upgrade) {
            observer.session_rejected();
        }
    }
}

fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else if err.is_builder() {
        ApiError::Local(err.to_string())
    } else {
        ApiError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl TaskApi for HttpGateway {
    async fn list_tasks(&self, filter: StatusFilter) -> ApiResult<Vec<Task>> {
        let builder = self
            .request(Method::GET, &["api", "tasks"], Scope::Session)?
            .query(&[("status", filter.as_str())]);
        self.fetch(builder).await
    }

    async fn get_task(&self, id: &str) -> ApiResult<Task> {
        let builder = self.request(Method::GET, &["api", "tasks", id], Scope::Session)?;
        self.fetch(builder).await
    }

    async fn create_task(&self, payload: &TaskPayload) -> ApiResult<Task> {
        let builder = self
            .request(Method::POST, &["api", "tasks"], Scope::Session)?
            .json(payload);
        self.fetch(builder).await
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> ApiResult<Task> {
        let builder = self
            .request(Method::PUT, &["api", "tasks", id], Scope::Session)?
            .json(payload);
        self.fetch(builder).await
    }

    async fn set_completion(&self, id: &str, request: &SetCompletionRequest) -> ApiResult<Task> {
        let builder = self
            .request(
                Method::PATCH,
                &["api", "tasks", id, "complete"],
                Scope::Session,
            )?
            .json(request);
        self.fetch(builder).await
    }

    async fn delete_task(&self, id: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, &["api", "tasks", id], Scope::Session)?;
        self.dispatch(builder).await.map(|_| ())
    }
}

#[async_trait]
impl AuthApi for HttpGateway {
    async fn login(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        let builder = self
            .request(Method::POST, &["api", "auth", "login"], Scope::Public)?
            .json(request);
        self.fetch(builder).await
    }

    async fn register(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        let builder = self
            .request(Method::POST, &["api", "auth", "register"], Scope::Public)?
            .json(request);
        self.fetch(builder).await
    }
}
