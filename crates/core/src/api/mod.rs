//! Gateway seams between the stores and the remote task service.

mod http;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::model::{
    AuthRequest, AuthResponse, SetCompletionRequest, StatusFilter, Task, TaskPayload,
};

pub use http::HttpGateway;

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, filter: StatusFilter) -> ApiResult<Vec<Task>>;

    async fn get_task(&self, id: &str) -> ApiResult<Task>;

    async fn create_task(&self, payload: &TaskPayload) -> ApiResult<Task>;

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> ApiResult<Task>;

    async fn set_completion(&self, id: &str, request: &SetCompletionRequest) -> ApiResult<Task>;

    async fn delete_task(&self, id: &str) -> ApiResult<()>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &AuthRequest) -> ApiResult<AuthResponse>;

    async fn register(&self, request: &AuthRequest) -> ApiResult<AuthResponse>;
}

/// Notified by the transport when the server rejects the stored credential.
pub trait SessionObserver: Send + Sync {
    fn session_rejected(&self);
}
