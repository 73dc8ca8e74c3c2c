//! Scripted gateway doubles for exercising stores without a server.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::api::{AuthApi, TaskApi};
use crate::error::{ApiError, ApiResult};
use crate::model::{
    AuthRequest, AuthResponse, Priority, SetCompletionRequest, StatusFilter, Task, TaskPayload,
};

enum Reply<T> {
    Ready(ApiResult<T>),
    Deferred(oneshot::Receiver<ApiResult<T>>),
}

/// Queue of replies handed out in call order.
pub struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    pub fn push(&self, reply: ApiResult<T>) {
        self.replies.lock().push_back(Reply::Ready(reply));
    }

    /// Queue a reply the test resolves later through the returned sender.
    pub fn defer(&self) -> oneshot::Sender<ApiResult<T>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn is_exhausted(&self) -> bool {
        self.replies.lock().is_empty()
    }

    async fn next(&self, operation: &str) -> ApiResult<T> {
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Local(format!("{operation} reply dropped")))),
            None => Err(ApiError::Local(format!("no scripted reply for {operation}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(StatusFilter),
    Get(String),
    Create(TaskPayload),
    Update(String, TaskPayload),
    SetCompletion(String, bool),
    Delete(String),
    Login(String),
    Register(String),
}

/// Implements both gateway traits from per-operation scripts and records every call.
#[derive(Default)]
pub struct ScriptedApi {
    pub list: Script<Vec<Task>>,
    pub get: Script<Task>,
    pub create: Script<Task>,
    pub update: Script<Task>,
    pub complete: Script<Task>,
    pub delete: Script<()>,
    pub login: Script<AuthResponse>,
    pub register: Script<AuthResponse>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn list_tasks(&self, filter: StatusFilter) -> ApiResult<Vec<Task>> {
        self.record(Call::List(filter));
        self.list.next("list_tasks").await
    }

    async fn get_task(&self, id: &str) -> ApiResult<Task> {
        self.record(Call::Get(id.to_string()));
        self.get.next("get_task").await
    }

    async fn create_task(&self, payload: &TaskPayload) -> ApiResult<Task> {
        self.record(Call::Create(payload.clone()));
        self.create.next("create_task").await
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> ApiResult<Task> {
        self.record(Call::Update(id.to_string(), payload.clone()));
        self.update.next("update_task").await
    }

    async fn set_completion(&self, id: &str, request: &SetCompletionRequest) -> ApiResult<Task> {
        self.record(Call::SetCompletion(id.to_string(), request.is_completed));
        self.complete.next("set_completion").await
    }

    async fn delete_task(&self, id: &str) -> ApiResult<()> {
        self.record(Call::Delete(id.to_string()));
        self.delete.next("delete_task").await
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
    async fn login(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        self.record(Call::Login(request.email.clone()));
        self.login.next("login").await
    }

    async fn register(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        self.record(Call::Register(request.email.clone()));
        self.register.next("register").await
    }
}

pub fn sample_task(id: &str, title: &str, completed: bool) -> Task {
    let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).single().unwrap_or_default();
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        is_completed: completed,
        priority: Priority::Medium,
        due_date: None,
        created_at: stamp,
        updated_at: stamp,
    }
}
