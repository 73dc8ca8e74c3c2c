pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;
pub mod storage;
pub mod tasks;
pub mod telemetry;
pub mod validation;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::{AuthApi, HttpGateway, SessionObserver, TaskApi};
pub use config::{AppConfig, ConfigOverrides};
pub use error::{ApiError, ApiResult, ProblemDetails, StorageError};
pub use model::*;
pub use normalize::normalize;
pub use session::{AuthState, AuthStore, SessionStatus};
pub use storage::SessionStorage;
pub use tasks::{DeleteOutcome, TaskStore, TasksState, TOGGLE_ROLLBACK_MESSAGE};
pub use validation::{FieldErrors, FormField, TaskForm};
