use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::TaskApi;
use crate::error::ApiError;
use crate::model::{SetCompletionRequest, StatusFilter, Task, TaskPayload};
use crate::normalize::normalize;
use crate::tasks::action::TasksAction;
use crate::tasks::state::{reduce, TasksState, TOGGLE_ROLLBACK_MESSAGE};
use crate::telemetry::{self, Event as TelemetryEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Normalized error text.
    Failed(String),
}

/// Owns the task collection and routes every mutation through the gateway.
///
/// Operations never fail: outcomes land in [`TasksState`] and mutating calls report
/// success as a `bool`. The state lock is never held across an await, so responses
/// are applied in the order they resolve. Overlapping `load_tasks` calls are not
/// fenced; whichever response arrives last wins.
#[derive(Clone)]
pub struct TaskStore {
    api: Arc<dyn TaskApi>,
    state: Arc<Mutex<TasksState>>,
    telemetry: Arc<telemetry::Handle>,
}

impl TaskStore {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(TasksState::default())),
            telemetry: Arc::new(telemetry::Handle::new()),
        }
    }

    pub fn snapshot(&self) -> TasksState {
        self.state.lock().clone()
    }

    pub fn telemetry(&self) -> &telemetry::Handle {
        &self.telemetry
    }

    fn dispatch(&self, action: TasksAction) {
        let mut guard = self.state.lock();
        apply(&mut guard, action);
    }

    /// Only records the selection; callers reload explicitly.
    pub fn set_filter(&self, filter: StatusFilter) {
        self.dispatch(TasksAction::SetFilter(filter));
    }

    pub async fn load_tasks(&self, filter: StatusFilter) {
        self.dispatch(TasksAction::LoadRequested);
        self.telemetry
            .record(TelemetryEvent::LoadRequested(filter.to_string()));

        match self.api.list_tasks(filter).await {
            Ok(tasks) => {
                self.telemetry.record(TelemetryEvent::LoadCompleted {
                    filter: filter.to_string(),
                    count: tasks.len(),
                });
                self.dispatch(TasksAction::LoadSucceeded(tasks));
            }
            Err(err) => {
                let message = normalize(&err);
                self.telemetry.record(TelemetryEvent::LoadFailed {
                    filter: filter.to_string(),
                    error: message.clone(),
                });
                self.dispatch(TasksAction::LoadFailed(message));
            }
        }
    }

    /// Prepends the server's task on success. Validation is the caller's job.
    pub async fn create_task(&self, payload: TaskPayload) -> bool {
        self.dispatch(TasksAction::SubmitRequested);
        let result = self.api.create_task(&payload).await;
        self.settle_submit(result.map(TasksAction::CreateSucceeded))
    }

    /// Replaces the matching task in place with the server's copy on success.
    pub async fn update_task(&self, id: &str, payload: TaskPayload) -> bool {
        self.dispatch(TasksAction::SubmitRequested);
        let result = self.api.update_task(id, &payload).await;
        self.settle_submit(result.map(TasksAction::UpdateSucceeded))
    }

    pub async fn delete_task(&self, id: &str) -> bool {
        self.remove_task(id).await == DeleteOutcome::Deleted
    }

    /// Same transitions as [`TaskStore::delete_task`], keeping a 404 apart from other
    /// failures by status code rather than by message text.
    pub async fn remove_task(&self, id: &str) -> DeleteOutcome {
        self.dispatch(TasksAction::SubmitRequested);
        match self.api.delete_task(id).await {
            Ok(()) => {
                self.settle_submit(Ok(TasksAction::DeleteSucceeded(id.to_string())));
                DeleteOutcome::Deleted
            }
            Err(err) => {
                let outcome = if err.status() == Some(404) {
                    DeleteOutcome::NotFound
                } else {
                    DeleteOutcome::Failed(normalize(&err))
                };
                self.settle_submit(Err(err));
                outcome
            }
        }
    }

    fn settle_submit(&self, outcome: Result<TasksAction, ApiError>) -> bool {
        match outcome {
            Ok(action) => {
                self.telemetry
                    .record(TelemetryEvent::MutationApplied(action.label().into()));
                self.dispatch(action);
                true
            }
            Err(err) => {
                let message = normalize(&err);
                self.telemetry.record(TelemetryEvent::MutationFailed {
                    action: "submit".into(),
                    error: message.clone(),
                });
                self.dispatch(TasksAction::SubmitFailed(message));
                false
            }
        }
    }

    /// Flip the completion flag now and confirm it with the server later.
    ///
    /// The local change is applied before this returns. The returned future issues the
    /// request; on failure it restores the value captured here and sets the fixed
    /// rollback message. Each call restores its own snapshot, so when overlapping toggles
    /// on one task fail, the last rollback to settle wins.
    ///
    /// Nothing is sent until the future is polled. Dropping it unpolled leaves the flip
    /// in place with no request and no rollback, so callers must await or spawn it.
    #[must_use = "the completion request is only sent when the future is awaited"]
    pub fn toggle_complete(
        &self,
        id: &str,
        completed: bool,
    ) -> impl Future<Output = bool> + Send + 'static {
        let previous = {
            let mut guard = self.state.lock();
            let previous = guard
                .task(id)
                .map(|task| task.is_completed)
                .unwrap_or(!completed);
            apply(
                &mut guard,
                TasksAction::ToggleApplied {
                    id: id.to_string(),
                    completed,
                },
            );
            previous
        };
        self.telemetry.record(TelemetryEvent::ToggleApplied {
            id: id.to_string(),
            completed,
        });

        let store = self.clone();
        let id = id.to_string();
        async move {
            let request = SetCompletionRequest {
                is_completed: completed,
            };
            match store.api.set_completion(&id, &request).await {
                Ok(task) => {
                    store.dispatch(TasksAction::ToggleConfirmed(task));
                    true
                }
                Err(err) => {
                    tracing::debug!(task_id = id.as_str(), error = %err, "completion change rejected");
                    store.telemetry.record(TelemetryEvent::ToggleRolledBack {
                        id: id.clone(),
                        error: TOGGLE_ROLLBACK_MESSAGE.into(),
                    });
                    store.dispatch(TasksAction::ToggleRolledBack {
                        id,
                        completed: previous,
                    });
                    false
                }
            }
        }
    }

    /// Fetch one task for an edit form. The cached collection is left alone.
    pub async fn fetch_task(&self, id: &str) -> Result<Task, String> {
        self.api.get_task(id).await.map_err(|err| normalize(&err))
    }

    pub fn clear_error(&self) {
        self.dispatch(TasksAction::ClearError);
    }
}

fn apply(state: &mut TasksState, action: TasksAction) {
    let current = std::mem::take(state);
    *state = reduce(current, action);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::error::ProblemDetails;
    use crate::testing::{sample_task, Call, ScriptedApi};

    fn store_with(api: &Arc<ScriptedApi>) -> TaskStore {
        TaskStore::new(api.clone())
    }

    async fn seeded(api: &Arc<ScriptedApi>, tasks: Vec<Task>) -> TaskStore {
        let store = store_with(api);
        api.list.push(Ok(tasks));
        store.load_tasks(StatusFilter::All).await;
        store
    }

    fn ids(state: &TasksState) -> Vec<String> {
        state.tasks.iter().map(|task| task.id.clone()).collect()
    }

    #[tokio::test]
    async fn load_replaces_collection_and_clears_flags() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(
            &api,
            vec![sample_task("1", "Alpha", false), sample_task("2", "Beta", true)],
        )
        .await;

        let state = store.snapshot();
        assert_eq!(ids(&state), vec!["1", "2"]);
        assert!(!state.list_loading);
        assert_eq!(state.error, None);
        assert_eq!(api.calls(), vec![Call::List(StatusFilter::All)]);
    }

    #[tokio::test]
    async fn load_failure_sets_normalized_error() {
        let api = Arc::new(ScriptedApi::default());
        let store = store_with(&api);
        api.list
            .push(Err(ApiError::Unreachable("connection refused".into())));

        store.load_tasks(StatusFilter::Active).await;

        let state = store.snapshot();
        assert!(!state.list_loading);
        assert_eq!(
            state.error.as_deref(),
            Some("Unable to reach the server. Please check your connection.")
        );
    }

    #[tokio::test]
    async fn set_filter_does_not_fetch() {
        let api = Arc::new(ScriptedApi::default());
        let store = store_with(&api);
        store.set_filter(StatusFilter::Completed);
        assert_eq!(store.snapshot().filter, StatusFilter::Completed);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn list_loading_is_visible_while_request_in_flight() {
        let api = Arc::new(ScriptedApi::default());
        let store = store_with(&api);
        let release = api.list.defer();

        let observer = store.clone();
        let check = async move {
            tokio::task::yield_now().await;
            let mid = observer.snapshot();
            release
                .send(Ok(vec![sample_task("1", "Alpha", false)]))
                .ok();
            mid
        };
        let (_, mid) = tokio::join!(store.load_tasks(StatusFilter::All), check);

        assert!(mid.list_loading);
        assert!(!store.snapshot().list_loading);
    }

    #[tokio::test]
    async fn last_resolved_load_wins_even_if_issued_first() {
        let api = Arc::new(ScriptedApi::default());
        let store = store_with(&api);
        let completed_reply = api.list.defer();
        let active_reply = api.list.defer();

        let release = async move {
            tokio::task::yield_now().await;
            active_reply
                .send(Ok(vec![sample_task("active", "Open item", false)]))
                .ok();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            completed_reply
                .send(Ok(vec![sample_task("done", "Closed item", true)]))
                .ok();
        };

        tokio::join!(
            store.load_tasks(StatusFilter::Completed),
            store.load_tasks(StatusFilter::Active),
            release
        );

        assert_eq!(
            api.calls(),
            vec![
                Call::List(StatusFilter::Completed),
                Call::List(StatusFilter::Active)
            ]
        );
        assert_eq!(ids(&store.snapshot()), vec!["done"]);
    }

    #[tokio::test]
    async fn create_prepends_and_reports_success() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.create.push(Ok(sample_task("9", "Fresh", false)));

        let payload = TaskPayload {
            title: "Fresh".into(),
            ..TaskPayload::default()
        };
        assert!(store.create_task(payload.clone()).await);

        let state = store.snapshot();
        assert_eq!(ids(&state), vec!["9", "1"]);
        assert!(!state.submit_loading);
        assert_eq!(api.calls().last(), Some(&Call::Create(payload)));
    }

    #[tokio::test]
    async fn create_failure_leaves_collection() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.create.push(Err(ApiError::Status {
            status: 409,
            problem: None,
        }));

        assert!(!store.create_task(TaskPayload::default()).await);

        let state = store.snapshot();
        assert_eq!(ids(&state), vec!["1"]);
        assert!(!state.submit_loading);
        assert_eq!(
            state.error.as_deref(),
            Some("A conflict occurred. The resource may already exist.")
        );
    }

    #[tokio::test]
    async fn update_replaces_matching_task() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(
            &api,
            vec![sample_task("1", "Alpha", false), sample_task("2", "Beta", false)],
        )
        .await;
        api.update.push(Ok(sample_task("1", "Alpha v2", false)));

        assert!(store.update_task("1", TaskPayload::default()).await);

        let state = store.snapshot();
        assert_eq!(ids(&state), vec!["1", "2"]);
        assert_eq!(state.tasks[0].title, "Alpha v2");
    }

    #[tokio::test]
    async fn delete_removes_one_and_keeps_order() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(
            &api,
            vec![
                sample_task("1", "Alpha", false),
                sample_task("2", "Beta", false),
                sample_task("3", "Gamma", false),
            ],
        )
        .await;
        api.delete.push(Ok(()));

        assert!(store.delete_task("2").await);
        assert_eq!(ids(&store.snapshot()), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn delete_failure_keeps_collection() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.delete.push(Err(ApiError::Status {
            status: 404,
            problem: None,
        }));

        assert!(!store.delete_task("1").await);

        let state = store.snapshot();
        assert_eq!(ids(&state), vec!["1"]);
        assert_eq!(
            state.error.as_deref(),
            Some("The requested resource was not found.")
        );
    }

    #[tokio::test]
    async fn remove_task_classifies_by_status_code() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(
            &api,
            vec![sample_task("1", "Alpha", false), sample_task("2", "Beta", false)],
        )
        .await;
        api.delete.push(Ok(()));
        api.delete.push(Err(ApiError::Status {
            status: 404,
            problem: Some(ProblemDetails {
                title: Some("Not Found".into()),
                status: Some(404),
                ..ProblemDetails::default()
            }),
        }));
        api.delete.push(Err(ApiError::Status {
            status: 500,
            problem: None,
        }));

        assert_eq!(store.remove_task("1").await, DeleteOutcome::Deleted);
        assert_eq!(store.remove_task("gone").await, DeleteOutcome::NotFound);
        assert_eq!(store.snapshot().error.as_deref(), Some("Not Found"));
        assert_eq!(
            store.remove_task("2").await,
            DeleteOutcome::Failed("Server error (500). Please try again.".into())
        );
        assert_eq!(ids(&store.snapshot()), vec!["2"]);
    }

    #[tokio::test]
    async fn toggle_request_waits_for_the_future() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.complete.push(Ok(sample_task("1", "Alpha", true)));

        let pending = store.toggle_complete("1", true);
        assert!(store.snapshot().tasks[0].is_completed);
        assert_eq!(api.calls(), vec![Call::List(StatusFilter::All)]);

        assert!(pending.await);
        assert_eq!(
            api.calls(),
            vec![
                Call::List(StatusFilter::All),
                Call::SetCompletion("1".into(), true)
            ]
        );
    }

    #[tokio::test]
    async fn toggle_applies_before_request_resolves() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        let reply = api.complete.defer();

        let pending = store.toggle_complete("1", true);

        let state = store.snapshot();
        assert!(state.tasks[0].is_completed);
        assert!(!state.list_loading);
        assert!(!state.submit_loading);

        reply.send(Ok(sample_task("1", "Alpha", true))).ok();
        assert!(pending.await);
    }

    #[tokio::test]
    async fn toggle_success_keeps_new_value() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.complete.push(Ok(sample_task("1", "Alpha", true)));

        assert!(store.toggle_complete("1", true).await);

        let state = store.snapshot();
        assert!(state.tasks[0].is_completed);
        assert_eq!(state.error, None);
        assert_eq!(
            api.calls().last(),
            Some(&Call::SetCompletion("1".into(), true))
        );
    }

    #[tokio::test]
    async fn toggle_failure_rolls_back_with_fixed_message() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", true)]).await;
        api.complete.push(Err(ApiError::Status {
            status: 400,
            problem: None,
        }));

        assert!(!store.toggle_complete("1", false).await);

        let state = store.snapshot();
        assert!(state.tasks[0].is_completed);
        assert_eq!(state.error.as_deref(), Some(TOGGLE_ROLLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn toggle_rollback_ignores_normalizer_text() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.complete
            .push(Err(ApiError::Unreachable("timed out".into())));

        store.toggle_complete("1", true).await;

        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("Failed to update task completion status.")
        );
    }

    #[tokio::test]
    async fn overlapping_toggles_restore_their_own_snapshots() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        let first = api.complete.defer();
        let second = api.complete.defer();

        let to_done = store.toggle_complete("1", true);
        let back_to_open = store.toggle_complete("1", false);
        assert!(!store.snapshot().tasks[0].is_completed);

        second
            .send(Err(ApiError::Status {
                status: 500,
                problem: None,
            }))
            .ok();
        first
            .send(Err(ApiError::Status {
                status: 500,
                problem: None,
            }))
            .ok();
        assert!(!to_done.await);
        assert!(!back_to_open.await);

        // first toggle snapshotted `false`, second snapshotted `true`; the later rollback wins.
        assert!(store.snapshot().tasks[0].is_completed);
    }

    #[tokio::test]
    async fn fetch_task_does_not_touch_state() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        let before = store.snapshot();
        api.get.push(Ok(sample_task("7", "Elsewhere", false)));

        let fetched = store.fetch_task("7").await.unwrap();

        assert_eq!(fetched.title, "Elsewhere");
        assert_eq!(store.snapshot(), before);

        api.get.push(Err(ApiError::Status {
            status: 404,
            problem: None,
        }));
        assert_eq!(
            store.fetch_task("missing").await.unwrap_err(),
            "The requested resource was not found."
        );
    }

    #[tokio::test]
    async fn clear_error_resets_slot() {
        let api = Arc::new(ScriptedApi::default());
        let store = store_with(&api);
        api.list.push(Err(ApiError::Local("broken".into())));
        store.load_tasks(StatusFilter::All).await;
        assert!(store.snapshot().error.is_some());

        store.clear_error();
        store.clear_error();
        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test]
    async fn telemetry_tracks_toggle_rollback() {
        let api = Arc::new(ScriptedApi::default());
        let store = seeded(&api, vec![sample_task("1", "Alpha", false)]).await;
        api.complete.push(Err(ApiError::Local("nope".into())));
        store.toggle_complete("1", true).await;

        if store.telemetry().is_enabled() {
            assert!(store
                .telemetry()
                .events()
                .iter()
                .any(|event| matches!(event, TelemetryEvent::ToggleRolledBack { id, .. } if id == "1")));
        }
    }
}
