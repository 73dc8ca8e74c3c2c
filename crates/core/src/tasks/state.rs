use crate::model::{StatusFilter, Task};
use crate::tasks::action::TasksAction;

/// Fixed message shown when an optimistic completion change is rolled back.
pub const TOGGLE_ROLLBACK_MESSAGE: &str = "Failed to update task completion status.";

/// Cached view of the last successful list fetch plus request flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TasksState {
    pub tasks: Vec<Task>,
    pub filter: StatusFilter,
    pub list_loading: bool,
    pub submit_loading: bool,
    pub error: Option<String>,
}

impl TasksState {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Apply one transition. Pure: no I/O, no clock.
pub fn reduce(state: TasksState, action: TasksAction) -> TasksState {
    match action {
        TasksAction::SetFilter(filter) => TasksState { filter, ..state },

        TasksAction::LoadRequested => TasksState {
            list_loading: true,
            error: None,
            ..state
        },
        TasksAction::LoadSucceeded(tasks) => TasksState {
            tasks,
            list_loading: false,
            ..state
        },
        TasksAction::LoadFailed(error) => TasksState {
            list_loading: false,
            error: Some(error),
            ..state
        },

        TasksAction::SubmitRequested => TasksState {
            submit_loading: true,
            error: None,
            ..state
        },
        TasksAction::CreateSucceeded(task) => {
            let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
            tasks.push(task);
            tasks.extend(state.tasks);
            TasksState {
                tasks,
                submit_loading: false,
                ..state
            }
        }
        TasksAction::UpdateSucceeded(task) => TasksState {
            tasks: replace_task(state.tasks, task),
            submit_loading: false,
            ..state
        },
        TasksAction::DeleteSucceeded(id) => TasksState {
            tasks: state.tasks.into_iter().filter(|task| task.id != id).collect(),
            submit_loading: false,
            ..state
        },
        TasksAction::SubmitFailed(error) => TasksState {
            submit_loading: false,
            error: Some(error),
            ..state
        },

        TasksAction::ToggleApplied { id, completed } => TasksState {
            tasks: set_completion(state.tasks, &id, completed),
            ..state
        },
        TasksAction::ToggleConfirmed(task) => TasksState {
            tasks: replace_task(state.tasks, task),
            ..state
        },
        TasksAction::ToggleRolledBack { id, completed } => TasksState {
            tasks: set_completion(state.tasks, &id, completed),
            error: Some(TOGGLE_ROLLBACK_MESSAGE.to_string()),
            ..state
        },

        TasksAction::ClearError => TasksState {
            error: None,
            ..state
        },
    }
}

fn replace_task(tasks: Vec<Task>, updated: Task) -> Vec<Task> {
    tasks
        .into_iter()
        .map(|task| {
            if task.id == updated.id {
                updated.clone()
            } else {
                task
            }
        })
        .collect()
}

fn set_completion(mut tasks: Vec<Task>, id: &str, completed: bool) -> Vec<Task> {
    for task in tasks.iter_mut().filter(|task| task.id == id) {
        task.is_completed = completed;
    }
    tasks
}
