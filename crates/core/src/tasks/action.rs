//! Transition kinds applied to the task list state.

use crate::model::{StatusFilter, Task};

#[derive(Debug, Clone, PartialEq)]
pub enum TasksAction {
    SetFilter(StatusFilter),
    LoadRequested,
    LoadSucceeded(Vec<Task>),
    LoadFailed(String),
    SubmitRequested,
    CreateSucceeded(Task),
    UpdateSucceeded(Task),
    DeleteSucceeded(String),
    SubmitFailed(String),
    ToggleApplied { id: String, completed: bool },
    ToggleConfirmed(Task),
    ToggleRolledBack { id: String, completed: bool },
    ClearError,
}

impl TasksAction {
    pub fn label(&self) -> &'static str {
        match self {
            TasksAction::SetFilter(_) => "set filter",
            TasksAction::LoadRequested => "load requested",
            TasksAction::LoadSucceeded(_) => "load succeeded",
            TasksAction::LoadFailed(_) => "load failed",
            TasksAction::SubmitRequested => "submit requested",
            TasksAction::CreateSucceeded(_) => "create",
            TasksAction::UpdateSucceeded(_) => "update",
            TasksAction::DeleteSucceeded(_) => "delete",
            TasksAction::SubmitFailed(_) => "submit failed",
            TasksAction::ToggleApplied { .. } => "toggle applied",
            TasksAction::ToggleConfirmed(_) => "toggle confirmed",
            TasksAction::ToggleRolledBack { .. } => "toggle rolled back",
            TasksAction::ClearError => "clear error",
        }
    }
}
