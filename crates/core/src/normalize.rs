//! Collapses every gateway failure shape into the single line shown to the user.

use crate::error::{ApiError, ProblemDetails};

pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the server. Please check your connection.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";

/// First match wins: validation map, `detail`, `title`, status table, no response, local text.
pub fn normalize(error: &ApiError) -> String {
    match error {
        ApiError::Status { status, problem } => problem
            .as_ref()
            .and_then(describe_problem)
            .unwrap_or_else(|| status_message(*status)),
        ApiError::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
        local => {
            let text = local.to_string();
            if text.trim().is_empty() {
                UNEXPECTED_MESSAGE.to_string()
            } else {
                text
            }
        }
    }
}

fn describe_problem(problem: &ProblemDetails) -> Option<String> {
    let messages = problem.validation_messages();
    if !messages.is_empty() {
        return Some(messages.join(" "));
    }

    non_blank(problem.detail.as_deref()).or_else(|| non_blank(problem.title.as_deref()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

pub fn status_message(status: u16) -> String {
    match status {
        401 => "Unauthorized. Please log in again.".to_string(),
        403 => "You do not have permission to perform this action.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        409 => "A conflict occurred. The resource may already exist.".to_string(),
        other => format!("Server error ({other}). Please try again."),
    }
}
