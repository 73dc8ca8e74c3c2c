//! Client-side checks run before anything reaches the gateway.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::model::{midnight_utc, Priority, Task, TaskPayload};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Title,
    Description,
    DueDate,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::DueDate => "dueDate",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field to message; empty means the form may be submitted.
pub type FieldErrors = BTreeMap<FormField, String>;

/// Raw text as typed into the task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// `YYYY-MM-DD`, or blank for no due date.
    pub due_date: String,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            due_date: task
                .due_day()
                .map(|day| day.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        validate_task_form(self)
    }

    /// Validate, then build the wire payload.
    pub fn into_payload(self) -> Result<TaskPayload, FieldErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let description = self.description.trim();
        let due_date = match self.due_date.trim() {
            "" => None,
            raw => parse_due_date(raw).map(midnight_utc),
        };

        Ok(TaskPayload {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: Some(self.priority),
            due_date,
        })
    }
}

pub fn validate_task_form(form: &TaskForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let title = form.title.trim();
    let title_len = title.chars().count();
    if title.is_empty() {
        errors.insert(FormField::Title, "Title is required.".into());
    } else if title_len < TITLE_MIN_CHARS {
        errors.insert(
            FormField::Title,
            format!("Title must be at least {TITLE_MIN_CHARS} characters."),
        );
    } else if title_len > TITLE_MAX_CHARS {
        errors.insert(
            FormField::Title,
            format!("Title must not exceed {TITLE_MAX_CHARS} characters."),
        );
    }

    if form.description.trim().chars().count() > DESCRIPTION_MAX_CHARS {
        errors.insert(
            FormField::Description,
            format!("Description must not exceed {DESCRIPTION_MAX_CHARS} characters."),
        );
    }

    let due = form.due_date.trim();
    if !due.is_empty() && parse_due_date(due).is_none() {
        errors.insert(FormField::DueDate, "Please enter a valid date.".into());
    }

    errors
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    EmailRequired,
    PasswordRequired,
    PasswordTooShort,
    PasswordTooLong,
    PasswordMismatch,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::EmailRequired => f.write_str("Email is required."),
            CredentialError::PasswordRequired => f.write_str("Password is required."),
            CredentialError::PasswordTooShort => write!(
                f,
                "Password must be at least {PASSWORD_MIN_CHARS} characters."
            ),
            CredentialError::PasswordTooLong => write!(
                f,
                "Password must not exceed {PASSWORD_MAX_CHARS} characters."
            ),
            CredentialError::PasswordMismatch => f.write_str("Passwords do not match."),
        }
    }
}

impl std::error::Error for CredentialError {}

pub fn validate_login(email: &str, password: &str) -> Result<(), CredentialError> {
    if email.trim().is_empty() {
        return Err(CredentialError::EmailRequired);
    }
    if password.is_empty() {
        return Err(CredentialError::PasswordRequired);
    }
    Ok(())
}

pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), CredentialError> {
    if email.trim().is_empty() {
        return Err(CredentialError::EmailRequired);
    }
    let len = password.chars().count();
    if len == 0 {
        return Err(CredentialError::PasswordRequired);
    }
    if len < PASSWORD_MIN_CHARS {
        return Err(CredentialError::PasswordTooShort);
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(CredentialError::PasswordTooLong);
    }
    if password != confirm {
        return Err(CredentialError::PasswordMismatch);
    }
    Ok(())
}
