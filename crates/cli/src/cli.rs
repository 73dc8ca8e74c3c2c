use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskdeck_core::config::ConfigOverrides;
use taskdeck_core::model::{Priority, StatusFilter};
use taskdeck_core::validation::TaskForm;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdeck",
    version,
    about = "Manage tasks on a remote task service from the terminal.",
    after_help = "Examples:\n  taskdeck list --status active\n  taskdeck add Write release notes --priority high --due 2024-06-30\n  taskdeck done 3f2a\n  taskdeck --auth login --email ana@example.com --password hunter22"
)]
pub struct Cli {
    /// Base URL of the task service (defaults to TASKDECK_API_URL, then http://localhost:5000)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override the data directory holding the persisted session
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Require a signed-in session for task operations
    #[arg(long, global = true, overrides_with = "no_auth")]
    pub auth: bool,

    /// Talk to the service without credentials
    #[arg(long = "no-auth", global = true, overrides_with = "auth")]
    pub no_auth: bool,

    /// Override the tracing filter (e.g. "info", "debug", or full directives)
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

impl Cli {
    /// `None` when neither flag was given, leaving the environment in charge.
    pub fn auth_override(&self) -> Option<bool> {
        match (self.auth, self.no_auth) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            auth_enabled: self.auth_override(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// List tasks, optionally scoped to a status
    List(ListArgs),
    /// Show every field of one task
    Show(TaskIdArgs),
    /// Create a task
    Add(AddArgs),
    /// Change fields of an existing task
    Edit(EditArgs),
    /// Mark a task as completed
    Done(TaskIdArgs),
    /// Mark a task as not completed
    Undone(TaskIdArgs),
    /// Delete one or more tasks by id
    Delete(DeleteArgs),
    /// Sign in and persist the session
    Login(LoginArgs),
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Forget the persisted session
    Logout,
    /// Print the signed-in account
    Whoami,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Which tasks to list (all, active, completed)
    #[arg(long, value_enum)]
    pub status: Option<StatusFilter>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskIdArgs {
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Task title; multiple words are joined with spaces
    #[arg(value_name = "TITLE", required = true)]
    pub title: Vec<String>,

    /// Longer free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Priority (low, medium, high); defaults to medium
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// Due date as YYYY-MM-DD
    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// Replace the title
    #[arg(long)]
    pub title: Option<String>,

    /// Replace the description; pass an empty string to clear it
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// New due date as YYYY-MM-DD
    #[arg(long = "due", value_name = "DATE", conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date
    #[arg(long = "clear-due")]
    pub clear_due: bool,
}

impl EditArgs {
    /// Overlay the supplied flags on a form pre-filled from the current task.
    pub fn apply_to(&self, form: &mut TaskForm) {
        if let Some(title) = &self.title {
            form.title = title.clone();
        }
        if let Some(description) = &self.description {
            form.description = description.clone();
        }
        if let Some(priority) = self.priority {
            form.priority = priority;
        }
        if self.clear_due {
            form.due_date.clear();
        } else if let Some(due) = &self.due {
            form.due_date = due.clone();
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// One or more task ids to delete (shown at the end of each `list` row)
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Repeat the password
    #[arg(long)]
    pub confirm: String,
}

impl From<&AddArgs> for TaskForm {
    fn from(args: &AddArgs) -> Self {
        TaskForm {
            title: args.title.join(" "),
            description: args.description.clone().unwrap_or_default(),
            priority: args.priority.unwrap_or_default(),
            due_date: args.due.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&["taskdeck", "whoami"], None)]
    #[case(&["taskdeck", "--auth", "whoami"], Some(true))]
    #[case(&["taskdeck", "whoami", "--no-auth"], Some(false))]
    #[case(&["taskdeck", "--auth", "--no-auth", "whoami"], Some(false))]
    fn auth_flags_resolve(#[case] argv: &[&str], #[case] expected: Option<bool>) {
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.auth_override(), expected);
    }

    #[test]
    fn add_joins_title_words_into_form() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "add",
            "Write",
            "release",
            "notes",
            "--priority",
            "high",
            "--due",
            "2024-06-30",
        ])
        .unwrap();
        let CliCommand::Add(args) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(
            TaskForm::from(&args),
            TaskForm {
                title: "Write release notes".into(),
                description: String::new(),
                priority: Priority::High,
                due_date: "2024-06-30".into(),
            }
        );
    }

    #[test]
    fn list_status_accepts_lowercase_values() {
        let cli = Cli::try_parse_from(["taskdeck", "list", "--status", "completed"]).unwrap();
        let CliCommand::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.status, Some(StatusFilter::Completed));
    }

    #[test]
    fn edit_rejects_due_with_clear_due() {
        assert!(
            Cli::try_parse_from(["taskdeck", "edit", "1", "--due", "2024-01-01", "--clear-due"])
                .is_err()
        );
    }

    #[test]
    fn edit_overlays_only_given_fields() {
        let mut form = TaskForm {
            title: "Old".into(),
            description: "Keep".into(),
            priority: Priority::Low,
            due_date: "2024-01-01".into(),
        };
        let args = EditArgs {
            id: "1".into(),
            title: Some("New title".into()),
            clear_due: true,
            ..EditArgs::default()
        };
        args.apply_to(&mut form);
        assert_eq!(
            form,
            TaskForm {
                title: "New title".into(),
                description: "Keep".into(),
                priority: Priority::Low,
                due_date: String::new(),
            }
        );
    }
}
