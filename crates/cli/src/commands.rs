use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::Utc;

use taskdeck_core::model::{StatusFilter, Task};
use taskdeck_core::session::SessionStatus;
use taskdeck_core::tasks::DeleteOutcome;
use taskdeck_core::validation::{validate_login, validate_registration, FieldErrors, TaskForm};

use crate::app::AppContext;
use crate::cli::{
    AddArgs, CliCommand, DeleteArgs, EditArgs, ListArgs, LoginArgs, RegisterArgs, TaskIdArgs,
};
use crate::helpers::{format_task_detail_entries, format_task_line};

const LOGIN_HINT: &str = "Run `taskdeck login` to sign in.";

pub async fn execute<W: Write>(ctx: &AppContext, command: CliCommand, mut writer: W) -> Result<()> {
    match command {
        CliCommand::List(args) => handle_list(ctx, &args, &mut writer).await,
        CliCommand::Show(args) => handle_show(ctx, &args, &mut writer).await,
        CliCommand::Add(args) => handle_add(ctx, &args, &mut writer).await,
        CliCommand::Edit(args) => handle_edit(ctx, &args, &mut writer).await,
        CliCommand::Done(args) => handle_toggle(ctx, &args, true, &mut writer).await,
        CliCommand::Undone(args) => handle_toggle(ctx, &args, false, &mut writer).await,
        CliCommand::Delete(args) => handle_delete(ctx, &args, &mut writer).await,
        CliCommand::Login(args) => handle_login(ctx, &args, &mut writer).await,
        CliCommand::Register(args) => handle_register(ctx, &args, &mut writer).await,
        CliCommand::Logout => handle_logout(ctx, &mut writer),
        CliCommand::Whoami => handle_whoami(ctx, &mut writer),
    }
}

async fn handle_list<W: Write>(ctx: &AppContext, args: &ListArgs, mut writer: W) -> Result<()> {
    let filter = args.status.unwrap_or_default();
    ctx.tasks.set_filter(filter);
    ctx.tasks.load_tasks(filter).await;

    let state = ctx.tasks.snapshot();
    if let Some(error) = state.error {
        return fail(ctx, error, &mut writer);
    }

    if state.tasks.is_empty() {
        writeln!(writer, "{}", state.filter.empty_message())?;
        return Ok(());
    }

    let now = Utc::now();
    for task in &state.tasks {
        writeln!(writer, "{}", format_task_line(task, now))?;
    }
    Ok(())
}

async fn handle_show<W: Write>(ctx: &AppContext, args: &TaskIdArgs, mut writer: W) -> Result<()> {
    let task = match ctx.tasks.fetch_task(&args.id).await {
        Ok(task) => task,
        Err(error) => return fail(ctx, error, &mut writer),
    };

    let entries = format_task_detail_entries(&task, Utc::now());
    let width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    for (label, value) in entries {
        writeln!(writer, "{label:<width$}  {value}")?;
    }
    Ok(())
}

async fn handle_add<W: Write>(ctx: &AppContext, args: &AddArgs, mut writer: W) -> Result<()> {
    let payload = match TaskForm::from(args).into_payload() {
        Ok(payload) => payload,
        Err(errors) => return reject_form(&errors, &mut writer),
    };

    if !ctx.tasks.create_task(payload).await {
        let error = ctx.tasks.snapshot().error.unwrap_or_default();
        return fail(ctx, error, &mut writer);
    }

    // Successful creates are prepended, so the new task leads the collection.
    match ctx.tasks.snapshot().tasks.first() {
        Some(task) => writeln!(writer, "Created {}", format_task_line(task, Utc::now()))?,
        None => writeln!(writer, "Created task")?,
    }
    Ok(())
}

async fn handle_edit<W: Write>(ctx: &AppContext, args: &EditArgs, mut writer: W) -> Result<()> {
    let current = match ctx.tasks.fetch_task(&args.id).await {
        Ok(task) => task,
        Err(error) => return fail(ctx, error, &mut writer),
    };

    let mut form = TaskForm::from_task(&current);
    args.apply_to(&mut form);
    let payload = match form.into_payload() {
        Ok(payload) => payload,
        Err(errors) => return reject_form(&errors, &mut writer),
    };

    if !ctx.tasks.update_task(&args.id, payload).await {
        let error = ctx.tasks.snapshot().error.unwrap_or_default();
        return fail(ctx, error, &mut writer);
    }
    writeln!(writer, "Updated task {}", args.id)?;
    Ok(())
}

async fn handle_toggle<W: Write>(
    ctx: &AppContext,
    args: &TaskIdArgs,
    completed: bool,
    mut writer: W,
) -> Result<()> {
    ctx.tasks.load_tasks(StatusFilter::All).await;
    if let Some(error) = ctx.tasks.snapshot().error {
        return fail(ctx, error, &mut writer);
    }

    let pending = ctx.tasks.toggle_complete(&args.id, completed);
    if !pending.await {
        let error = ctx.tasks.snapshot().error.unwrap_or_default();
        return fail(ctx, error, &mut writer);
    }

    let state = ctx.tasks.snapshot();
    let label = state
        .task(&args.id)
        .map(|task: &Task| task.title.clone())
        .unwrap_or_else(|| args.id.clone());
    if completed {
        writeln!(writer, "Completed {label}")?;
    } else {
        writeln!(writer, "Reopened {label}")?;
    }
    Ok(())
}

async fn handle_delete<W: Write>(ctx: &AppContext, args: &DeleteArgs, mut writer: W) -> Result<()> {
    let mut summary = DeleteSummary::default();
    for id in &args.ids {
        summary.record(id, ctx.tasks.remove_task(id).await);
    }
    ctx.tasks.clear_error();

    summary.write_to(&mut writer)?;
    if summary.failed.is_empty() {
        return Ok(());
    }

    print_login_hint(ctx, &mut writer)?;
    Err(anyhow!(
        "failed to delete {} task{}",
        summary.failed.len(),
        if summary.failed.len() == 1 { "" } else { "s" }
    ))
}

async fn handle_login<W: Write>(ctx: &AppContext, args: &LoginArgs, mut writer: W) -> Result<()> {
    if let Err(err) = validate_login(&args.email, &args.password) {
        writeln!(writer, "{err}")?;
        return Err(anyhow!(err));
    }

    if !ctx.auth.login(&args.email, &args.password).await {
        return fail_auth(ctx);
    }
    report_session(ctx, &mut writer)
}

async fn handle_register<W: Write>(
    ctx: &AppContext,
    args: &RegisterArgs,
    mut writer: W,
) -> Result<()> {
    if let Err(err) = validate_registration(&args.email, &args.password, &args.confirm) {
        writeln!(writer, "{err}")?;
        return Err(anyhow!(err));
    }

    if !ctx.auth.register(&args.email, &args.password).await {
        return fail_auth(ctx);
    }
    report_session(ctx, &mut writer)
}

fn handle_logout<W: Write>(ctx: &AppContext, mut writer: W) -> Result<()> {
    ctx.auth.logout();
    writeln!(writer, "Signed out.")?;
    Ok(())
}

fn handle_whoami<W: Write>(ctx: &AppContext, writer: W) -> Result<()> {
    report_session(ctx, writer)
}

fn report_session<W: Write>(ctx: &AppContext, mut writer: W) -> Result<()> {
    match ctx.auth.status() {
        SessionStatus::Authenticated { email: Some(email) } => {
            writeln!(writer, "Signed in as {email}")?
        }
        SessionStatus::Authenticated { email: None } => {
            writeln!(writer, "Authentication is disabled.")?
        }
        SessionStatus::Unauthenticated => writeln!(writer, "Not signed in. {LOGIN_HINT}")?,
    }
    Ok(())
}

fn reject_form<W: Write>(errors: &FieldErrors, mut writer: W) -> Result<()> {
    for message in errors.values() {
        writeln!(writer, "{message}")?;
    }
    Err(anyhow!("the task form has {} invalid field(s)", errors.len()))
}

fn fail<W: Write>(ctx: &AppContext, error: String, mut writer: W) -> Result<()> {
    ctx.tasks.clear_error();
    print_login_hint(ctx, &mut writer)?;
    Err(anyhow!(error))
}

fn fail_auth(ctx: &AppContext) -> Result<()> {
    let error = ctx.auth.snapshot().error.unwrap_or_default();
    ctx.auth.clear_error();
    Err(anyhow!(error))
}

/// Printed after a failure once the session is gone, whether rejected by the server or never stored.
fn print_login_hint<W: Write>(ctx: &AppContext, mut writer: W) -> Result<()> {
    let state = ctx.auth.snapshot();
    if state.login_required || !ctx.auth.is_authenticated() {
        if state.login_required {
            writeln!(writer, "Your session has expired. {LOGIN_HINT}")?;
            ctx.auth.acknowledge_login_required();
        } else {
            writeln!(writer, "{LOGIN_HINT}")?;
        }
    }
    Ok(())
}

/// Per-id results of one `delete` run. A 404 counts as missing, not as a failure.
#[derive(Default)]
struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
    failed: Vec<(String, String)>,
}

impl DeleteSummary {
    fn record(&mut self, id: &str, outcome: DeleteOutcome) {
        match outcome {
            DeleteOutcome::Deleted => self.deleted += 1,
            DeleteOutcome::NotFound => self.missing.push(id.to_string()),
            DeleteOutcome::Failed(error) => self.failed.push((id.to_string(), error)),
        }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        match self.deleted {
            0 => writeln!(writer, "No tasks deleted")?,
            1 => writeln!(writer, "Deleted 1 task")?,
            count => writeln!(writer, "Deleted {count} tasks")?,
        }
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        for (id, error) in &self.failed {
            writeln!(writer, "Failed: {id} ({error})")?;
        }
        Ok(())
    }
}
