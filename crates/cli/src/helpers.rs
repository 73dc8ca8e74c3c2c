use chrono::{DateTime, Local, Utc};

use taskdeck_core::model::Task;

/// One list row: completion marker, title, priority, due day, id.
pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let marker = if task.is_completed { '✓' } else { ' ' };
    let mut components = vec![format!("[{}] {}", marker, task.title)];
    components.push(format!("({})", task.priority));

    if let Some(day) = task.due_day() {
        if task.is_overdue(now) {
            components.push(format!("due:{} overdue", day.format("%Y-%m-%d")));
        } else {
            components.push(format!("due:{}", day.format("%Y-%m-%d")));
        }
    }

    components.push(format!("#{}", task.id));
    components.join(" ")
}

pub fn format_task_detail_entries(task: &Task, now: DateTime<Utc>) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    entries.push((String::from("Title"), task.title.clone()));
    entries.push((
        String::from("Status"),
        if task.is_completed {
            "Completed".to_string()
        } else {
            "Active".to_string()
        },
    ));
    entries.push((String::from("ID"), task.id.clone()));
    entries.push((String::from("Priority"), task.priority.to_string()));

    if let Some(day) = task.due_day() {
        let mut due = day.format("%Y-%m-%d").to_string();
        if task.is_overdue(now) {
            due.push_str(" (overdue)");
        }
        entries.push((String::from("Due"), due));
    }
    entries.push((
        String::from("Created"),
        format_opt_datetime(Some(&task.created_at)),
    ));
    entries.push((
        String::from("Updated"),
        format_opt_datetime(Some(&task.updated_at)),
    ));

    if let Some(description) = &task.description {
        if !description.trim().is_empty() {
            entries.push((String::from("Description"), description.clone()));
        }
    }

    entries
}

pub fn format_opt_datetime(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|dt| {
            let local: DateTime<Local> = (*dt).into();
            local.format("%Y-%m-%d %H:%M").to_string()
        })
        .unwrap_or_default()
}
