//! Running board commands and printing their results

use crate::cli::{BoardCommand, ColumnCommand};
use crate::error::Result;
use crate::table::{new_table, truncate_str};
use chrono::{DateTime, Utc};
use serde::Serialize;
use taskboard_sync::{
    ActivityEntry, BoardStore, Column, ColumnId, ColumnRemoval, Outcome, Task, TaskId, TaskInput,
    TaskUpdate,
};

const TITLE_WIDTH: usize = 48;

/// Where results go: human-readable text or JSON
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the text produced by `human`
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }
}

/// Run one board command against an initialized store
pub async fn run(store: &BoardStore, command: BoardCommand, out: &Output) -> Result<()> {
    match command {
        BoardCommand::Tasks { column } => {
            let tasks = match column {
                Some(column) => store.tasks_in(&ColumnId::from(column)).await,
                None => store.tasks().await,
            };
            let columns = store.columns().await;
            out.emit(&tasks, || render_tasks(&tasks, &columns, Utc::now()))
        }
        BoardCommand::Show { id } => {
            let task = store.fetch_task(&TaskId::from(id)).await?;
            out.emit(&task, || render_task(&task))
        }
        BoardCommand::Add {
            title,
            description,
            status,
            due,
        } => {
            let mut input = TaskInput::new(title);
            input.description = description;
            input.status = status.map(ColumnId::from);
            input.due_date = due;
            let task = store.create_task(input).await?;
            out.emit(&task, || {
                format!("Created task {} in '{}'", task.id, task.status)
            })
        }
        BoardCommand::Update {
            id,
            title,
            description,
            status,
            due,
        } => {
            let update = TaskUpdate {
                title,
                description,
                status: status.map(ColumnId::from),
                due_date: due,
            };
            let task = store.update_task(&TaskId::from(id), update).await?;
            out.emit(&task, || format!("Updated task {}", task.id))
        }
        BoardCommand::Move { id, column } => {
            let task = store
                .move_task(&TaskId::from(id), &ColumnId::from(column))
                .await?;
            out.emit(&task, || format!("Moved task {} to '{}'", task.id, task.status))
        }
        BoardCommand::Delete { id } => {
            let deleted = store.delete_task(&TaskId::from(id)).await?;
            out.emit(&deleted, || format!("Deleted task {deleted}"))
        }
        BoardCommand::Columns => {
            let snapshot = store.snapshot().await;
            let columns = snapshot.columns.list();
            let counts: Vec<usize> = columns
                .iter()
                .map(|c| snapshot.tasks_in(&c.id).count())
                .collect();
            out.emit(&columns, || render_columns(columns, &counts))
        }
        BoardCommand::Column { action } => match action {
            ColumnCommand::Add { title } => {
                let column = store.add_column(&title).await?;
                out.emit(&column, || format!("Added column '{}'", column.title))
            }
            ColumnCommand::Remove { id } => {
                let removal = store.remove_column(&ColumnId::from(id)).await?;
                out.emit(&removal, || render_removal(&removal))
            }
        },
    }
}

pub fn render_tasks(tasks: &[Task], columns: &[Column], now: DateTime<Utc>) -> String {
    if tasks.is_empty() {
        return "No tasks".to_string();
    }

    let mut table = new_table();
    table.set_header(vec!["ID", "Title", "Column", "Due"]);

    // Board order: by column, then as listed
    for column in columns {
        for task in tasks.iter().filter(|t| t.status == column.id) {
            table.add_row(vec![
                task.id.to_string(),
                truncate_str(&task.title, TITLE_WIDTH),
                column.title.clone(),
                due_text(task, now),
            ]);
        }
    }
    table.to_string()
}

fn due_text(task: &Task, now: DateTime<Utc>) -> String {
    match task.due_date {
        Some(due) if task.is_overdue(now) => format!("{} (overdue)", due.format("%Y-%m-%d %H:%M")),
        Some(due) => due.format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

pub fn render_task(task: &Task) -> String {
    let mut table = new_table();
    table.add_row(vec!["ID".to_string(), task.id.to_string()]);
    table.add_row(vec!["Title".to_string(), task.title.clone()]);
    table.add_row(vec![
        "Description".to_string(),
        task.description_text().to_string(),
    ]);
    table.add_row(vec!["Column".to_string(), task.status.to_string()]);
    table.add_row(vec!["Due".to_string(), due_text(task, Utc::now())]);
    table.add_row(vec!["Owner".to_string(), task.owner_id.to_string()]);
    table.add_row(vec!["Created".to_string(), task.created_at.to_rfc3339()]);
    table.add_row(vec!["Updated".to_string(), task.updated_at.to_rfc3339()]);
    table.to_string()
}

pub fn render_columns(columns: &[Column], counts: &[usize]) -> String {
    let mut table = new_table();
    table.set_header(vec!["#", "ID", "Title", "Tasks"]);
    for (i, (column, count)) in columns.iter().zip(counts).enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            column.id.to_string(),
            column.title.clone(),
            count.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_removal(removal: &ColumnRemoval) -> String {
    match removal.relabelled {
        0 => format!("Removed column '{}'", removal.removed),
        1 => format!(
            "Removed column '{}'; moved 1 task to '{}'",
            removal.removed, removal.target
        ),
        n => format!(
            "Removed column '{}'; moved {n} tasks to '{}'",
            removal.removed, removal.target
        ),
    }
}

pub fn render_activity(entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return "No activity".to_string();
    }

    let mut table = new_table();
    table.set_header(vec!["Time", "Operation", "Target", "Outcome", "ms"]);
    for entry in entries {
        let outcome = match &entry.outcome {
            Outcome::Applied => "applied".to_string(),
            Outcome::Rejected { stage, reason } => format!("rejected ({stage:?}): {reason}"),
        };
        table.add_row(vec![
            entry.timestamp.format("%H:%M:%S").to_string(),
            entry.op.clone(),
            entry.target.clone().unwrap_or_default(),
            outcome,
            entry.duration_ms.to_string(),
        ]);
    }
    table.to_string()
}
