//! Task subcommands: create, list, update, complete, delete, stats.
//!
//! Calendar sync follows the stored task state: `--sync true` asks for a
//! linked event, `--sync false` removes one. With no signed-in user
//! (TASKDECK_USER unset) sync is skipped and writes stay local.

use chrono::NaiveDate;
use clap::Subcommand;

use taskdeck_core::{Task, TaskChange, TaskDraft, TaskPriority, TaskStatus};

use crate::commands::common;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// starting, progress or done
        #[arg(long)]
        status: Option<String>,
        /// Create a linked calendar event
        #[arg(long)]
        sync: bool,
    },
    /// List tasks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Update fields on a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// starting, progress or done
        #[arg(long)]
        status: Option<String>,
        /// Whether a linked calendar event should exist (true/false)
        #[arg(long)]
        sync: Option<bool>,
    },
    /// Mark a task done
    Done { id: String },
    /// Delete a task (and its linked calendar event, best-effort)
    Rm { id: String },
    /// Per-status counts and tasks created per day
    Stats {
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mutator = common::mutator()?;
    let user = common::current_user();
    let user = user.as_deref();

    match action {
        TaskAction::Add {
            title,
            description,
            due,
            priority,
            status,
            sync,
        } => {
            let draft = TaskDraft {
                title,
                description,
                status: status
                    .as_deref()
                    .map(str::parse::<TaskStatus>)
                    .transpose()?
                    .unwrap_or_default(),
                priority: priority
                    .as_deref()
                    .map(str::parse::<TaskPriority>)
                    .transpose()?,
                due_date: due.as_deref().map(parse_due).transpose()?,
                sync_to_calendar: sync,
            };
            let task = mutator.create_task(user, draft).await?;
            println!("Task created: {} [{}]", task.title, task.id);
            print_sync_state(&task);
        }
        TaskAction::List { json } => {
            let tasks = mutator.tasks(user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in tasks {
                    println!(
                        "{}  {:<8}  {}{}",
                        task.id,
                        task.status.as_str(),
                        task.title,
                        task.due_date
                            .map(|d| format!("  (due {d})"))
                            .unwrap_or_default()
                    );
                }
            }
        }
        TaskAction::Update {
            id,
            title,
            description,
            due,
            priority,
            status,
            sync,
        } => {
            let current = mutator
                .task(&id)?
                .ok_or_else(|| format!("no task with id {id}"))?;
            let change = TaskChange {
                title: title.unwrap_or(current.title),
                description: description.unwrap_or(current.description),
                status: status
                    .as_deref()
                    .map(str::parse::<TaskStatus>)
                    .transpose()?
                    .unwrap_or(current.status),
                priority: match priority.as_deref() {
                    Some(p) => Some(p.parse::<TaskPriority>()?),
                    None => current.priority,
                },
                due_date: match due.as_deref() {
                    Some(d) => Some(parse_due(d)?),
                    None => current.due_date,
                },
                sync_to_calendar: sync.unwrap_or(current.remote_event_id.is_some()),
            };
            let task = mutator.update_task(user, &id, change).await?;
            println!("Task updated: {} [{}]", task.title, task.id);
            print_sync_state(&task);
        }
        TaskAction::Done { id } => {
            let current = mutator
                .task(&id)?
                .ok_or_else(|| format!("no task with id {id}"))?;
            let change = TaskChange {
                title: current.title,
                description: current.description,
                status: TaskStatus::Done,
                priority: current.priority,
                due_date: current.due_date,
                sync_to_calendar: current.remote_event_id.is_some(),
            };
            let task = mutator.update_task(user, &id, change).await?;
            println!("Task done: {} [{}]", task.title, task.id);
        }
        TaskAction::Rm { id } => {
            mutator.delete_task(user, &id).await?;
            println!("Task deleted: {id}");
        }
        TaskAction::Stats { json } => {
            let counts = mutator.count_by_status(user)?;
            let per_day = mutator.created_per_day(user)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "by_status": counts,
                        "created_per_day": per_day,
                    }))?
                );
            } else {
                println!(
                    "starting: {}  progress: {}  done: {}",
                    counts.starting, counts.progress, counts.done
                );
                for day in per_day {
                    println!("{:>6}  {}", day.date, "#".repeat(day.count));
                }
            }
        }
    }

    Ok(())
}

fn parse_due(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => Err(format!("invalid due date '{raw}', expected YYYY-MM-DD").into()),
    }
}

fn print_sync_state(task: &Task) {
    if let Some(event_id) = &task.remote_event_id {
        println!("Calendar event: {event_id}");
    }
}
