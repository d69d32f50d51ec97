use chrono::NaiveDate;
use serde::Serialize;

use crate::model::project::Project;
use crate::model::todo::{Priority, Todo};
use crate::ops::app_state::{ListedTodo, Listing};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub project_id: String,
    pub index: usize,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub notes: String,
    pub checklist: Vec<String>,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct ListingJson {
    pub heading: String,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub name: String,
    pub todos: usize,
    pub completed: usize,
}

#[derive(Serialize)]
pub struct ToggleJson {
    pub project_id: String,
    pub index: usize,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct DeleteJson {
    pub project_id: String,
    pub index: usize,
    /// Todos removed, counting others in the project with the same title
    pub removed: usize,
}

#[derive(Serialize)]
pub struct ClearJson {
    pub cleared: bool,
    pub key: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo, index: usize) -> TodoJson {
    TodoJson {
        project_id: todo.project_id.clone(),
        index,
        title: todo.title.clone(),
        description: todo.description.clone(),
        due_date: todo.due_date,
        priority: todo.priority,
        notes: todo.notes.clone(),
        checklist: todo.checklist.clone(),
        completed: todo.completed,
    }
}

pub fn listing_to_json(listing: &Listing<'_>) -> ListingJson {
    ListingJson {
        heading: listing.heading.clone(),
        todos: listing
            .todos
            .iter()
            .map(|l| todo_to_json(l.todo, l.index))
            .collect(),
    }
}

pub fn project_to_json(project: &Project) -> ProjectJson {
    ProjectJson {
        id: project.id.clone(),
        name: project.name.clone(),
        todos: project.todos().len(),
        completed: project.todos().iter().filter(|t| t.completed).count(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `MM/DD/YYYY (in N days)` relative to `today`
pub fn format_due(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return "no due date".to_string();
    };
    let days = (due - today).num_days();
    let relative = match days {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        -1 => "1 day ago".to_string(),
        d if d > 0 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    };
    format!("{} ({})", due.format("%m/%d/%Y"), relative)
}

fn check(completed: bool) -> char {
    if completed { 'x' } else { ' ' }
}

/// Format a listed todo as a one-line summary
pub fn format_todo_line(listed: &ListedTodo<'_>, today: NaiveDate) -> String {
    let todo = listed.todo;
    format!(
        "[{}] {}/{} {}  {}  !{}",
        check(todo.completed),
        listed.project.id,
        listed.index,
        todo.title,
        format_due(todo.due_date, today),
        todo.priority,
    )
}

pub fn format_listing(listing: &Listing<'_>, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![listing.heading.clone()];
    if listing.todos.is_empty() {
        lines.push("  (no todos)".to_string());
    }
    for listed in &listing.todos {
        lines.push(format!("  {}", format_todo_line(listed, today)));
    }
    lines
}

/// Format detailed todo view
pub fn format_todo_detail(todo: &Todo, project: &Project, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![format!("[{}] {}", check(todo.completed), todo.title)];
    lines.push(format!("Project:     {} ({})", project.name, project.id));
    lines.push(format!("Due:         {}", format_due(todo.due_date, today)));
    lines.push(format!("Priority:    {}", todo.priority));
    if !todo.description.is_empty() {
        lines.push(format!("Description: {}", todo.description));
    }
    if !todo.notes.is_empty() {
        lines.push(format!("Notes:       {}", todo.notes));
    }
    if !todo.checklist.is_empty() {
        lines.push("Checklist:".to_string());
        for item in &todo.checklist {
            lines.push(format!("  - {}", item));
        }
    }
    lines
}

pub fn format_project_line(project: &Project) -> String {
    let done = project.todos().iter().filter(|t| t.completed).count();
    format!(
        "{}  {}  ({}/{} done)",
        project.id,
        project.name,
        done,
        project.todos().len()
    )
}
