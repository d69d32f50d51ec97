use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::todo::Priority;

#[derive(Parser)]
#[command(
    name = "jot",
    about = concat!("jot v", env!("CARGO_PKG_VERSION"), " - projects, todos, checklists"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List todos across all projects, or in one project
    List(ListArgs),
    /// Show todo details
    Show(TodoRefArgs),
    /// List projects
    Projects,
    /// Create a project
    NewProject(NewProjectArgs),
    /// Add a todo to a project
    Add(AddArgs),
    /// Toggle a todo's completion
    Done(TodoRefArgs),
    /// Edit a todo (empty values leave a field unchanged)
    Edit(EditArgs),
    /// Delete a todo (and any others in its project with the same title)
    Delete(TodoRefArgs),
    /// Remove all stored data
    Clear,
}

#[derive(Args, Default)]
pub struct ListArgs {
    /// Project ID to list (default: all projects)
    #[arg(long)]
    pub project: Option<String>,
}

/// A todo addressed by project ID and position
#[derive(Args)]
pub struct TodoRefArgs {
    /// Project ID
    pub project: String,
    /// Position of the todo within the project (1-based)
    pub index: usize,
}

#[derive(Args)]
pub struct NewProjectArgs {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Todo title
    pub title: String,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
    /// low, medium or high
    #[arg(long, short = 'p', default_value = "low")]
    pub priority: Priority,
    #[arg(long, short = 'n')]
    pub notes: Option<String>,
    /// Project ID (default: the first project)
    #[arg(long)]
    pub project: Option<String>,
    /// Checklist item (repeatable)
    #[arg(long)]
    pub check: Vec<String>,
    /// Checklist as text, one item per line
    #[arg(long)]
    pub checklist: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: TodoRefArgs,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
    #[arg(long, short = 'n')]
    pub notes: Option<String>,
    /// Replacement checklist item (repeatable; replaces the whole list)
    #[arg(long)]
    pub check: Vec<String>,
    /// Replacement checklist as text, one item per line
    #[arg(long)]
    pub checklist: Option<String>,
}
