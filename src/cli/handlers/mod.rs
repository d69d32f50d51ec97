use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use log::info;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::storage::Storage;
use crate::io::store::FileStore;
use crate::model::config::AppConfig;
use crate::model::todo::{TodoUpdate, parse_checklist};
use crate::ops::app_state::{AppState, TodoDraft, View};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs to reach storage
pub struct Context {
    pub data_dir: PathBuf,
    pub key: String,
    pub pretty: bool,
    pub json: bool,
}

impl Context {
    pub fn new(config: &AppConfig, cli: &Cli) -> Self {
        Context {
            data_dir: config_io::resolve_data_dir(config, cli.data_dir.as_deref()),
            key: config.storage.key.clone(),
            pretty: config.storage.pretty,
            json: cli.json,
        }
    }

    fn open_state(&self) -> AppState<FileStore> {
        info!("using data directory {}", self.data_dir.display());
        let store = FileStore::new(self.data_dir.clone());
        let storage = Storage::with_key(store, self.key.clone()).pretty(self.pretty);
        AppState::open(storage)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &AppConfig) -> CmdResult {
    let ctx = Context::new(config, &cli);

    match cli.command {
        None => cmd_list(&ctx, ListArgs::default()),
        Some(cmd) => match cmd {
            // Read commands
            Commands::List(args) => cmd_list(&ctx, args),
            Commands::Show(args) => cmd_show(&ctx, args),
            Commands::Projects => cmd_projects(&ctx),

            // Write commands
            Commands::NewProject(args) => cmd_new_project(&ctx, args),
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Done(args) => cmd_done(&ctx, args),
            Commands::Edit(args) => cmd_edit(&ctx, args),
            Commands::Delete(args) => cmd_delete(&ctx, args),
            Commands::Clear => cmd_clear(&ctx),
        },
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let state = ctx.open_state();
    let view = match args.project {
        Some(id) => View::Project(id),
        None => View::All,
    };
    let listing = state.view(&view);

    if ctx.json {
        print_json(&listing_to_json(&listing))
    } else {
        for line in format_listing(&listing, today()) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_show(ctx: &Context, args: TodoRefArgs) -> CmdResult {
    let state = ctx.open_state();
    let todo = state.todo(&args.project, args.index)?;

    if ctx.json {
        return print_json(&todo_to_json(todo, args.index));
    }
    let project = state
        .project(&args.project)
        .ok_or_else(|| format!("project not found: {}", args.project))?;
    for line in format_todo_detail(todo, project, today()) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_projects(ctx: &Context) -> CmdResult {
    let state = ctx.open_state();

    if ctx.json {
        let projects: Vec<ProjectJson> = state.projects().iter().map(project_to_json).collect();
        return print_json(&projects);
    }
    for project in state.projects() {
        println!("{}", format_project_line(project));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_new_project(ctx: &Context, args: NewProjectArgs) -> CmdResult {
    let mut state = ctx.open_state();
    let project = state.add_project(&args.name)?;

    if ctx.json {
        return print_json(&project_to_json(project));
    }
    println!("{}", project.id);
    Ok(())
}

/// `--check` items followed by the lines of `--checklist`, blanks dropped
fn checklist_items(check: Vec<String>, text: Option<String>) -> Vec<String> {
    check
        .iter()
        .chain(text.iter())
        .flat_map(|item| parse_checklist(item))
        .collect()
}

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let mut state = ctx.open_state();

    let project_id = match args.project {
        Some(id) => id,
        None => state
            .projects()
            .first()
            .map(|p| p.id.clone())
            .ok_or("no projects to add to")?,
    };

    let draft = TodoDraft {
        title: args.title,
        description: args.description.unwrap_or_default(),
        due_date: args.due,
        priority: args.priority,
        notes: args.notes.unwrap_or_default(),
        project_id: project_id.clone(),
        checklist: checklist_items(args.check, args.checklist),
    };
    state.add_todo(draft)?;
    let index = state
        .project(&project_id)
        .map(|p| p.todos().len())
        .unwrap_or_default();

    if ctx.json {
        let todo = state.todo(&project_id, index)?;
        return print_json(&todo_to_json(todo, index));
    }
    println!("{}/{}", project_id, index);
    Ok(())
}

fn cmd_done(ctx: &Context, args: TodoRefArgs) -> CmdResult {
    let mut state = ctx.open_state();
    let completed = state.toggle_todo(&args.project, args.index)?;

    if ctx.json {
        return print_json(&ToggleJson {
            project_id: args.project,
            index: args.index,
            completed,
        });
    }
    let mark = if completed { "done" } else { "not done" };
    println!("{}/{} → {}", args.project, args.index, mark);
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let mut state = ctx.open_state();
    let checklist = checklist_items(args.check, args.checklist);
    let update = TodoUpdate {
        title: args.title,
        description: args.description,
        due_date: args.due,
        priority: args.priority,
        notes: args.notes,
        checklist: (!checklist.is_empty()).then_some(checklist),
    };
    if update.is_empty() {
        eprintln!("nothing to change");
    }
    let target = args.target;
    let todo = state.edit_todo(&target.project, target.index, update)?;

    if ctx.json {
        return print_json(&todo_to_json(todo, target.index));
    }
    println!("{}/{} {}", target.project, target.index, todo.title);
    Ok(())
}

fn cmd_delete(ctx: &Context, args: TodoRefArgs) -> CmdResult {
    let mut state = ctx.open_state();
    let removed = state.delete_todo(&args.project, args.index)?;

    if ctx.json {
        return print_json(&DeleteJson {
            project_id: args.project,
            index: args.index,
            removed,
        });
    }
    if removed > 1 {
        println!("deleted {} todos with the same title", removed);
    } else {
        println!("deleted {}/{}", args.project, args.index);
    }
    Ok(())
}

fn cmd_clear(ctx: &Context) -> CmdResult {
    let mut state = ctx.open_state();
    state.clear()?;

    if ctx.json {
        return print_json(&ClearJson {
            cleared: true,
            key: ctx.key.clone(),
        });
    }
    println!("cleared storage");
    Ok(())
}
