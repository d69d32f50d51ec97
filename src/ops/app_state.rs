use chrono::NaiveDate;
use log::{debug, error};

use crate::io::storage::{LoadOutcome, Storage};
use crate::io::store::{KeyValueStore, StoreError};
use crate::model::project::{GENERAL_PROJECT, Project};
use crate::model::todo::{Priority, Todo, TodoUpdate};

/// Heading used for the cross-project view
pub const ALL_TODOS_HEADING: &str = "All Todos";

/// Error type for application-state operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("todo {index} not found in project {project_id}")]
    TodoNotFound { project_id: String, index: usize },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("project name cannot be empty")]
    EmptyProjectName,
    #[error("storage '{0}' could not be read; refusing to overwrite it")]
    Unreadable(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for a new todo, validated before it becomes a [`Todo`]
#[derive(Debug, Clone, Default)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub notes: String,
    pub project_id: String,
    pub checklist: Vec<String>,
}

impl TodoDraft {
    /// Every field except the checklist must be filled in
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::MissingField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::MissingField("description"));
        }
        if self.due_date.is_none() {
            return Err(AppError::MissingField("due date"));
        }
        if self.notes.trim().is_empty() {
            return Err(AppError::MissingField("notes"));
        }
        if self.project_id.trim().is_empty() {
            return Err(AppError::MissingField("project"));
        }
        Ok(())
    }

    fn into_todo(self) -> Todo {
        Todo::new(
            self.title,
            self.description,
            self.due_date,
            self.priority,
            self.notes,
            self.project_id,
        )
        .with_checklist(self.checklist)
    }
}

/// Which todos a listing shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    All,
    Project(String),
}

/// A todo in a listing, with the address used to act on it
#[derive(Debug, Clone, Copy)]
pub struct ListedTodo<'a> {
    pub project: &'a Project,
    /// 1-based position within the project
    pub index: usize,
    pub todo: &'a Todo,
}

#[derive(Debug, Clone)]
pub struct Listing<'a> {
    pub heading: String,
    pub todos: Vec<ListedTodo<'a>>,
}

/// The in-memory project list plus the storage it is flushed to.
///
/// Every mutating operation saves the whole graph before returning. If the
/// store could not be read on open, mutations fail instead.
#[derive(Debug)]
pub struct AppState<S> {
    storage: Storage<S>,
    projects: Vec<Project>,
    writable: bool,
}

impl<S: KeyValueStore> AppState<S> {
    /// Load (and repair) the stored projects
    pub fn open(mut storage: Storage<S>) -> Self {
        let report = storage.load_report();
        AppState {
            storage,
            projects: report.projects,
            writable: report.outcome != LoadOutcome::Unreadable,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_index(&self, id: &str) -> Result<usize, AppError> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::ProjectNotFound(id.to_string()))
    }

    fn ensure_writable(&self) -> Result<(), AppError> {
        if self.writable {
            Ok(())
        } else {
            Err(AppError::Unreadable(self.storage.key().to_string()))
        }
    }

    fn flush(&mut self) -> Result<(), AppError> {
        self.ensure_writable()?;
        self.storage.save(&self.projects)?;
        Ok(())
    }

    /// Look up a todo by project id and 1-based position
    pub fn todo(&self, project_id: &str, index: usize) -> Result<&Todo, AppError> {
        let project = &self.projects[self.project_index(project_id)?];
        index
            .checked_sub(1)
            .and_then(|i| project.todos().get(i))
            .ok_or_else(|| AppError::TodoNotFound {
                project_id: project_id.to_string(),
                index,
            })
    }

    fn todo_mut(&mut self, project_id: &str, index: usize) -> Result<&mut Todo, AppError> {
        let pi = self.project_index(project_id)?;
        let todos = self.projects[pi].todos_mut();
        match index.checked_sub(1) {
            Some(i) if i < todos.len() => Ok(&mut todos[i]),
            _ => Err(AppError::TodoNotFound {
                project_id: project_id.to_string(),
                index,
            }),
        }
    }

    pub fn add_project(&mut self, name: &str) -> Result<&Project, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::EmptyProjectName);
        }
        let project = Project::new_unique(name, &self.projects);
        debug!("adding project '{}' ({})", project.name, project.id);
        self.projects.push(project);
        self.flush()?;
        Ok(&self.projects[self.projects.len() - 1])
    }

    pub fn add_todo(&mut self, draft: TodoDraft) -> Result<&Todo, AppError> {
        draft.validate()?;
        let pi = self.project_index(&draft.project_id)?;
        debug!("adding todo '{}' to project {}", draft.title, draft.project_id);
        self.projects[pi].add_todo(draft.into_todo());
        self.flush()?;
        let todos = self.projects[pi].todos();
        Ok(&todos[todos.len() - 1])
    }

    /// Flip a todo's completion; returns the new state
    pub fn toggle_todo(&mut self, project_id: &str, index: usize) -> Result<bool, AppError> {
        let todo = self.todo_mut(project_id, index)?;
        todo.toggle_complete();
        let completed = todo.completed;
        self.flush()?;
        Ok(completed)
    }

    pub fn edit_todo(
        &mut self,
        project_id: &str,
        index: usize,
        update: TodoUpdate,
    ) -> Result<&Todo, AppError> {
        self.todo_mut(project_id, index)?.update(update);
        self.flush()?;
        self.todo(project_id, index)
    }

    /// Delete the todo at `index` from the project it references.
    ///
    /// Removal goes by title, so every todo in that project sharing the
    /// title goes with it. Returns how many todos were removed.
    pub fn delete_todo(&mut self, project_id: &str, index: usize) -> Result<usize, AppError> {
        let todo = self.todo(project_id, index)?;
        let owner_id = todo.project_id.clone();
        let title = todo.title.clone();

        let Some(owner) = self.projects.iter_mut().find(|p| p.id == owner_id) else {
            error!("project not found for todo '{}'", title);
            return Err(AppError::ProjectNotFound(owner_id));
        };
        let removed = owner.remove_todo(&title);
        debug!("removed {} todo(s) titled '{}'", removed, title);
        self.flush()?;
        Ok(removed)
    }

    /// Wipe storage and start over with an empty "General" project.
    ///
    /// The canned todos come back on the next load.
    pub fn clear(&mut self) -> Result<(), AppError> {
        self.ensure_writable()?;
        self.storage.clear()?;
        self.projects = vec![Project::new(GENERAL_PROJECT)];
        self.flush()
    }

    pub fn view(&self, view: &View) -> Listing<'_> {
        match view {
            View::All => Listing {
                heading: ALL_TODOS_HEADING.to_string(),
                todos: self.projects.iter().flat_map(listed).collect(),
            },
            View::Project(id) => match self.project(id) {
                Some(project) => Listing {
                    heading: project.name.clone(),
                    todos: listed(project).collect(),
                },
                None => Listing {
                    heading: ALL_TODOS_HEADING.to_string(),
                    todos: Vec::new(),
                },
            },
        }
    }
}

fn listed(project: &Project) -> impl Iterator<Item = ListedTodo<'_>> {
    project
        .todos()
        .iter()
        .enumerate()
        .map(move |(i, todo)| ListedTodo {
            project,
            index: i + 1,
            todo,
        })
}
