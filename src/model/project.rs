use chrono::Utc;

use super::todo::Todo;

/// Name of the project that must always exist
pub const GENERAL_PROJECT: &str = "General";

/// A named grouping that owns an ordered list of todos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    todos: Vec<Todo>,
}

impl Project {
    /// Create an empty project with a timestamp-derived id
    pub fn new(name: impl Into<String>) -> Self {
        Project::with_id(name, timestamp_id())
    }

    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Project {
            id: id.into(),
            name: name.into(),
            todos: Vec::new(),
        }
    }

    /// Create an empty project whose id collides with none of `existing`
    pub fn new_unique(name: impl Into<String>, existing: &[Project]) -> Self {
        Project::with_id(name, unique_project_id(existing))
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn todos_mut(&mut self) -> &mut [Todo] {
        &mut self.todos
    }

    pub fn add_todo(&mut self, todo: Todo) {
        self.todos.push(todo);
    }

    /// Remove every todo whose title equals `title`.
    ///
    /// Titles are not unique, so this can remove more than one todo.
    /// Returns how many were removed.
    pub fn remove_todo(&mut self, title: &str) -> usize {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.title != title);
        before - self.todos.len()
    }

    pub fn is_general(&self) -> bool {
        self.name == GENERAL_PROJECT
    }
}

fn timestamp_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Timestamp-derived id, bumped until it is unused by `existing`
pub fn unique_project_id(existing: &[Project]) -> String {
    unique_id_avoiding(|id| existing.iter().any(|p| p.id == id))
}

/// Timestamp-derived id, bumped while `taken` reports it in use
pub fn unique_id_avoiding(taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while taken(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
