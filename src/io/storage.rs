//! Persistence and reconciliation of the project/todo graph.
//!
//! The whole graph lives as one JSON array under a single store key. Loading
//! never hands back unusable data: absent or malformed values are replaced by
//! a default "General" project, and a "General" project with at least one
//! todo is guaranteed to exist afterwards. Whatever `load` returns has
//! already been written back, unless the store could not be read at all, in
//! which case nothing is written.

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::io::store::{KeyValueStore, StoreError};
use crate::model::config::DEFAULT_STORAGE_KEY;
use crate::model::project::{GENERAL_PROJECT, Project, unique_id_avoiding};
use crate::model::todo::{Priority, Todo};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StoredProject<'a> {
    id: &'a str,
    name: &'a str,
    todos: Vec<StoredTodo<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredTodo<'a> {
    title: &'a str,
    description: &'a str,
    /// `YYYY-MM-DD`, or empty when unset
    due_date: String,
    priority: Priority,
    notes: &'a str,
    project_id: &'a str,
    checklist: &'a [String],
    completed: bool,
}

impl<'a> StoredProject<'a> {
    fn from_project(project: &'a Project) -> Self {
        StoredProject {
            id: &project.id,
            name: &project.name,
            todos: project
                .todos()
                .iter()
                .map(|todo| StoredTodo {
                    title: &todo.title,
                    description: &todo.description,
                    due_date: todo
                        .due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    priority: todo.priority,
                    notes: &todo.notes,
                    project_id: &todo.project_id,
                    checklist: &todo.checklist,
                    completed: todo.completed,
                })
                .collect(),
        }
    }
}

/// Serialize projects into the stored array shape
pub fn serialize_projects(projects: &[Project], pretty: bool) -> Result<String, StoreError> {
    let stored: Vec<StoredProject<'_>> =
        projects.iter().map(StoredProject::from_project).collect();
    let text = if pretty {
        serde_json::to_string_pretty(&stored)?
    } else {
        serde_json::to_string(&stored)?
    };
    Ok(text)
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_due_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.get("dueDate").and_then(Value::as_str)?;
    // Accept full ISO timestamps by keeping only the date part
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn todo_from_value(value: &Value, owner_id: &str) -> Todo {
    let priority = value
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let checklist: Vec<String> = value
        .get("checklist")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let completed = value
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let title = str_field(value, "title");
    let stored_owner = str_field(value, "projectId");
    if stored_owner != owner_id {
        debug!(
            "re-pointing todo '{}' from project '{}' to owner '{}'",
            title, stored_owner, owner_id
        );
    }

    Todo::new(
        title,
        str_field(value, "description"),
        parse_due_date(value),
        priority,
        str_field(value, "notes"),
        owner_id,
    )
    .with_checklist(checklist)
    .with_completed(completed)
}

/// Rebuild projects from a parsed stored value.
///
/// Returns `None` when the value is not an array. Entries that are not
/// objects are dropped; missing fields fall back to empty defaults. A
/// project without an id gets one no other stored project uses.
pub fn reconstruct(value: &Value) -> Option<Vec<Project>> {
    let entries = value.as_array()?;
    let mut taken: Vec<String> = entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    let mut projects: Vec<Project> = Vec::with_capacity(entries.len());

    for entry in entries {
        if !entry.is_object() {
            warn!("dropping stored project entry that is not an object");
            continue;
        }
        let id = match entry.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = unique_id_avoiding(|candidate| taken.iter().any(|t| t == candidate));
                taken.push(id.clone());
                id
            }
        };
        let mut project = Project::with_id(str_field(entry, "name"), id);
        if let Some(todos) = entry.get("todos").and_then(Value::as_array) {
            let owner_id = project.id.clone();
            for todo in todos {
                project.add_todo(todo_from_value(todo, &owner_id));
            }
        }
        projects.push(project);
    }

    Some(projects)
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// The three onboarding todos seeded into an empty "General" project
pub fn canned_todos(project_id: &str, today: NaiveDate) -> Vec<Todo> {
    vec![
        Todo::new(
            "Create project",
            "Create a new project to organize tasks",
            Some(today),
            Priority::Low,
            "Use the Add New Project button",
            project_id,
        )
        .with_checklist(["Open project popup", "Enter project name", "Save project"]),
        Todo::new(
            "Create todo",
            "Add a new todo to a project",
            Some(today),
            Priority::Medium,
            "Use the Add Todo button",
            project_id,
        )
        .with_checklist(["Open todo popup", "Fill in details", "Save todo"]),
        Todo::new(
            "Play with UI todos, edit, mark as done, delete todo",
            "Experiment with todo features in the UI",
            Some(today),
            Priority::High,
            "Try editing, completing, and deleting todos",
            project_id,
        )
        .with_checklist(["Edit a todo", "Mark a todo as done", "Delete a todo"]),
    ]
}

fn seed_defaults(project: &mut Project) {
    let today = Utc::now().date_naive();
    for todo in canned_todos(&project.id, today) {
        project.add_todo(todo);
    }
}

/// A fresh "General" project holding the canned todos
pub fn default_projects() -> Vec<Project> {
    let mut general = Project::new(GENERAL_PROJECT);
    seed_defaults(&mut general);
    vec![general]
}

/// Guarantee a "General" project with at least one todo.
///
/// Returns `(added_general, seeded_defaults)`.
pub fn ensure_general(projects: &mut Vec<Project>) -> (bool, bool) {
    let mut added = false;
    let index = match projects.iter().position(Project::is_general) {
        Some(i) => i,
        None => {
            let general = Project::new_unique(GENERAL_PROJECT, projects);
            projects.push(general);
            added = true;
            projects.len() - 1
        }
    };

    let general = &mut projects[index];
    let seeded = general.todos().is_empty();
    if seeded {
        seed_defaults(general);
    }
    (added, seeded)
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// What `load` found in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored; defaults were created
    Initialized,
    /// The stored value was unusable; defaults replaced it
    Reset,
    /// The store could not be read; defaults were returned but not saved
    Unreadable,
    /// The stored graph was reconstructed, possibly patched
    Restored {
        added_general: bool,
        seeded_defaults: bool,
    },
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub projects: Vec<Project>,
    pub outcome: LoadOutcome,
}

/// Persists the project graph under one key of a [`KeyValueStore`]
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
    key: String,
    pretty: bool,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Storage::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Storage {
            store,
            key: key.into(),
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key under which an unusable stored value is preserved
    pub fn backup_key(&self) -> String {
        format!("{}.bak", self.key)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the whole graph to the storage slot
    pub fn save(&mut self, projects: &[Project]) -> Result<(), StoreError> {
        let text = serialize_projects(projects, self.pretty)?;
        self.store.set(&self.key, &text)?;
        debug!("saved {} project(s) under '{}'", projects.len(), self.key);
        Ok(())
    }

    /// Remove the stored value entirely
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(&self.key)?;
        info!("cleared storage key '{}'", self.key);
        Ok(())
    }

    /// Load, repair and re-save the graph
    pub fn load(&mut self) -> Vec<Project> {
        self.load_report().projects
    }

    /// Like [`Storage::load`], also reporting what was found
    pub fn load_report(&mut self) -> LoadReport {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw,
            Err(e @ StoreError::NotUtf8 { .. }) => {
                warn!("{}, resetting to default", e);
                self.backup();
                return self.reset_to_defaults(LoadOutcome::Reset);
            }
            Err(e) => {
                warn!("{}; using defaults without saving", e);
                return LoadReport {
                    projects: default_projects(),
                    outcome: LoadOutcome::Unreadable,
                };
            }
        };

        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            info!("no stored data, creating default project");
            return self.reset_to_defaults(LoadOutcome::Initialized);
        };

        let parsed = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => reconstruct(&value),
            Err(e) => {
                warn!("stored data is not valid JSON: {}", e);
                None
            }
        };

        let Some(mut projects) = parsed else {
            warn!("invalid stored projects, resetting to default");
            self.backup();
            return self.reset_to_defaults(LoadOutcome::Reset);
        };

        let (added_general, seeded_defaults) = ensure_general(&mut projects);
        if added_general {
            info!("added missing {} project", GENERAL_PROJECT);
        }
        if seeded_defaults {
            info!("added default todos to {} project", GENERAL_PROJECT);
        }
        self.write_through(&projects);

        LoadReport {
            projects,
            outcome: LoadOutcome::Restored {
                added_general,
                seeded_defaults,
            },
        }
    }

    fn reset_to_defaults(&mut self, outcome: LoadOutcome) -> LoadReport {
        let projects = default_projects();
        self.write_through(&projects);
        LoadReport { projects, outcome }
    }

    fn write_through(&mut self, projects: &[Project]) {
        if let Err(e) = self.save(projects) {
            warn!("could not write repaired data back to '{}': {}", self.key, e);
        }
    }

    fn backup(&mut self) {
        let backup_key = self.backup_key();
        match self.store.copy(&self.key, &backup_key) {
            Ok(()) => warn!("unusable stored data preserved under '{}'", backup_key),
            Err(e) => warn!("could not back up unusable data to '{}': {}", backup_key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn storage_with(raw: &str) -> Storage<MemoryStore> {
        Storage::new(MemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, raw))
    }

    fn titles(project: &Project) -> Vec<&str> {
        project.todos().iter().map(|t| t.title.as_str()).collect()
    }

    fn stored(storage: &Storage<MemoryStore>) -> Value {
        let raw = storage.store().get(storage.key()).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn missing_value_creates_and_persists_defaults() {
        let mut storage = Storage::new(MemoryStore::new());
        let report = storage.load_report();

        assert_eq!(report.outcome, LoadOutcome::Initialized);
        assert_eq!(report.projects.len(), 1);
        let general = &report.projects[0];
        assert_eq!(general.name, "General");
        assert_eq!(
            titles(general),
            vec![
                "Create project",
                "Create todo",
                "Play with UI todos, edit, mark as done, delete todo"
            ]
        );
        assert!(general.todos().iter().all(|t| t.project_id == general.id));

        let value = stored(&storage);
        assert_eq!(value[0]["name"], "General");
        assert_eq!(value[0]["todos"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn non_json_value_resets_and_keeps_backup() {
        let mut storage = storage_with("not json {{{");
        let report = storage.load_report();

        assert_eq!(report.outcome, LoadOutcome::Reset);
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.projects[0].todos().len(), 3);
        assert_eq!(
            storage.store().get("todoApp.bak").unwrap().as_deref(),
            Some("not json {{{")
        );
    }

    #[test]
    fn non_array_json_resets() {
        for raw in [r#"{"id":"p1"}"#, "42", "\"text\"", "null"] {
            let mut storage = storage_with(raw);
            let projects = storage.load();
            assert_eq!(projects.len(), 1, "input {}", raw);
            assert!(projects[0].is_general());
            assert_eq!(projects[0].todos().len(), 3);
        }
    }

    #[test]
    fn empty_array_gets_general_with_defaults() {
        let mut storage = storage_with("[]");
        let report = storage.load_report();

        assert_eq!(
            report.outcome,
            LoadOutcome::Restored {
                added_general: true,
                seeded_defaults: true
            }
        );
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.projects[0].todos().len(), 3);
        assert_eq!(stored(&storage).as_array().unwrap().len(), 1);
    }

    #[test]
    fn general_is_appended_after_existing_projects() {
        let mut storage = storage_with(r#"[{"id":"p1","name":"Work","todos":[]}]"#);
        let projects = storage.load();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, "p1");
        assert_eq!(projects[0].name, "Work");
        assert!(projects[0].todos().is_empty());
        assert_eq!(projects[1].name, "General");
        assert_eq!(projects[1].todos().len(), 3);
        assert_ne!(projects[1].id, "p1");
    }

    #[test]
    fn empty_general_is_seeded_in_place() {
        let mut storage = storage_with(r#"[{"id":"g","name":"General"}]"#);
        let projects = storage.load();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "g");
        assert_eq!(projects[0].todos().len(), 3);
        assert!(projects[0].todos().iter().all(|t| t.project_id == "g"));
    }

    #[test]
    fn populated_general_is_left_alone() {
        let raw = r#"[{"id":"g","name":"General","todos":[
            {"title":"Mine","description":"d","dueDate":"2026-01-02","priority":"high",
             "notes":"n","projectId":"g","checklist":["a"],"completed":true}
        ]}]"#;
        let mut storage = storage_with(raw);
        let report = storage.load_report();

        assert_eq!(
            report.outcome,
            LoadOutcome::Restored {
                added_general: false,
                seeded_defaults: false
            }
        );
        let todo = &report.projects[0].todos()[0];
        assert_eq!(todo.title, "Mine");
        assert_eq!(todo.due_date, NaiveDate::from_ymd_opt(2026, 1, 2));
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.checklist, vec!["a"]);
        assert!(todo.completed);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let raw = r#"[{"id":"g","name":"General","todos":[
            {"title":"Bare","checklist":"oops","completed":"yes",
             "priority":"urgent","dueDate":"soon"}
        ]}, 7, {"name":"No id","todos":{}}]"#;
        let mut storage = storage_with(raw);
        let projects = storage.load();

        assert_eq!(projects.len(), 2);
        let todo = &projects[0].todos()[0];
        assert_eq!(todo.title, "Bare");
        assert_eq!(todo.description, "");
        assert!(todo.checklist.is_empty());
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Low);
        assert_eq!(todo.due_date, None);

        assert_eq!(projects[1].name, "No id");
        assert!(!projects[1].id.is_empty());
        assert!(projects[1].todos().is_empty());
    }

    #[test]
    fn unreadable_store_is_not_overwritten() {
        let mut storage = Storage::new(MemoryStore::unreadable());
        let report = storage.load_report();

        assert_eq!(report.outcome, LoadOutcome::Unreadable);
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.projects[0].todos().len(), 3);
        assert!(storage.store().is_empty());
    }

    #[test]
    fn missing_ids_avoid_ids_stored_later() {
        let now = Utc::now().timestamp_millis();
        let mut entries = vec![serde_json::json!({"name": "No id"})];
        entries.extend((0..500).map(|n| {
            serde_json::json!({"id": (now + n).to_string(), "name": format!("P{}", n)})
        }));
        let projects = reconstruct(&Value::Array(entries)).unwrap();

        let mut ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 501);
        assert!(!projects[0].id.is_empty());
    }

    #[test]
    fn todos_are_repointed_at_their_owner() {
        let raw = r#"[{"id":"g","name":"General","todos":[
            {"title":"t","projectId":"elsewhere"}
        ]}]"#;
        let mut storage = storage_with(raw);
        let projects = storage.load();
        assert_eq!(projects[0].todos()[0].project_id, "g");
        assert_eq!(stored(&storage)[0]["todos"][0]["projectId"], "g");
    }

    #[test]
    fn timestamp_due_dates_keep_the_date() {
        let raw = r#"[{"id":"g","name":"General","todos":[
            {"title":"t","dueDate":"2026-05-06T10:00:00.000Z"}
        ]}]"#;
        let projects = storage_with(raw).load();
        assert_eq!(
            projects[0].todos()[0].due_date,
            NaiveDate::from_ymd_opt(2026, 5, 6)
        );
    }

    #[test]
    fn load_twice_is_identical() {
        let mut storage = storage_with(r#"[{"id":"p1","name":"Work","todos":[]}]"#);
        let first = storage.load();
        let second = storage.load();
        assert_eq!(first, second);
    }

    #[test]
    fn save_writes_flat_camel_case_shape() {
        let mut project = Project::with_id("Work", "p1");
        project.add_todo(
            Todo::new(
                "Ship",
                "Release it",
                NaiveDate::from_ymd_opt(2026, 2, 3),
                Priority::Medium,
                "",
                "p1",
            )
            .with_checklist(["tag", "publish"]),
        );
        let mut storage = Storage::new(MemoryStore::new());
        storage.save(&[project]).unwrap();

        let value = stored(&storage);
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "p1",
                "name": "Work",
                "todos": [{
                    "title": "Ship",
                    "description": "Release it",
                    "dueDate": "2026-02-03",
                    "priority": "medium",
                    "notes": "",
                    "projectId": "p1",
                    "checklist": ["tag", "publish"],
                    "completed": false
                }]
            }])
        );
    }

    #[test]
    fn unset_due_date_is_stored_as_empty_string() {
        let mut project = Project::with_id("Work", "p1");
        project.add_todo(Todo::new("t", "", None, Priority::Low, "", "p1"));
        let text = serialize_projects(&[project], false).unwrap();
        assert!(text.contains(r#""dueDate":"""#));
    }

    #[test]
    fn save_surfaces_write_failure() {
        let mut storage = Storage::new(MemoryStore::failing());
        let result = storage.save(&default_projects());
        assert!(matches!(result, Err(StoreError::ReadOnly)));
    }

    #[test]
    fn load_still_returns_defaults_when_write_through_fails() {
        let mut storage = Storage::new(MemoryStore::failing());
        let projects = storage.load();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].todos().len(), 3);
    }

    #[test]
    fn clear_removes_the_value() {
        let mut storage = storage_with("[]");
        storage.clear().unwrap();
        assert_eq!(storage.store().get("todoApp").unwrap(), None);
    }

    #[test]
    fn custom_key_is_used() {
        let mut storage = Storage::with_key(MemoryStore::new(), "other");
        storage.load();
        assert!(storage.store().get("other").unwrap().is_some());
        assert!(storage.store().get("todoApp").unwrap().is_none());
    }

    #[test]
    fn canned_todos_use_today_and_owner() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let todos = canned_todos("g", today);
        assert_eq!(todos.len(), 3);
        assert!(todos.iter().all(|t| t.due_date == Some(today)));
        assert!(todos.iter().all(|t| t.project_id == "g" && !t.completed));
        assert_eq!(
            todos.iter().map(|t| t.priority).collect::<Vec<_>>(),
            vec![Priority::Low, Priority::Medium, Priority::High]
        );
        assert_eq!(
            todos[1].checklist,
            vec!["Open todo popup", "Fill in details", "Save todo"]
        );
    }
}
