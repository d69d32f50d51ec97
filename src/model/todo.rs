use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Todo priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority '{0}' (expected low, medium or high)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// A single task record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub title: String,
    pub description: String,
    /// Unset when the stored date was empty or unparseable
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub notes: String,
    /// Id of the owning project (a reference, not ownership)
    pub project_id: String,
    pub checklist: Vec<String>,
    pub completed: bool,
}

/// Replacement values for [`Todo::update`].
///
/// A field is applied only when it carries a non-empty value; `None`, `""`
/// and an empty checklist all mean "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
    pub checklist: Option<Vec<String>>,
}

impl TodoUpdate {
    /// True when applying this update would change nothing
    pub fn is_empty(&self) -> bool {
        non_empty(self.title.as_deref()).is_none()
            && non_empty(self.description.as_deref()).is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && non_empty(self.notes.as_deref()).is_none()
            && self.checklist.as_ref().is_none_or(|c| c.is_empty())
    }
}

impl Todo {
    /// Create an incomplete todo with an empty checklist
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: Option<NaiveDate>,
        priority: Priority,
        notes: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Todo {
            title: title.into(),
            description: description.into(),
            due_date,
            priority,
            notes: notes.into(),
            project_id: project_id.into(),
            checklist: Vec::new(),
            completed: false,
        }
    }

    pub fn with_checklist<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.checklist = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
    }

    /// Overwrite fields with the non-empty values of `update`.
    ///
    /// Empty replacements never clear a field. `completed` and `project_id`
    /// are left alone.
    pub fn update(&mut self, update: TodoUpdate) {
        let TodoUpdate {
            title,
            description,
            due_date,
            priority,
            notes,
            checklist,
        } = update;

        if let Some(title) = title.filter(|s| !s.is_empty()) {
            self.title = title;
        }
        if let Some(description) = description.filter(|s| !s.is_empty()) {
            self.description = description;
        }
        if let Some(due_date) = due_date {
            self.due_date = Some(due_date);
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(notes) = notes.filter(|s| !s.is_empty()) {
            self.notes = notes;
        }
        if let Some(checklist) = checklist.filter(|c| !c.is_empty()) {
            self.checklist = checklist;
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Split multi-line checklist text into items, dropping blank lines
pub fn parse_checklist(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Todo {
        Todo::new(
            "Write report",
            "Quarterly numbers",
            NaiveDate::from_ymd_opt(2026, 3, 1),
            Priority::Medium,
            "Ask finance first",
            "p1",
        )
        .with_checklist(["Gather data", "Draft"])
    }

    #[test]
    fn new_todo_is_incomplete() {
        let todo = Todo::new("a", "b", None, Priority::Low, "c", "p1");
        assert!(!todo.completed);
        assert!(todo.checklist.is_empty());
    }

    #[test]
    fn toggle_flips_completed() {
        let mut todo = sample();
        todo.toggle_complete();
        assert!(todo.completed);
        todo.toggle_complete();
        assert!(!todo.completed);
    }

    #[test]
    fn update_ignores_empty_values() {
        let mut todo = sample();
        todo.update(TodoUpdate {
            title: Some(String::new()),
            checklist: Some(Vec::new()),
            ..Default::default()
        });
        assert_eq!(todo, sample());
    }

    #[test]
    fn update_applies_non_empty_values() {
        let mut todo = sample();
        todo.update(TodoUpdate {
            title: Some("Final report".into()),
            priority: Some(Priority::High),
            due_date: NaiveDate::from_ymd_opt(2026, 4, 2),
            checklist: Some(vec!["Send".into()]),
            ..Default::default()
        });
        assert_eq!(todo.title, "Final report");
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.due_date, NaiveDate::from_ymd_opt(2026, 4, 2));
        assert_eq!(todo.checklist, vec!["Send"]);
        // untouched
        assert_eq!(todo.description, "Quarterly numbers");
        assert_eq!(todo.notes, "Ask finance first");
        assert_eq!(todo.project_id, "p1");
    }

    #[test]
    fn update_keeps_completed_state() {
        let mut todo = sample().with_completed(true);
        todo.update(TodoUpdate {
            notes: Some("done already".into()),
            ..Default::default()
        });
        assert!(todo.completed);
    }

    #[test]
    fn empty_update_detection() {
        assert!(TodoUpdate::default().is_empty());
        assert!(
            TodoUpdate {
                title: Some(String::new()),
                checklist: Some(Vec::new()),
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !TodoUpdate {
                priority: Some(Priority::Low),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" medium ".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn checklist_text_drops_blank_lines() {
        let items = parse_checklist("one\n\n   \ntwo\n");
        assert_eq!(items, vec!["one", "two"]);
    }
}
