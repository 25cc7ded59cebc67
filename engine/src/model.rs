//! Task and category records.

use crate::{error::Result, path, style::CategoryStyle, Error, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned to tasks created without one.
pub const DEFAULT_CATEGORY: &str = "Personal";

/// Categories that always exist, in display order.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Personal", "Work", "Shopping", "Health"];

/// Whether `name` is one of the default categories (ignoring case).
pub fn is_default_category(name: &str) -> bool {
    DEFAULT_CATEGORIES
        .iter()
        .any(|default| default.eq_ignore_ascii_case(name))
}

/// Task priority.
///
/// Stored and sent over the wire as `"LOW"`, `"MEDIUM"` or `"HIGH"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Accent color as `#RRGGBB`.
    pub fn color_hex(&self) -> &'static str {
        match self {
            Priority::Low => "#6BCF7F",
            Priority::Medium => "#FFD93D",
            Priority::High => "#FF6B6B",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPriority(s.to_string()))
    }
}

impl TryFrom<String> for Priority {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.as_str().to_string()
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, also the remote leaf key
    #[serde(default)]
    pub id: TaskId,
    /// What needs to be done
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Name of the owning category (loosely associated, not a foreign key)
    #[serde(default = "default_category")]
    pub category: String,
}

impl Task {
    /// Create an open task.
    pub fn new(
        id: impl Into<TaskId>,
        text: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_completed: false,
            priority,
            category: category.into(),
        }
    }

    /// Copy of this task with the completion flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Check the record invariants.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidTask("id must not be empty".into()));
        }
        path::validate_segment(&self.id)
            .map_err(|e| Error::InvalidTask(format!("id '{}': {}", self.id, e)))?;
        if self.text.trim().is_empty() {
            return Err(Error::InvalidTask("text must not be empty".into()));
        }
        path::validate_segment(&self.category)
            .map_err(|e| Error::InvalidTask(format!("category '{}': {}", self.category, e)))?;
        Ok(())
    }
}

/// Input for a task that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub category: String,
}

impl NewTask {
    /// A medium-priority task in the default category.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: Priority::default(),
            category: default_category(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Assign an id, trimming the text and category.
    pub fn into_task(self, id: impl Into<TaskId>) -> Task {
        Task::new(
            id,
            self.text.trim(),
            self.priority,
            self.category.trim(),
        )
    }
}

/// A named category with derived presentation hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub icon_name: String,
    pub color_hex: String,
    /// Cached count; advisory only, recompute from tasks when it matters.
    #[serde(default)]
    pub task_count: u32,
}

impl Category {
    /// Create a category whose icon and color come from the style table.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let style = CategoryStyle::for_name(&name);
        Self {
            icon_name: style.icon.as_str().to_string(),
            color_hex: style.color_hex.to_string(),
            name,
            task_count: 0,
        }
    }

    /// Style derived from the name (ignores the stored hints).
    pub fn style(&self) -> CategoryStyle {
        CategoryStyle::for_name(&self.name)
    }

    /// Validate a category name for use as a key.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidTask("category name must not be empty".into()));
        }
        path::validate_segment(name)
            .map_err(|e| Error::InvalidTask(format!("category '{}': {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!(" Medium ".parse::<Priority>().unwrap(), Priority::Medium);
        assert!(matches!(
            "URGENT".parse::<Priority>(),
            Err(Error::UnknownPriority(_))
        ));
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn task_wire_shape() {
        let task = Task::new("1706745600000", "Buy milk", Priority::High, "Shopping");
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1706745600000",
                "text": "Buy milk",
                "isCompleted": false,
                "priority": "HIGH",
                "category": "Shopping"
            })
        );
    }

    #[test]
    fn task_defaults_when_fields_missing() {
        let task: Task = serde_json::from_value(json!({"id": "1", "text": "Call mom"})).unwrap();
        assert!(!task.is_completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn toggle_twice_restores() {
        let task = Task::new("1", "Run", Priority::Low, "Health");
        let once = task.toggled();
        assert!(once.is_completed);
        assert_eq!(once.toggled(), task);
    }

    #[test]
    fn validate_rejects_blank_text_and_bad_keys() {
        let mut task = Task::new("1", "   ", Priority::Medium, "Work");
        assert!(matches!(task.validate(), Err(Error::InvalidTask(_))));

        task.text = "ok".into();
        assert!(task.validate().is_ok());

        task.category = "a.b".into();
        assert!(task.validate().is_err());

        task.category = "Work".into();
        task.id = String::new();
        assert!(task.validate().is_err());
    }

    #[test]
    fn new_task_trims_input() {
        let task = NewTask::new("  Book flight ")
            .priority(Priority::High)
            .category(" Travel")
            .into_task("42");
        assert_eq!(task.text, "Book flight");
        assert_eq!(task.category, "Travel");
        assert_eq!(task.priority, Priority::High);
        assert!(!task.is_completed);
    }

    #[test]
    fn category_style_is_derived() {
        let category = Category::new("Travel");
        assert_eq!(category.icon_name, "flight");
        assert_eq!(category.color_hex, "#0EA5E9");
        assert_eq!(category.task_count, 0);
        assert!(is_default_category("work"));
        assert!(!is_default_category("Travel"));
    }
}
