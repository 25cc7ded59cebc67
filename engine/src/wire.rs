//! Encoding records into, and decoding them out of, the remote tree.
//!
//! Task leaves live at `tasks/{category}/{id}` and hold the full task:
//!
//! ```json
//! { "id": "1706745600000", "text": "Buy milk", "isCompleted": false,
//!   "priority": "MEDIUM", "category": "Shopping" }
//! ```
//!
//! Category records live at `categories/{name}`. Decoding never fails as a
//! whole: leaves that cannot be read are collected as
//! [`Error::MalformedRecord`] next to the tasks that could.

use crate::{
    error::Result, is_default_category, path, Error, Task, Timestamp, CATEGORIES_ROOT, TASKS_ROOT,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Metadata record stored at `categories/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub name: String,
    /// Creation time in epoch milliseconds
    #[serde(default)]
    pub created: Timestamp,
    #[serde(default)]
    pub is_custom: bool,
    /// Advisory only
    #[serde(default)]
    pub task_count: u32,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>, created: Timestamp) -> Self {
        let name = name.into();
        Self {
            is_custom: !is_default_category(&name),
            name,
            created,
            task_count: 0,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "created": self.created,
            "isCustom": self.is_custom,
            "taskCount": self.task_count,
        })
    }
}

/// Tasks read out of a subtree, plus the leaves that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTasks {
    pub tasks: Vec<Task>,
    pub malformed: Vec<Error>,
}

impl DecodedTasks {
    fn extend(&mut self, other: DecodedTasks) {
        self.tasks.extend(other.tasks);
        self.malformed.extend(other.malformed);
    }
}

/// Serialize a task for its remote leaf.
pub fn encode_task(task: &Task) -> Value {
    json!({
        "id": task.id,
        "text": task.text,
        "isCompleted": task.is_completed,
        "priority": task.priority.as_str(),
        "category": task.category,
    })
}

/// Decode one task leaf stored under `key`.
///
/// A leaf without an `id` takes its key as id.
pub fn decode_task(key: &str, value: &Value) -> Result<Task> {
    decode_leaf(key, key, value, None)
}

fn decode_leaf(key: &str, label: &str, value: &Value, category: Option<&str>) -> Result<Task> {
    if !value.is_object() {
        return Err(Error::malformed(label, "expected an object"));
    }
    let mut task: Task =
        serde_json::from_value(value.clone()).map_err(|e| Error::malformed(label, e))?;
    if task.id.is_empty() {
        task.id = key.to_string();
    }
    if let Some(category) = category {
        task.category = category.to_string();
    }
    task.validate().map_err(|e| Error::malformed(label, e))?;
    Ok(task)
}

/// Decode the children of `tasks/{category}`.
///
/// Every decoded task is placed in `category`, whatever its leaf says.
pub fn decode_category_tasks(category: &str, value: &Value) -> DecodedTasks {
    let mut decoded = DecodedTasks::default();
    let map = match value {
        Value::Null => return decoded,
        Value::Object(map) => map,
        _ => {
            decoded.malformed.push(Error::malformed(
                format!("{}/{}", TASKS_ROOT, category),
                "expected an object of tasks",
            ));
            return decoded;
        }
    };

    for (key, leaf) in map {
        let label = format!("{}/{}/{}", TASKS_ROOT, category, key);
        match decode_leaf(key, &label, leaf, Some(category)) {
            Ok(task) => decoded.tasks.push(task),
            Err(e) => decoded.malformed.push(e),
        }
    }
    decoded
}

/// Decode the whole `tasks` subtree.
///
/// Children are normally category nodes. A child that is itself a task (an
/// object whose `text` is a string) is a leaf written directly under
/// `tasks/{id}` by older clients and is accepted as-is.
pub fn decode_all_tasks(value: &Value) -> DecodedTasks {
    let mut decoded = DecodedTasks::default();
    let map = match value {
        Value::Null => return decoded,
        Value::Object(map) => map,
        _ => {
            decoded
                .malformed
                .push(Error::malformed(TASKS_ROOT, "expected an object of categories"));
            return decoded;
        }
    };

    for (key, child) in map {
        if is_flat_task_leaf(child) {
            let label = format!("{}/{}", TASKS_ROOT, key);
            match decode_leaf(key, &label, child, None) {
                Ok(task) => decoded.tasks.push(task),
                Err(e) => decoded.malformed.push(e),
            }
        } else if let Err(e) = path::validate_segment(key) {
            decoded
                .malformed
                .push(Error::malformed(format!("{}/{}", TASKS_ROOT, key), e));
        } else {
            decoded.extend(decode_category_tasks(key, child));
        }
    }
    decoded
}

fn is_flat_task_leaf(value: &Value) -> bool {
    value.get("text").is_some_and(Value::is_string)
}

/// Category names found under `categories`, in key order.
pub fn decode_category_names(value: &Value) -> (Vec<String>, Vec<Error>) {
    let mut names = Vec::new();
    let mut malformed = Vec::new();
    let Value::Object(map) = value else {
        if !value.is_null() {
            malformed.push(Error::malformed(CATEGORIES_ROOT, "expected an object"));
        }
        return (names, malformed);
    };

    for key in map.keys() {
        match path::validate_segment(key) {
            Ok(()) => names.push(key.clone()),
            Err(e) => malformed.push(Error::malformed(format!("{}/{}", CATEGORIES_ROOT, key), e)),
        }
    }
    (names, malformed)
}

/// Category names implied by the `tasks` subtree (its category nodes).
pub fn category_names_in_tasks(value: &Value) -> Vec<String> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    map.iter()
        .filter(|(key, child)| {
            child.is_object() && !is_flat_task_leaf(child) && path::validate_segment(key).is_ok()
        })
        .map(|(key, _)| key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;

    #[test]
    fn encode_matches_serde_shape() {
        let task = Task::new("1", "Report", Priority::High, "Work");
        assert_eq!(encode_task(&task), serde_json::to_value(&task).unwrap());
    }

    #[test]
    fn decode_uses_key_when_id_missing() {
        let task = decode_task("77", &json!({"text": "Water plants"})).unwrap();
        assert_eq!(task.id, "77");
        assert_eq!(task.category, crate::DEFAULT_CATEGORY);
    }

    #[test]
    fn decode_rejects_non_objects_and_blank_text() {
        assert!(matches!(
            decode_task("1", &json!("just a string")),
            Err(Error::MalformedRecord { .. })
        ));
        assert!(decode_task("1", &json!({"id": "1", "text": ""})).is_err());
        assert!(decode_task("1", &json!({"id": "1", "text": "x", "priority": "URGENT"})).is_err());
        assert!(decode_task("1", &json!({"id": "1"})).is_err());
    }

    #[test]
    fn category_tasks_forced_into_scope() {
        let value = json!({
            "1": {"id": "1", "text": "Report", "category": "Home"},
            "2": {"text": "Standup"},
            "3": 42
        });
        let decoded = decode_category_tasks("Work", &value);

        assert_eq!(decoded.tasks.len(), 2);
        assert!(decoded.tasks.iter().all(|t| t.category == "Work"));
        assert_eq!(decoded.tasks[1].id, "2");
        assert_eq!(decoded.malformed.len(), 1);
        assert!(matches!(
            &decoded.malformed[0],
            Error::MalformedRecord { key, .. } if key == "tasks/Work/3"
        ));
    }

    #[test]
    fn all_tasks_accepts_flat_leaves() {
        let value = json!({
            "Work": {"1": {"id": "1", "text": "Report", "category": "Work"}},
            "99": {"id": "99", "text": "Old layout", "category": "Shopping"},
            "Home": "marker"
        });
        let decoded = decode_all_tasks(&value);

        let ids: Vec<_> = decoded.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "99"]);
        assert_eq!(decoded.tasks[1].category, "Shopping");
        assert_eq!(decoded.malformed.len(), 1);
    }

    #[test]
    fn null_subtrees_are_empty() {
        assert_eq!(decode_all_tasks(&Value::Null), DecodedTasks::default());
        assert_eq!(
            decode_category_tasks("Work", &Value::Null),
            DecodedTasks::default()
        );
        assert_eq!(decode_category_names(&Value::Null), (vec![], vec![]));
    }

    #[test]
    fn category_records() {
        let record = CategoryRecord::new("Travel", 1_706_745_600_000);
        assert!(record.is_custom);
        assert_eq!(
            record.to_value(),
            json!({"name": "Travel", "created": 1_706_745_600_000u64, "isCustom": true, "taskCount": 0})
        );
        assert!(!CategoryRecord::new("work", 0).is_custom);

        let (names, malformed) =
            decode_category_names(&json!({"Travel": record.to_value(), "Food": true}));
        assert_eq!(names, vec!["Food".to_string(), "Travel".to_string()]);
        assert!(malformed.is_empty());
    }

    #[test]
    fn implied_category_names() {
        let value = json!({
            "Work": {"1": {"text": "a"}},
            "42": {"text": "flat leaf"},
            "Empty": 1
        });
        assert_eq!(category_names_in_tasks(&value), vec!["Work".to_string()]);
    }
}
