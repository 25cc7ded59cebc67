//! Pull planning: deciding which remote records the local side adopts.
//!
//! Local existence wins. A remote record whose id is already known locally is
//! never applied, whatever its content; only records with new ids are
//! inserted. This is a set difference by identity, not a merge, and running
//! it twice against the same remote snapshot plans nothing the second time.

use crate::{
    error::Result,
    is_default_category,
    style::CategoryStyle,
    wire::{self, DecodedTasks},
    Category, RemotePath, Task, DEFAULT_CATEGORIES,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Which part of the `tasks` subtree a pull covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncScope {
    /// Every category, plus legacy flat leaves
    All,
    /// A single `tasks/{name}` node
    Category(String),
}

impl SyncScope {
    pub fn category(name: impl Into<String>) -> Self {
        SyncScope::Category(name.into())
    }

    /// Remote path the scope reads from.
    pub fn path(&self) -> Result<RemotePath> {
        match self {
            SyncScope::All => Ok(RemotePath::tasks_root()),
            SyncScope::Category(name) => RemotePath::task_category(name),
        }
    }

    /// Decode a snapshot of [`SyncScope::path`].
    pub fn decode(&self, value: &Value) -> DecodedTasks {
        match self {
            SyncScope::All => wire::decode_all_tasks(value),
            SyncScope::Category(name) => wire::decode_category_tasks(name, value),
        }
    }
}

/// Outcome of planning one pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullPlan {
    /// Candidates whose ids are unknown locally, in snapshot order
    pub inserts: Vec<Task>,
    /// Candidates skipped because the id exists locally
    pub already_known: usize,
    /// Candidates skipped because an earlier one had the same id
    pub duplicates: usize,
}

impl PullPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }
}

/// Plan which `candidates` to insert given the ids already stored locally.
///
/// Within `candidates` the first occurrence of an id wins.
pub fn plan_pull<'a, I>(local_ids: I, candidates: Vec<Task>) -> PullPlan
where
    I: IntoIterator<Item = &'a str>,
{
    let known: HashSet<&str> = local_ids.into_iter().collect();
    let mut seen = HashSet::new();
    let mut plan = PullPlan::default();

    for task in candidates {
        if known.contains(task.id.as_str()) {
            plan.already_known += 1;
        } else if !seen.insert(task.id.clone()) {
            plan.duplicates += 1;
        } else {
            plan.inserts.push(task);
        }
    }
    plan
}

/// Remote category names that have no local record yet, as new categories.
///
/// Identity is the exact name. Default categories always exist and are never
/// planned; invalid and repeated names are skipped.
pub fn plan_category_pull<'a, L, R>(local_names: L, remote_names: R) -> Vec<Category>
where
    L: IntoIterator<Item = &'a str>,
    R: IntoIterator<Item = &'a str>,
{
    let mut known: HashSet<&str> = local_names.into_iter().collect();
    remote_names
        .into_iter()
        .filter(|name| !is_default_category(name) && Category::validate_name(name).is_ok())
        .filter(|name| known.insert(*name))
        .map(Category::new)
        .collect()
}

/// One row of the category overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub style: CategoryStyle,
    /// Tasks in this category, completed ones included
    pub task_count: usize,
    pub completed_count: usize,
    pub is_default: bool,
}

/// Build the category overview from the stored categories and tasks.
///
/// Defaults come first, then stored categories that are not defaults (case
/// is ignored when comparing against defaults), then categories only named
/// by tasks. Counts are recomputed from `tasks`; cached counts are ignored.
pub fn category_overview(categories: &[Category], tasks: &[Task]) -> Vec<CategorySummary> {
    let mut names: Vec<&str> = DEFAULT_CATEGORIES.to_vec();
    let mut seen: HashSet<&str> = names.iter().copied().collect();

    let stored = categories
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| !is_default_category(name));
    let implied = tasks.iter().map(|t| t.category.as_str());

    for name in stored.chain(implied) {
        if seen.insert(name) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .map(|name| {
            let (task_count, completed_count) = tasks
                .iter()
                .filter(|t| t.category == name)
                .fold((0, 0), |(all, done), t| {
                    (all + 1, done + usize::from(t.is_completed))
                });
            CategorySummary {
                name: name.to_string(),
                style: CategoryStyle::for_name(name),
                task_count,
                completed_count,
                is_default: DEFAULT_CATEGORIES.contains(&name),
            }
        })
        .collect()
}

/// Tasks in `category` (`None` for all) whose text contains `query`,
/// ignoring case. An empty query matches every task. Order is preserved.
pub fn filter_tasks(tasks: &[Task], category: Option<&str>, query: &str) -> Vec<Task> {
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|t| category.map_or(true, |name| t.category == name))
        .filter(|t| needle.is_empty() || t.text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;
    use serde_json::json;

    fn task(id: &str, text: &str, category: &str) -> Task {
        Task::new(id, text, Priority::Medium, category)
    }

    #[test]
    fn scope_paths() {
        assert_eq!(SyncScope::All.path().unwrap().to_string(), "tasks");
        assert_eq!(
            SyncScope::category("Work").path().unwrap().to_string(),
            "tasks/Work"
        );
        assert!(SyncScope::category("a.b").path().is_err());
    }

    #[test]
    fn scope_decode_forces_category() {
        let value = json!({"1": {"id": "1", "text": "x", "category": "Home"}});
        let decoded = SyncScope::category("Work").decode(&value);
        assert_eq!(decoded.tasks[0].category, "Work");
    }

    #[test]
    fn local_existence_wins() {
        let local = [task("T1", "A", "Personal")];
        let remote = vec![task("T1", "B", "Personal"), task("T2", "C", "Work")];

        let plan = plan_pull(local.iter().map(|t| t.id.as_str()), remote);

        assert_eq!(plan.inserts, vec![task("T2", "C", "Work")]);
        assert_eq!(plan.already_known, 1);
        assert_eq!(plan.duplicates, 0);
    }

    #[test]
    fn pulling_the_same_snapshot_twice_plans_nothing() {
        let remote = vec![task("1", "a", "Work"), task("2", "b", "Work")];
        let first = plan_pull(std::iter::empty(), remote.clone());
        assert_eq!(first.inserts.len(), 2);

        let second = plan_pull(first.inserts.iter().map(|t| t.id.as_str()), remote);
        assert!(second.is_empty());
        assert_eq!(second.already_known, 2);
    }

    #[test]
    fn first_duplicate_wins() {
        let remote = vec![task("1", "from Work", "Work"), task("1", "from Home", "Home")];
        let plan = plan_pull(std::iter::empty(), remote);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].text, "from Work");
        assert_eq!(plan.duplicates, 1);
    }

    #[test]
    fn category_pull_adopts_unknown_names() {
        let planned = plan_category_pull(
            ["Travel"],
            ["Travel", "Food", "Food", "bad.name", "travel", "Work", "health"],
        );
        let names: Vec<_> = planned.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Food", "travel"]);
        assert_eq!(planned[0].icon_name, "restaurant");
    }

    #[test]
    fn overview_counts_include_completed() {
        let mut work = Category::new("Work");
        work.task_count = 99;
        let tasks = vec![
            task("1", "a", "Work"),
            task("2", "b", "Work").toggled(),
            task("3", "c", "Work"),
            task("4", "d", "Personal"),
        ];

        let overview = category_overview(&[work], &tasks);
        let work = overview.iter().find(|s| s.name == "Work").unwrap();
        assert_eq!(work.task_count, 3);
        assert_eq!(work.completed_count, 1);
        assert!(work.is_default);
    }

    #[test]
    fn overview_ordering() {
        let categories = vec![
            Category::new("Travel"),
            Category::new("work"),
            Category::new("Travel"),
        ];
        let tasks = vec![task("1", "a", "Garden"), task("2", "b", "Travel")];

        let names: Vec<_> = category_overview(&categories, &tasks)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec!["Personal", "Work", "Shopping", "Health", "Travel", "Garden"]
        );
    }

    fn ids(tasks: Vec<Task>) -> Vec<String> {
        tasks.into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn empty_query_keeps_everything_in_scope() {
        let tasks = vec![task("1", "Report", "Work"), task("2", "Run", "Health")];
        assert_eq!(ids(filter_tasks(&tasks, None, "")), vec!["1", "2"]);
        assert_eq!(ids(filter_tasks(&tasks, Some("Health"), "")), vec!["2"]);
        assert!(filter_tasks(&tasks, Some("Travel"), "").is_empty());
    }

    #[test]
    fn query_ignores_case() {
        let tasks = vec![
            task("1", "Buy MILK", "Shopping"),
            task("2", "milkshake", "Personal"),
            task("3", "Bread", "Shopping"),
        ];
        assert_eq!(ids(filter_tasks(&tasks, None, "Milk")), vec!["1", "2"]);
        assert_eq!(ids(filter_tasks(&tasks, None, "BREAD")), vec!["3"]);
        assert!(filter_tasks(&tasks, None, "cheese").is_empty());
    }

    #[test]
    fn category_and_query_combine() {
        let tasks = vec![
            task("1", "Call mom", "Personal"),
            task("2", "Call client", "Work"),
            task("3", "Email client", "Work"),
        ];
        assert_eq!(ids(filter_tasks(&tasks, Some("Work"), "call")), vec!["2"]);
        assert_eq!(ids(filter_tasks(&tasks, Some("Personal"), "client")), Vec::<String>::new());
        // Category names match exactly
        assert!(filter_tasks(&tasks, Some("work"), "").is_empty());
    }

    #[test]
    fn empty_overview_lists_defaults() {
        let overview = category_overview(&[], &[]);
        assert_eq!(overview.len(), DEFAULT_CATEGORIES.len());
        assert!(overview.iter().all(|s| s.task_count == 0 && s.is_default));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_task() -> impl Strategy<Value = Task> {
            (1u64..50, "[a-z]{1,8}", prop_oneof![Just("Work"), Just("Home")]).prop_map(
                |(id, text, category)| Task::new(id.to_string(), text, Priority::Low, category),
            )
        }

        proptest! {
            #[test]
            fn prop_pull_is_idempotent(
                local in prop::collection::vec(arb_task(), 0..20),
                remote in prop::collection::vec(arb_task(), 0..20),
            ) {
                let first = plan_pull(local.iter().map(|t| t.id.as_str()), remote.clone());

                let mut after: Vec<&str> = local.iter().map(|t| t.id.as_str()).collect();
                after.extend(first.inserts.iter().map(|t| t.id.as_str()));
                let second = plan_pull(after, remote.clone());

                prop_assert!(second.is_empty());
                prop_assert_eq!(
                    first.inserts.len() + first.already_known + first.duplicates,
                    remote.len()
                );
            }

            #[test]
            fn prop_pull_never_touches_known_ids(
                local in prop::collection::vec(arb_task(), 0..20),
                remote in prop::collection::vec(arb_task(), 0..20),
            ) {
                let plan = plan_pull(local.iter().map(|t| t.id.as_str()), remote);
                for task in &plan.inserts {
                    prop_assert!(local.iter().all(|l| l.id != task.id));
                }
            }
        }
    }
}
