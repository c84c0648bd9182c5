use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::model::task::{Task, TaskStatus};

/// A named group of tasks in the explorer
#[derive(Debug, Clone, Serialize)]
pub struct TaskGroup<'a> {
    pub id: &'static str,
    pub title: &'static str,
    pub tasks: Vec<&'a Task>,
}

/// Group definitions, in display order
pub const GROUPS: [(&str, &str, &[TaskStatus]); 3] = [
    (
        "current-sprint",
        "Current Sprint",
        &[TaskStatus::InProgress, TaskStatus::Review],
    ),
    ("backlog", "Backlog", &[TaskStatus::Todo]),
    ("done", "Done", &[TaskStatus::Done]),
];

/// Partition tasks into explorer groups, keeping backend order inside each group.
pub fn group_tasks<'a>(tasks: &'a [Task], query: Option<&Regex>) -> Vec<TaskGroup<'a>> {
    GROUPS
        .iter()
        .map(|&(id, title, statuses)| TaskGroup {
            id,
            title,
            tasks: tasks
                .iter()
                .filter(|t| statuses.contains(&t.status))
                .filter(|t| query.is_none_or(|re| task_matches(t, re)))
                .collect(),
        })
        .collect()
}

/// Compile a case-insensitive filter. Invalid patterns match literally.
pub fn compile_query(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", pattern))
        .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
        .ok()
}

/// Whether a task's id, title, labels or assignee match the filter
pub fn task_matches(task: &Task, re: &Regex) -> bool {
    re.is_match(task.id.as_str())
        || re.is_match(&task.title)
        || task.labels.iter().any(|l| re.is_match(l))
        || task.assignee.as_deref().is_some_and(|a| re.is_match(a))
}

/// One visible row of the explorer tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerRow {
    Group {
        id: &'static str,
        expanded: bool,
        count: usize,
    },
    Task {
        group: &'static str,
        index: usize,
    },
}

/// Expand/collapse state and cursor for the explorer panel
#[derive(Debug, Clone)]
pub struct ExplorerState {
    pub expanded: HashSet<String>,
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Active filter text (empty = none)
    pub query: String,
}

impl Default for ExplorerState {
    fn default() -> Self {
        let mut expanded = HashSet::new();
        expanded.insert("current-sprint".to_string());
        ExplorerState {
            expanded,
            cursor: 0,
            scroll_offset: 0,
            query: String::new(),
        }
    }
}

impl ExplorerState {
    pub fn is_expanded(&self, group_id: &str) -> bool {
        self.expanded.contains(group_id)
    }

    pub fn toggle(&mut self, group_id: &str) {
        if !self.expanded.remove(group_id) {
            self.expanded.insert(group_id.to_string());
        }
    }

    /// Flatten the groups into visible rows, honoring expand state
    pub fn rows(&self, groups: &[TaskGroup]) -> Vec<ExplorerRow> {
        let mut rows = Vec::new();
        for group in groups {
            let expanded = self.is_expanded(group.id);
            rows.push(ExplorerRow::Group {
                id: group.id,
                expanded,
                count: group.tasks.len(),
            });
            if expanded {
                for index in 0..group.tasks.len() {
                    rows.push(ExplorerRow::Task {
                        group: group.id,
                        index,
                    });
                }
            }
        }
        rows
    }

    pub fn clamp_cursor(&mut self, row_count: usize) {
        self.cursor = self.cursor.min(row_count.saturating_sub(1));
    }
}

/// Resolve a task row back to the task it shows
pub fn row_task<'a>(groups: &[TaskGroup<'a>], row: &ExplorerRow) -> Option<&'a Task> {
    match row {
        ExplorerRow::Task { group, index } => groups
            .iter()
            .find(|g| g.id == *group)
            .and_then(|g| g.tasks.get(*index).copied()),
        ExplorerRow::Group { .. } => None,
    }
}
