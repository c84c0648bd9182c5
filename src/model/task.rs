use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire format for `createdAt` / `updatedAt`
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Opaque task identifier. The backend sends numeric ids, drafts use UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => TaskId(n.to_string()),
            RawId::Text(s) => TaskId(s),
        })
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Numeric ids go back out as numbers so the backend's Long ids bind
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "TODO")]
    Todo,
    #[serde(alias = "IN_PROGRESS")]
    InProgress,
    #[serde(alias = "REVIEW")]
    Review,
    #[serde(alias = "DONE")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Human label ("in progress")
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Next status in the cycle (wraps)
    pub fn next(self) -> TaskStatus {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous status in the cycle (wraps)
    pub fn prev(self) -> TaskStatus {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" | "inprogress" | "active" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!(
                "invalid status '{}' (expected todo, in-progress, review, done)",
                s
            )),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "LOW")]
    Low,
    #[default]
    #[serde(alias = "MEDIUM")]
    Medium,
    #[serde(alias = "HIGH")]
    High,
    #[serde(alias = "CRITICAL")]
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn next(self) -> Priority {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Priority {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" | "crit" => Ok(Priority::Critical),
            _ => Err(format!(
                "invalid priority '{}' (expected low, medium, high, critical)",
                s
            )),
        }
    }
}

/// Story point choices offered by the properties panel (Fibonacci)
pub const STORY_POINTS: [u32; 6] = [1, 2, 3, 5, 8, 13];

/// One comment in a task's activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub user: String,
    pub date: String,
    pub comment: String,
}

/// A task as held by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskWire")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        serialize_with = "serialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<ActivityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Legacy flag from the first backend revision, mirrors `status == done`
    pub completed: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            created_at: None,
            updated_at: None,
            assignee: None,
            story_points: None,
            labels: Vec::new(),
            dependencies: Vec::new(),
            acceptance_criteria: Vec::new(),
            activity: Vec::new(),
            category_id: None,
            completed: false,
        }
    }

    /// Set status and keep the legacy `completed` flag in sync
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.completed = status == TaskStatus::Done;
    }

    /// Add a label; returns false if it was already present
    pub fn add_label(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.labels.iter().any(|l| l == label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l != label);
        self.labels.len() != before
    }

    /// Add a dependency; a task can't depend on itself or twice on the same task
    pub fn add_dependency(&mut self, dep: TaskId) -> bool {
        if dep == self.id || self.dependencies.contains(&dep) {
            return false;
        }
        self.dependencies.push(dep);
        true
    }

    pub fn remove_dependency(&mut self, dep: &TaskId) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d != dep);
        self.dependencies.len() != before
    }

    /// Whether the due date is before `today` (done tasks are never overdue)
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|d| d < today)
    }
}

/// Lenient intermediate form: every backend revision drops different fields
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskWire {
    id: TaskId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    story_points: Option<u32>,
    #[serde(default)]
    labels: Option<Vec<String>>,
    #[serde(default)]
    dependencies: Option<Vec<TaskId>>,
    #[serde(default)]
    acceptance_criteria: Option<Vec<String>>,
    #[serde(default)]
    activity: Option<Vec<ActivityEntry>>,
    #[serde(default)]
    category_id: Option<u64>,
    /// Revisions that embed the whole category send it here instead
    #[serde(default)]
    category: Option<CategoryRef>,
    #[serde(default)]
    completed: Option<bool>,
}

#[derive(Deserialize)]
struct CategoryRef {
    id: u64,
}

impl From<TaskWire> for Task {
    fn from(w: TaskWire) -> Self {
        let completed = w.completed.unwrap_or(false);
        let status = w.status.unwrap_or(if completed {
            TaskStatus::Done
        } else {
            TaskStatus::Todo
        });
        let mut task = Task::new(w.id, w.title.unwrap_or_default());
        task.description = w.description.unwrap_or_default();
        task.set_status(status);
        task.priority = w.priority.unwrap_or_default();
        task.due_date = w.due_date.as_deref().and_then(parse_date);
        task.created_at = w.created_at.as_deref().and_then(parse_datetime);
        task.updated_at = w.updated_at.as_deref().and_then(parse_datetime);
        task.assignee = w.assignee.filter(|a| !a.is_empty());
        task.story_points = w.story_points;
        for label in w.labels.unwrap_or_default() {
            task.add_label(&label);
        }
        for dep in w.dependencies.unwrap_or_default() {
            task.add_dependency(dep);
        }
        task.acceptance_criteria = w.acceptance_criteria.unwrap_or_default();
        task.activity = w.activity.unwrap_or_default();
        task.category_id = w.category_id.or(w.category.map(|c| c.id));
        task
    }
}

/// Parse a due date. Accepts `YYYY-MM-DD` or a full timestamp, keeping the
/// date as written (an offset does not shift it).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

/// Parse a timestamp: RFC 3339, naive ISO (optional fraction), or a bare date
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a timestamp the way it goes out on the wire
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn serialize_datetime<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&format_datetime(dt)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_deserialize() {
        let t: Task = serde_json::from_str(r#"{"id": 42, "title": "A"}"#).unwrap();
        assert_eq!(t.id, TaskId::new("42"));
        let t: Task = serde_json::from_str(r#"{"id": "TASK-7", "title": "B"}"#).unwrap();
        assert_eq!(t.id, "TASK-7");
    }

    #[test]
    fn numeric_id_serializes_as_number() {
        let t = Task::new("42", "A");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["id"], serde_json::json!(42));
        let t = Task::new("TASK-7", "A");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["id"], serde_json::json!("TASK-7"));
        // Leading zeros are not numeric ids
        let t = Task::new("007", "A");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["id"], serde_json::json!("007"));
    }

    #[test]
    fn backend_aliases_parse() {
        let t: Task = serde_json::from_str(
            r#"{"id": 1, "title": "A", "status": "IN_PROGRESS", "priority": "HIGH"}"#,
        )
        .unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.priority, Priority::High);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let t: Task = serde_json::from_str(r#"{"id": 1, "description": null}"#).unwrap();
        assert_eq!(t.title, "");
        assert_eq!(t.description, "");
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.priority, Priority::Medium);
        assert!(t.labels.is_empty());
    }

    #[test]
    fn completed_flag_implies_done() {
        let t: Task = serde_json::from_str(r#"{"id": 1, "completed": true}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Done);
        assert!(t.completed);
    }

    #[test]
    fn dates_are_normalized() {
        let t: Task = serde_json::from_str(
            r#"{"id": 1, "dueDate": "2025-05-10", "createdAt": "2025-05-01T09:30:00.123Z",
                "updatedAt": "2025-05-02T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(t.due_date, NaiveDate::from_ymd_opt(2025, 5, 10));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["dueDate"], "2025-05-10");
        assert_eq!(json["createdAt"], "2025-05-01T09:30:00");
        assert_eq!(json["updatedAt"], "2025-05-02T10:00:00");
    }

    #[test]
    fn due_date_keeps_written_day_despite_offset() {
        assert_eq!(
            parse_date("2025-03-20T00:00:00+02:00"),
            NaiveDate::from_ymd_opt(2025, 3, 20)
        );
        assert_eq!(
            parse_date("2025-03-20T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2025, 3, 20)
        );
        let t: Task =
            serde_json::from_str(r#"{"id": 1, "dueDate": "2025-03-20T00:00:00+02:00"}"#).unwrap();
        assert_eq!(t.due_date, NaiveDate::from_ymd_opt(2025, 3, 20));
    }

    #[test]
    fn nested_category_supplies_id() {
        let t: Task = serde_json::from_str(
            r#"{"id": 1, "category": {"id": 3, "name": "Platform", "color": "blue"}}"#,
        )
        .unwrap();
        assert_eq!(t.category_id, Some(3));
        let t: Task =
            serde_json::from_str(r#"{"id": 1, "categoryId": 4, "category": {"id": 3}}"#).unwrap();
        assert_eq!(t.category_id, Some(4));
        let t: Task = serde_json::from_str(r#"{"id": 1, "category": null}"#).unwrap();
        assert_eq!(t.category_id, None);
    }

    #[test]
    fn duplicate_labels_collapse_on_parse() {
        let t: Task =
            serde_json::from_str(r#"{"id": 1, "labels": ["ui", "ui", "api"]}"#).unwrap();
        assert_eq!(t.labels, vec!["ui", "api"]);
    }

    #[test]
    fn labels_and_dependencies() {
        let mut t = Task::new("1", "A");
        assert!(t.add_label("frontend"));
        assert!(!t.add_label("frontend"));
        assert!(!t.add_label("  "));
        assert!(t.remove_label("frontend"));
        assert!(!t.remove_label("frontend"));

        assert!(!t.add_dependency(TaskId::new("1")));
        assert!(t.add_dependency(TaskId::new("2")));
        assert!(!t.add_dependency(TaskId::new("2")));
        assert!(t.remove_dependency(&TaskId::new("2")));
    }

    #[test]
    fn status_cycle_and_parse() {
        assert_eq!(TaskStatus::Todo.next(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::Done.next(), TaskStatus::Todo);
        assert_eq!(TaskStatus::Todo.prev(), TaskStatus::Done);
        assert_eq!("IN_PROGRESS".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("in progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("later".parse::<TaskStatus>().is_err());
        assert_eq!("CRIT".parse::<Priority>(), Ok(Priority::Critical));
        assert_eq!(Priority::Critical.next(), Priority::Low);
    }

    #[test]
    fn set_status_syncs_completed() {
        let mut t = Task::new("1", "A");
        t.set_status(TaskStatus::Done);
        assert!(t.completed);
        t.set_status(TaskStatus::Review);
        assert!(!t.completed);
    }

    #[test]
    fn overdue() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let mut t = Task::new("1", "A");
        assert!(!t.is_overdue(today));
        t.due_date = NaiveDate::from_ymd_opt(2025, 5, 9);
        assert!(t.is_overdue(today));
        t.set_status(TaskStatus::Done);
        assert!(!t.is_overdue(today));
    }

    #[test]
    fn parse_datetime_variants() {
        assert!(parse_datetime("2025-05-01T09:30:00+02:00").is_some());
        assert!(parse_datetime("2025-05-01 09:30:00").is_some());
        assert_eq!(
            parse_datetime("2025-05-01"),
            NaiveDate::from_ymd_opt(2025, 5, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_datetime("yesterday").is_none());
        assert_eq!(parse_date("2025-05-01T09:30:00Z"), NaiveDate::from_ymd_opt(2025, 5, 1));
    }
}
