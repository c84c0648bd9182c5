use chrono::NaiveDate;
use serde::Serialize;

use crate::model::category::{Category, category_name};
use crate::model::task::{Priority, Task, TaskStatus, format_datetime};
use crate::ops::explorer::TaskGroup;
use crate::ops::timeline::{TimelineBar, TimelineScale};
use crate::util::unicode::{display_width, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Serialize)]
pub struct GroupJson {
    pub id: String,
    pub title: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TimelineJson {
    pub start: String,
    pub days: u32,
    pub bars: Vec<TimelineBar>,
}

pub fn task_to_json(task: &Task, categories: &[Category]) -> TaskJson {
    TaskJson {
        id: task.id.to_string(),
        title: task.title.clone(),
        status: task.status,
        priority: task.priority,
        due_date: task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        assignee: task.assignee.clone(),
        story_points: task.story_points,
        labels: task.labels.clone(),
        dependencies: task.dependencies.iter().map(|d| d.to_string()).collect(),
        category: task
            .category_id
            .map(|id| category_name(categories, id).map_or(format!("#{}", id), str::to_string)),
        description: task.description.clone(),
        created_at: task.created_at.as_ref().map(format_datetime),
        updated_at: task.updated_at.as_ref().map(format_datetime),
    }
}

pub fn groups_to_json(groups: &[TaskGroup], categories: &[Category]) -> Vec<GroupJson> {
    groups
        .iter()
        .map(|g| GroupJson {
            id: g.id.to_string(),
            title: g.title.to_string(),
            tasks: g.tasks.iter().map(|t| task_to_json(t, categories)).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn status_char(status: TaskStatus) -> char {
    match status {
        TaskStatus::Todo => ' ',
        TaskStatus::InProgress => '>',
        TaskStatus::Review => '?',
        TaskStatus::Done => 'x',
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("[{}] {} {}", status_char(task.status), task.id, task.title);
    if matches!(task.priority, Priority::High | Priority::Critical) {
        line.push_str(&format!(" !{}", task.priority));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due:{}", due.format("%Y-%m-%d")));
    }
    for label in &task.labels {
        line.push_str(&format!(" #{}", label));
    }
    line
}

/// Format the status groups, skipping empty ones
pub fn format_groups(groups: &[TaskGroup]) -> Vec<String> {
    let mut lines = Vec::new();
    for group in groups.iter().filter(|g| !g.tasks.is_empty()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("== {} ({}) ==", group.title, group.tasks.len()));
        lines.extend(group.tasks.iter().map(|t| format_task_line(t)));
    }
    lines
}

/// Format detailed task view
pub fn format_task_detail(task: &Task, categories: &[Category]) -> Vec<String> {
    let mut lines = vec![format!("[{}] {} {}", status_char(task.status), task.id, task.title)];

    lines.push(format!("status: {}", task.status));
    lines.push(format!("priority: {}", task.priority));
    if let Some(due) = task.due_date {
        lines.push(format!("due: {}", due.format("%Y-%m-%d")));
    }
    if let Some(assignee) = &task.assignee {
        lines.push(format!("assignee: {}", assignee));
    }
    if let Some(points) = task.story_points {
        lines.push(format!("points: {}", points));
    }
    if let Some(id) = task.category_id {
        let name = category_name(categories, id).map_or(format!("#{}", id), str::to_string);
        lines.push(format!("category: {}", name));
    }
    if !task.labels.is_empty() {
        lines.push(format!(
            "labels: {}",
            task.labels
                .iter()
                .map(|l| format!("#{}", l))
                .collect::<Vec<_>>()
                .join(" ")
        ));
    }
    if !task.dependencies.is_empty() {
        lines.push(format!(
            "depends on: {}",
            task.dependencies
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if let Some(created) = &task.created_at {
        lines.push(format!("created: {}", format_datetime(created)));
    }
    if let Some(updated) = &task.updated_at {
        lines.push(format!("updated: {}", format_datetime(updated)));
    }

    if !task.description.is_empty() {
        lines.push(String::new());
        lines.extend(task.description.lines().map(str::to_string));
    }
    if !task.acceptance_criteria.is_empty() {
        lines.push(String::new());
        lines.push("acceptance criteria:".to_string());
        lines.extend(task.acceptance_criteria.iter().map(|c| format!("  [ ] {}", c)));
    }
    if !task.activity.is_empty() {
        lines.push(String::new());
        lines.push("activity:".to_string());
        for entry in &task.activity {
            lines.push(format!("  {} ({}): {}", entry.user, entry.date, entry.comment));
        }
    }
    lines
}

/// Text rendering of the timeline: a date header and one bar per task.
/// `today_col` marks the current day with `|` where no bar covers it.
pub fn format_timeline(
    bars: &[TimelineBar],
    axis: &[NaiveDate],
    scale: &TimelineScale,
    today_col: i64,
) -> Vec<String> {
    let label_width = scale.label_width.max(0) as usize;
    let unit = scale.unit_per_day.max(1) as usize;
    let width = label_width + axis.len() * unit;

    let mut header: Vec<char> = vec![' '; width];
    for (i, day) in axis.iter().enumerate() {
        let text = day.format(if unit >= 7 { "%a %d" } else { "%d" }).to_string();
        let col = label_width + i * unit;
        for (k, c) in truncate_to_width(&text, unit.saturating_sub(1).max(2)).chars().enumerate() {
            if let Some(cell) = header.get_mut(col + k) {
                *cell = c;
            }
        }
    }
    let mut lines = vec![header.into_iter().collect::<String>().trim_end().to_string()];

    for bar in bars {
        let mut row: Vec<char> = vec![' '; width];
        if let Ok(col) = usize::try_from(today_col)
            && col < width
        {
            row[col] = '|';
        }
        let title = truncate_to_width(&bar.title, label_width.saturating_sub(1));
        // One cell per char; combining marks would otherwise run into the bars
        for (k, c) in title.chars().take(label_width.saturating_sub(1)).enumerate() {
            row[k] = c;
        }
        let bar_width = bar.width.max(1);
        let filled = bar_width * i64::from(bar.progress) / 100;
        for k in 0..bar_width {
            let col = bar.offset + k;
            if col < label_width as i64 || col >= width as i64 {
                continue;
            }
            row[col as usize] = if k < filled { '#' } else { '=' };
        }
        let line: String = row.into_iter().collect();
        lines.push(format!("{} {}%", line.trim_end(), bar.progress));
    }
    lines
}

/// Categories as `id  name`
pub fn format_categories(categories: &[Category]) -> Vec<String> {
    let id_width = categories
        .iter()
        .map(|c| display_width(&c.id.to_string()))
        .max()
        .unwrap_or(0);
    categories
        .iter()
        .map(|c| format!("{:>w$}  {}", c.id, c.name, w = id_width))
        .collect()
}
