//! Gantt-style placement of tasks on a fixed day grid.
//!
//! Units are abstract: the pixel scale (96 per day, 192 label margin) and the
//! terminal scale from `[timeline]` config go through the same arithmetic.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::config::TimelineConfig;
use crate::model::task::{Task, TaskId, TaskStatus};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineScale {
    pub days: u32,
    pub unit_per_day: i64,
    /// Left margin reserved for the task title column
    pub label_width: i64,
}

impl Default for TimelineScale {
    fn default() -> Self {
        TimelineScale {
            days: 14,
            unit_per_day: 96,
            label_width: 192,
        }
    }
}

impl From<&TimelineConfig> for TimelineScale {
    fn from(cfg: &TimelineConfig) -> Self {
        TimelineScale {
            days: cfg.days.max(1),
            unit_per_day: i64::from(cfg.columns_per_day.max(1)),
            label_width: i64::from(cfg.label_width),
        }
    }
}

/// A task placed on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBar {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub offset: i64,
    pub width: i64,
    pub progress: u8,
}

/// `days` consecutive dates, starting `days / 2` days before `today`
pub fn date_axis(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let start = today - Duration::days(i64::from(days / 2));
    (0..i64::from(days))
        .map(|i| start + Duration::days(i))
        .collect()
}

fn day_diff(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Left edge of a bar starting at `start`. Returns the label width for an empty axis.
pub fn offset(start: NaiveDateTime, axis: &[NaiveDate], scale: &TimelineScale) -> i64 {
    let Some(first) = axis.first() else {
        return scale.label_width;
    };
    let days = day_diff(midnight(*first), start).floor() as i64;
    days * scale.unit_per_day + scale.label_width
}

/// Bar width for a task spanning `start..end`, never negative.
pub fn width(start: NaiveDateTime, end: NaiveDateTime, scale: &TimelineScale) -> i64 {
    let days = day_diff(start, end).ceil() as i64;
    (days * scale.unit_per_day).max(0)
}

/// Position of the "today" marker
pub fn today_offset(now: NaiveDateTime, axis: &[NaiveDate], scale: &TimelineScale) -> i64 {
    offset(now, axis, scale)
}

/// Completion percentage implied by status
pub fn progress(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Done => 100,
        TaskStatus::Review => 80,
        TaskStatus::InProgress => 50,
        TaskStatus::Todo => 0,
    }
}

/// Place every task that has both a creation time and a due date.
///
/// The bar runs from creation to the start of the due day.
pub fn layout(tasks: &[Task], axis: &[NaiveDate], scale: &TimelineScale) -> Vec<TimelineBar> {
    tasks
        .iter()
        .filter_map(|task| {
            let start = task.created_at?;
            let end = midnight(task.due_date?);
            Some(TimelineBar {
                id: task.id.clone(),
                title: task.title.clone(),
                status: task.status,
                offset: offset(start, axis, scale),
                width: width(start, end, scale),
                progress: progress(task.status),
            })
        })
        .collect()
}
