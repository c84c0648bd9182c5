use chrono::{NaiveDate, NaiveDateTime};

use crate::model::task::{Priority, Task, TaskId, TaskStatus, parse_date};

/// Error type for form validation. Raised before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidValue(String),
}

/// Editable fields of the new-task form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    DueDate,
    Priority,
    Status,
    Assignee,
    Labels,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::Title,
        DraftField::Description,
        DraftField::DueDate,
        DraftField::Priority,
        DraftField::Status,
        DraftField::Assignee,
        DraftField::Labels,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DraftField::Title => "Title",
            DraftField::Description => "Description",
            DraftField::DueDate => "Due date",
            DraftField::Priority => "Priority",
            DraftField::Status => "Status",
            DraftField::Assignee => "Assignee",
            DraftField::Labels => "Labels",
        }
    }

    /// Fields that cycle through fixed choices instead of taking text
    pub fn is_choice(self) -> bool {
        matches!(self, DraftField::Priority | DraftField::Status)
    }
}

/// A task that has not been sent to the backend yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingField("title"));
        }
        Ok(())
    }

    /// Current text of a field, as shown in the form
    pub fn field_text(&self, field: DraftField) -> String {
        match field {
            DraftField::Title => self.title.clone(),
            DraftField::Description => self.description.clone(),
            DraftField::DueDate => self
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            DraftField::Priority => self.priority.to_string(),
            DraftField::Status => self.status.to_string(),
            DraftField::Assignee => self.assignee.clone().unwrap_or_default(),
            DraftField::Labels => self.labels.join(", "),
        }
    }

    /// Set a field from user text. Empty text clears optional fields.
    pub fn set_field(&mut self, field: DraftField, text: &str) -> Result<(), FormError> {
        let trimmed = text.trim();
        match field {
            DraftField::Title => self.title = trimmed.to_string(),
            DraftField::Description => self.description = text.to_string(),
            DraftField::DueDate => {
                self.due_date = if trimmed.is_empty() {
                    None
                } else {
                    Some(parse_date(trimmed).ok_or_else(|| FormError::InvalidDate(trimmed.into()))?)
                };
            }
            DraftField::Priority => {
                self.priority = trimmed.parse().map_err(FormError::InvalidValue)?;
            }
            DraftField::Status => {
                self.status = trimmed.parse().map_err(FormError::InvalidValue)?;
            }
            DraftField::Assignee => {
                self.assignee = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            DraftField::Labels => {
                self.labels.clear();
                for label in trimmed.split(',') {
                    let label = label.trim();
                    if !label.is_empty() && !self.labels.iter().any(|l| l == label) {
                        self.labels.push(label.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// Step a choice field forward
    pub fn cycle(&mut self, field: DraftField) {
        match field {
            DraftField::Priority => self.priority = self.priority.next(),
            DraftField::Status => self.status = self.status.next(),
            _ => {}
        }
    }

    /// Validate and build the task with a fresh id and timestamps
    pub fn into_task(self, now: NaiveDateTime) -> Result<Task, FormError> {
        self.validate()?;
        let mut task = Task::new(
            TaskId::new(uuid::Uuid::new_v4().to_string()),
            self.title.trim(),
        );
        task.description = self.description;
        task.due_date = self.due_date;
        task.priority = self.priority;
        task.set_status(self.status);
        task.assignee = self.assignee;
        for label in &self.labels {
            task.add_label(label);
        }
        task.created_at = Some(now);
        task.updated_at = Some(now);
        Ok(task)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormError> {
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FormError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("password", &self.password)
    }
}
