//! The task workspace: every fetched task, the subset open as tabs, and the
//! focused tab.
//!
//! All three views are owned here and every mutation goes through a method
//! that updates them together, so a panel reading `tasks()` and one reading
//! `open_tasks()` never disagree about a task's contents.

use chrono::NaiveDate;

use crate::model::task::{Task, TaskId};

/// Error type for workspace operations. State is left unchanged on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    #[error("task not found: {0}")]
    UnknownTask(TaskId),
    #[error("task is not open: {0}")]
    NotOpen(TaskId),
    #[error("no task is active")]
    NoActiveTask,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    tasks: Vec<Task>,
    /// Open tab ids, in tab order
    open: Vec<TaskId>,
    active: Option<TaskId>,
}

impl Workspace {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut ws = Workspace::default();
        ws.replace_all(tasks);
        ws
    }

    /// All tasks, in backend order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Open tasks, in tab order
    pub fn open_tasks(&self) -> Vec<&Task> {
        self.open.iter().filter_map(|id| self.task(id)).collect()
    }

    pub fn open_ids(&self) -> &[TaskId] {
        &self.open
    }

    pub fn is_open(&self, id: &TaskId) -> bool {
        self.open.contains(id)
    }

    pub fn active_id(&self) -> Option<&TaskId> {
        self.active.as_ref()
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref().and_then(|id| self.task(id))
    }

    /// Position of the active tab in the tab strip
    pub fn active_index(&self) -> Option<usize> {
        let active = self.active.as_ref()?;
        self.open.iter().position(|id| id == active)
    }

    /// Open a task as a tab (if not already open) and focus it.
    pub fn select_task(&mut self, id: &TaskId) -> Result<(), WorkspaceError> {
        if self.task(id).is_none() {
            return Err(WorkspaceError::UnknownTask(id.clone()));
        }
        if !self.open.contains(id) {
            self.open.push(id.clone());
        }
        self.active = Some(id.clone());
        Ok(())
    }

    /// Focus an already-open tab. The open set is not changed.
    pub fn select_tab(&mut self, id: &TaskId) -> Result<(), WorkspaceError> {
        if !self.open.contains(id) {
            return Err(WorkspaceError::NotOpen(id.clone()));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    /// Close a tab. Returns `false` if the tab wasn't open.
    ///
    /// Closing the active tab focuses the tab that was second-to-last before
    /// the close; if that is the tab being closed, the last tab is used.
    pub fn close_tab(&mut self, id: &TaskId) -> bool {
        let Some(pos) = self.open.iter().position(|t| t == id) else {
            return false;
        };
        if self.active.as_ref() == Some(id) {
            let len = self.open.len();
            self.active = if len < 2 {
                None
            } else if len - 2 != pos {
                Some(self.open[len - 2].clone())
            } else {
                Some(self.open[len - 1].clone())
            };
        }
        self.open.remove(pos);
        true
    }

    /// Replace a task (matched by id) everywhere it appears.
    pub fn update_task(&mut self, task: Task) -> Result<(), WorkspaceError> {
        let slot = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| WorkspaceError::UnknownTask(task.id.clone()))?;
        *slot = task;
        Ok(())
    }

    /// Apply an edit to one task in place through `update_task`.
    pub fn modify_task<F>(&mut self, id: &TaskId, f: F) -> Result<&Task, WorkspaceError>
    where
        F: FnOnce(&mut Task),
    {
        let mut task = self
            .task(id)
            .cloned()
            .ok_or_else(|| WorkspaceError::UnknownTask(id.clone()))?;
        f(&mut task);
        self.update_task(task)?;
        self.task(id).ok_or_else(|| WorkspaceError::UnknownTask(id.clone()))
    }

    /// Add a newly created task, or replace it if the id is already known.
    pub fn insert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    /// Drop a deleted task from every view.
    pub fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| &t.id == id)?;
        self.close_tab(id);
        Some(self.tasks.remove(pos))
    }

    /// Replace the master collection after a bulk fetch.
    ///
    /// Duplicate ids keep their first occurrence. Open tabs whose task no
    /// longer exists are closed with the normal tab-close rule.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut deduped: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !deduped.iter().any(|t| t.id == task.id) {
                deduped.push(task);
            }
        }
        self.tasks = deduped;

        let vanished: Vec<TaskId> = self
            .open
            .iter()
            .filter(|id| !self.tasks.iter().any(|t| &t.id == *id))
            .cloned()
            .collect();
        for id in &vanished {
            self.close_tab(id);
        }
    }
}

/// Edit capabilities on the active task, independent of the widget doing the editing.
pub trait TaskEditor {
    fn description(&self) -> Option<&str>;
    fn set_description(&mut self, text: String) -> Result<(), WorkspaceError>;
    fn due_date(&self) -> Option<NaiveDate>;
    fn set_due_date(&mut self, date: Option<NaiveDate>) -> Result<(), WorkspaceError>;
}

impl TaskEditor for Workspace {
    fn description(&self) -> Option<&str> {
        self.active_task().map(|t| t.description.as_str())
    }

    fn set_description(&mut self, text: String) -> Result<(), WorkspaceError> {
        let id = self.active_or_err()?;
        self.modify_task(&id, |t| t.description = text).map(|_| ())
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.active_task().and_then(|t| t.due_date)
    }

    fn set_due_date(&mut self, date: Option<NaiveDate>) -> Result<(), WorkspaceError> {
        let id = self.active_or_err()?;
        self.modify_task(&id, |t| t.due_date = date).map(|_| ())
    }
}

impl Workspace {
    fn active_or_err(&self) -> Result<TaskId, WorkspaceError> {
        self.active.clone().ok_or(WorkspaceError::NoActiveTask)
    }
}
