use std::cell::RefCell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::api::{ApiError, AuthResponse, Backend};
use crate::io::state::{ClientState, TOKEN_KEY};
use crate::model::category::Category;
use crate::model::config::AppConfig;
use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use crate::model::user::{Role, User};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Render the whole application screen
pub fn render_app(app: &mut App) -> String {
    render_to_string(TERM_W, TERM_H, |frame, _| crate::tui::render::render(frame, app))
}

/// Backend state shared between a test and the `FakeBackend` inside its App
#[derive(Debug, Default)]
pub struct FakeState {
    pub tasks: RefCell<Vec<Task>>,
    pub saved: RefCell<Vec<Task>>,
    pub deleted: RefCell<Vec<TaskId>>,
    pub token: RefCell<Option<String>>,
    /// Every call fails with this error while set
    pub fail_with: RefCell<Option<ApiError>>,
}

impl FakeState {
    fn check(&self) -> Result<(), ApiError> {
        match self.fail_with.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory backend for TUI tests
pub struct FakeBackend {
    pub state: Rc<FakeState>,
}

pub fn test_user() -> User {
    User {
        id: 1,
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        role: Role::User,
    }
}

impl Backend for FakeBackend {
    fn set_token(&mut self, token: Option<String>) {
        *self.state.token.borrow_mut() = token;
    }

    fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
        self.state.check()?;
        Ok(AuthResponse {
            token: "fake-token".into(),
            user: Some(test_user()),
        })
    }

    fn register(&self, _name: &str, _email: &str, _password: &str) -> Result<(), ApiError> {
        self.state.check()
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.state.check()?;
        Ok(test_user())
    }

    fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.state.check()?;
        Ok(self.state.tasks.borrow().clone())
    }

    fn get_task(&self, id: &TaskId) -> Result<Task, ApiError> {
        self.state.check()?;
        self.state
            .tasks
            .borrow()
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.state.check()?;
        self.state.tasks.borrow_mut().push(task.clone());
        Ok(task.clone())
    }

    fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.state.check()?;
        self.state.saved.borrow_mut().push(task.clone());
        Ok(task.clone())
    }

    fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.state.check()?;
        self.state.deleted.borrow_mut().push(id.clone());
        self.state.tasks.borrow_mut().retain(|t| &t.id != id);
        Ok(())
    }

    fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.state.check()?;
        Ok(vec![Category {
            id: 3,
            name: "Platform".into(),
            description: None,
            color: None,
        }])
    }
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Four tasks covering every status
pub fn sample_tasks() -> Vec<Task> {
    let mut login = Task::new("1", "Login page");
    login.set_status(TaskStatus::InProgress);
    login.priority = Priority::High;
    login.description = "Build the login form.\nSupport OAuth.".into();
    login.created_at = Some(at(2025, 3, 8));
    login.due_date = NaiveDate::from_ymd_opt(2025, 3, 14);
    login.assignee = Some("ada".into());
    login.story_points = Some(5);
    login.labels = vec!["frontend".into(), "auth".into()];
    login.category_id = Some(3);

    let mut api = Task::new("2", "Task API");
    api.set_status(TaskStatus::Review);
    api.created_at = Some(at(2025, 3, 5));
    api.due_date = NaiveDate::from_ymd_opt(2025, 3, 11);
    api.dependencies = vec![TaskId::new("1")];

    let mut docs = Task::new("3", "Write docs");
    docs.priority = Priority::Low;

    let mut setup = Task::new("4", "Project setup");
    setup.set_status(TaskStatus::Done);
    setup.created_at = Some(at(2025, 3, 1));
    setup.due_date = NaiveDate::from_ymd_opt(2025, 3, 3);

    vec![login, api, docs, setup]
}

/// A signed-in App backed by a fake, with `tasks` loaded, plus the fake's
/// shared state
pub fn app_with_fake(tasks: Vec<Task>) -> (App, Rc<FakeState>) {
    let state = Rc::new(FakeState::default());
    *state.tasks.borrow_mut() = sample_tasks();
    *state.token.borrow_mut() = Some("fake-token".into());

    let mut client_state = ClientState::default();
    client_state.set(TOKEN_KEY, "fake-token");
    let backend = FakeBackend {
        state: Rc::clone(&state),
    };
    let mut app = App::new(Box::new(backend), AppConfig::default(), client_state, None);
    app.clock = fixed_now;
    app.workspace.replace_all(tasks);
    (app, state)
}

pub fn app_with_tasks(tasks: Vec<Task>) -> App {
    app_with_fake(tasks).0
}

/// An App on the sign-in screen
pub fn signed_out_app() -> App {
    let mut app = app_with_tasks(Vec::new());
    app.sign_out();
    app
}
