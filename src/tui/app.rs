use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use regex::Regex;

use crate::io::api::{ApiClient, ApiError, Backend};
use crate::io::config_io::load_config_or_default;
use crate::io::oauth::complete_oauth;
use crate::io::state::{ClientState, Session, THEME_KEY, ThemeMode, read_state, write_state};
use crate::model::category::{Category, category_name};
use crate::model::config::AppConfig;
use crate::model::task::{Task, TaskId};
use crate::ops::explorer::{ExplorerRow, ExplorerState, TaskGroup, compile_query, group_tasks};
use crate::ops::form::{DraftField, LoginForm, RegisterForm, TaskDraft};
use crate::ops::layout::{Panel, PanelLayout, ResizeDrag};
use crate::ops::timeline::{self, TimelineBar, TimelineScale, date_axis};
use crate::ops::workspace::Workspace;

use super::editor::TextInput;
use super::input;
use super::render;
use super::theme::Theme;

/// Which panel has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Explorer,
    Content,
    Properties,
    Timeline,
}

impl Focus {
    pub const ORDER: [Focus; 4] = [
        Focus::Explorer,
        Focus::Content,
        Focus::Properties,
        Focus::Timeline,
    ];

    /// The resizable panel behind this focus (content has none)
    pub fn panel(self) -> Option<Panel> {
        match self {
            Focus::Explorer => Some(Panel::Explorer),
            Focus::Content => None,
            Focus::Properties => Some(Panel::Properties),
            Focus::Timeline => Some(Panel::Timeline),
        }
    }
}

/// Rows of the properties panel, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropField {
    Status,
    Priority,
    StoryPoints,
    Assignee,
    DueDate,
    Category,
    Labels,
    Dependencies,
}

impl PropField {
    pub const ALL: [PropField; 8] = [
        PropField::Status,
        PropField::Priority,
        PropField::StoryPoints,
        PropField::Assignee,
        PropField::DueDate,
        PropField::Category,
        PropField::Labels,
        PropField::Dependencies,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropField::Status => "Status",
            PropField::Priority => "Priority",
            PropField::StoryPoints => "Points",
            PropField::Assignee => "Assignee",
            PropField::DueDate => "Due",
            PropField::Category => "Category",
            PropField::Labels => "Labels",
            PropField::Dependencies => "Depends on",
        }
    }

    /// Fields that cycle through fixed choices instead of taking text
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            PropField::Status | PropField::Priority | PropField::StoryPoints | PropField::Category
        )
    }
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing an explorer filter
    Search,
    /// Editing the active task's description
    EditDescription,
    /// Editing a text property of the active task
    EditProperty(PropField),
    /// Editing one acceptance criterion of the active task, by index
    EditCriterion(usize),
    /// The new-task form is open
    NewTask,
    /// Waiting for y/n before deleting the active task
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Error,
}

/// One-line message shown in the status row until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

/// Fields of the sign-in screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Name,
    Email,
    Password,
    OAuthRedirect,
}

impl LoginField {
    pub fn label(self) -> &'static str {
        match self {
            LoginField::Name => "Name",
            LoginField::Email => "Email",
            LoginField::Password => "Password",
            LoginField::OAuthRedirect => "OAuth redirect URL",
        }
    }
}

/// State of the sign-in / registration screen
#[derive(Debug, Clone, Default)]
pub struct LoginScreen {
    pub register: bool,
    pub name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub oauth: TextInput,
    pub field: usize,
}

impl LoginScreen {
    pub fn fields(&self) -> &'static [LoginField] {
        if self.register {
            &[LoginField::Name, LoginField::Email, LoginField::Password]
        } else {
            &[
                LoginField::Email,
                LoginField::Password,
                LoginField::OAuthRedirect,
            ]
        }
    }

    pub fn current_field(&self) -> LoginField {
        let fields = self.fields();
        fields[self.field.min(fields.len() - 1)]
    }

    pub fn input(&self, field: LoginField) -> &TextInput {
        match field {
            LoginField::Name => &self.name,
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
            LoginField::OAuthRedirect => &self.oauth,
        }
    }

    pub fn current_input_mut(&mut self) -> &mut TextInput {
        match self.current_field() {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::OAuthRedirect => &mut self.oauth,
        }
    }

    pub fn login_form(&self) -> LoginForm {
        LoginForm {
            email: self.email.text().trim().to_string(),
            password: self.password.text().to_string(),
        }
    }

    pub fn register_form(&self) -> RegisterForm {
        RegisterForm {
            name: self.name.text().trim().to_string(),
            email: self.email.text().trim().to_string(),
            password: self.password.text().to_string(),
        }
    }
}

/// The new-task form overlay
#[derive(Debug, Clone, Default)]
pub struct NewTaskForm {
    pub draft: TaskDraft,
    pub field: usize,
    /// Text of the focused field while it is being typed
    pub input: TextInput,
    pub error: Option<String>,
}

impl NewTaskForm {
    pub fn current_field(&self) -> DraftField {
        DraftField::ALL[self.field.min(DraftField::ALL.len() - 1)]
    }
}

/// A blocking backend call, queued by input handling and run by the event
/// loop after a loading frame has been drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login(LoginForm),
    Register(RegisterForm),
    OAuth(String),
    LoadTasks,
    SaveTask(TaskId),
    CreateTask(Task),
    DeleteTask(TaskId),
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::Login(_) | Request::OAuth(_) => "Signing in",
            Request::Register(_) => "Creating account",
            Request::LoadTasks => "Loading tasks",
            Request::SaveTask(_) => "Saving",
            Request::CreateTask(_) => "Creating task",
            Request::DeleteTask(_) => "Deleting",
        }
    }
}

/// Screen areas from the last frame, for mouse hit-testing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelRects {
    /// Everything above the status row
    pub body: Rect,
    pub explorer: Option<Rect>,
    pub content: Rect,
    pub properties: Option<Rect>,
    pub timeline: Option<Rect>,
}

/// Main application state
pub struct App {
    pub backend: Box<dyn Backend>,
    /// Where state.json lives; None keeps everything in memory
    pub config_dir: Option<PathBuf>,
    pub config: AppConfig,
    pub client_state: ClientState,
    pub session: Session,
    pub theme: Theme,
    pub workspace: Workspace,
    pub categories: Vec<Category>,
    pub explorer: ExplorerState,
    pub layout: PanelLayout,
    pub focus: Focus,
    pub mode: Mode,
    pub should_quit: bool,
    pub show_help: bool,
    pub banner: Option<Banner>,
    /// Label of the request in flight, shown in the status row
    pub loading: Option<&'static str>,
    pub pending: Option<Request>,
    pub search_input: TextInput,
    /// Buffer for description and property edits
    pub editor: TextInput,
    pub prop_cursor: usize,
    pub content_scroll: usize,
    pub timeline_cursor: usize,
    pub login: LoginScreen,
    pub new_task: Option<NewTaskForm>,
    pub drag: Option<ResizeDrag>,
    pub rects: PanelRects,
    pub clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl App {
    pub fn new(
        backend: Box<dyn Backend>,
        config: AppConfig,
        client_state: ClientState,
        config_dir: Option<PathBuf>,
    ) -> Self {
        let session = Session::from_state(&client_state);
        let theme = Theme::from_config(&config.ui, client_state.theme());
        let layout = PanelLayout::from_config(&config.layout);
        App {
            backend,
            config_dir,
            session,
            theme,
            layout,
            workspace: Workspace::default(),
            categories: Vec::new(),
            explorer: ExplorerState::default(),
            focus: Focus::Explorer,
            mode: Mode::Navigate,
            should_quit: false,
            show_help: false,
            banner: None,
            loading: None,
            pending: None,
            search_input: TextInput::single_line(""),
            editor: TextInput::single_line(""),
            prop_cursor: 0,
            content_scroll: 0,
            timeline_cursor: 0,
            login: LoginScreen::default(),
            new_task: None,
            drag: None,
            rects: PanelRects::default(),
            clock: local_now,
            client_state,
            config,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            kind: BannerKind::Error,
            text: text.into(),
        });
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            kind: BannerKind::Info,
            text: text.into(),
        });
    }

    /// Explorer filter compiled from the search input (while typing) or the
    /// committed query
    pub fn explorer_query(&self) -> Option<Regex> {
        match self.mode {
            Mode::Search => compile_query(self.search_input.text()),
            _ => compile_query(&self.explorer.query),
        }
    }

    pub fn groups(&self) -> Vec<TaskGroup<'_>> {
        group_tasks(self.workspace.tasks(), self.explorer_query().as_ref())
    }

    pub fn explorer_rows(&self) -> Vec<ExplorerRow> {
        self.explorer.rows(&self.groups())
    }

    /// Whether a focus target is currently on screen
    pub fn is_focusable(&self, focus: Focus) -> bool {
        focus.panel().is_none_or(|p| self.layout.is_visible(p))
    }

    pub fn cycle_focus(&mut self, delta: i32) {
        let len = Focus::ORDER.len() as i32;
        let mut idx = Focus::ORDER
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0) as i32;
        for _ in 0..len {
            idx = (idx + delta).rem_euclid(len);
            let candidate = Focus::ORDER[idx as usize];
            if self.is_focusable(candidate) {
                self.focus = candidate;
                return;
            }
        }
    }

    /// Hide or show a panel, moving focus off it if it disappears
    pub fn toggle_panel(&mut self, panel: Panel) {
        let visible = self.layout.toggle(panel);
        if !visible && self.focus.panel() == Some(panel) {
            self.focus = Focus::Content;
        }
    }

    /// Open a task as a tab. Unknown ids are ignored.
    pub fn open_task(&mut self, id: &TaskId) {
        if let Err(e) = self.workspace.select_task(id) {
            tracing::debug!(error = %e, "select ignored");
            return;
        }
        self.content_scroll = 0;
    }

    pub fn set_theme(&mut self, mode: ThemeMode) {
        self.theme = Theme::from_config(&self.config.ui, mode);
        self.client_state.set(THEME_KEY, mode.as_str());
        self.persist_state();
    }

    /// Write state.json. Failures go to the banner; the session continues.
    pub fn persist_state(&mut self) {
        let Some(dir) = &self.config_dir else {
            return;
        };
        if let Err(e) = write_state(dir, &self.client_state) {
            tracing::warn!(error = %e, "could not save state");
            self.set_error(e.to_string());
        }
    }

    pub fn sign_out(&mut self) {
        self.session.sign_out(&mut self.client_state);
        self.backend.set_token(None);
        self.workspace = Workspace::default();
        self.categories.clear();
        self.login = LoginScreen::default();
        self.mode = Mode::Navigate;
        self.new_task = None;
        self.persist_state();
    }

    /// Apply a local edit to the active task and queue the save
    pub fn edit_active<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Task),
    {
        let Some(id) = self.workspace.active_id().cloned() else {
            return;
        };
        let now = self.now();
        let result = self.workspace.modify_task(&id, |task| {
            f(task);
            task.updated_at = Some(now);
        });
        match result {
            Ok(_) => self.request(Request::SaveTask(id)),
            Err(e) => tracing::debug!(error = %e, "edit ignored"),
        }
    }

    /// Display text of a property of `task`
    pub fn property_text(&self, task: &Task, field: PropField) -> String {
        match field {
            PropField::Status => task.status.label().to_string(),
            PropField::Priority => task.priority.to_string(),
            PropField::StoryPoints => task
                .story_points
                .map(|p| p.to_string())
                .unwrap_or_default(),
            PropField::Assignee => task.assignee.clone().unwrap_or_default(),
            PropField::DueDate => task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            PropField::Category => task
                .category_id
                .map(|id| {
                    category_name(&self.categories, id)
                        .map_or_else(|| format!("#{}", id), str::to_string)
                })
                .unwrap_or_default(),
            PropField::Labels => task.labels.join(", "),
            PropField::Dependencies => task
                .dependencies
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn timeline_scale(&self) -> TimelineScale {
        TimelineScale::from(&self.config.timeline)
    }

    pub fn timeline_axis(&self) -> Vec<NaiveDate> {
        date_axis(self.now().date(), self.timeline_scale().days)
    }

    /// Bars for every dated task, in workspace order
    pub fn timeline_bars(&self) -> Vec<TimelineBar> {
        timeline::layout(
            self.workspace.tasks(),
            &self.timeline_axis(),
            &self.timeline_scale(),
        )
    }

    /// Queue a backend call. Only one request is in flight at a time.
    pub fn request(&mut self, req: Request) {
        if self.pending.is_some() {
            tracing::debug!(?req, "request dropped, another is pending");
            return;
        }
        self.loading = Some(req.label());
        self.pending = Some(req);
    }

    /// Run the queued request, if any. Returns whether one ran.
    pub fn perform_pending(&mut self) -> bool {
        let Some(req) = self.pending.take() else {
            return false;
        };
        self.perform(req);
        self.loading = None;
        true
    }

    fn perform(&mut self, req: Request) {
        tracing::info!(request = req.label(), "performing request");
        match req {
            Request::Login(form) => match self.backend.login(&form.email, &form.password) {
                Ok(auth) => {
                    self.session
                        .sign_in(&mut self.client_state, auth.token.clone(), auth.user);
                    self.backend.set_token(Some(auth.token));
                    self.login = LoginScreen::default();
                    self.persist_state();
                    self.perform(Request::LoadTasks);
                }
                Err(e) => self.set_error(e.to_string()),
            },
            Request::Register(form) => {
                match self.backend.register(&form.name, &form.email, &form.password) {
                    Ok(()) => {
                        self.login.register = false;
                        self.login.field = 0;
                        self.login.password.clear();
                        self.set_info("Account created. Sign in to continue.");
                    }
                    Err(e) => self.set_error(format!("Registration failed: {}", e)),
                }
            }
            Request::OAuth(redirect) => {
                let result = complete_oauth(
                    &redirect,
                    self.backend.as_mut(),
                    &mut self.session,
                    &mut self.client_state,
                );
                self.persist_state();
                match result {
                    Ok(_) => {
                        self.login = LoginScreen::default();
                        self.perform(Request::LoadTasks);
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            Request::LoadTasks => self.load_tasks(),
            Request::SaveTask(id) => {
                let Some(task) = self.workspace.task(&id).cloned() else {
                    return;
                };
                match self.backend.update_task(&task) {
                    Ok(saved) => {
                        if saved.id == task.id {
                            let _ = self.workspace.update_task(saved);
                        }
                    }
                    Err(e) => self.api_failed("Save failed", e),
                }
            }
            Request::CreateTask(task) => match self.backend.create_task(&task) {
                Ok(created) => {
                    let id = created.id.clone();
                    self.workspace.insert_task(created);
                    self.open_task(&id);
                    self.focus = Focus::Content;
                    self.set_info("Task created");
                }
                Err(e) => self.api_failed("Create failed", e),
            },
            Request::DeleteTask(id) => match self.backend.delete_task(&id) {
                Ok(()) => {
                    self.workspace.remove_task(&id);
                    self.set_info("Task deleted");
                }
                Err(e) => self.api_failed("Delete failed", e),
            },
        }
    }

    fn load_tasks(&mut self) {
        if self.session.user.is_none() {
            match self.backend.current_user() {
                Ok(user) => self.session.user = Some(user),
                Err(e @ ApiError::Unauthorized { .. }) => return self.api_failed("Sign-in", e),
                Err(e) => tracing::warn!(error = %e, "could not load profile"),
            }
        }
        match self.backend.list_tasks() {
            Ok(tasks) => {
                tracing::info!(count = tasks.len(), "tasks loaded");
                self.workspace.replace_all(tasks);
                let rows = self.explorer_rows().len();
                self.explorer.clamp_cursor(rows);
            }
            Err(e) => return self.api_failed("Could not load tasks", e),
        }
        match self.backend.categories() {
            Ok(categories) => self.categories = categories,
            Err(e) => tracing::warn!(error = %e, "could not load categories"),
        }
    }

    /// Report a failed call. An expired session signs the user out.
    fn api_failed(&mut self, context: &str, err: ApiError) {
        if let ApiError::Unauthorized { message } = &err {
            let message = message.clone();
            self.sign_out();
            self.set_error(message);
            return;
        }
        self.set_error(format!("{}: {}", context, err));
    }
}

/// Owns raw mode, the alternate screen and mouse capture for the life of the
/// TUI. Dropping it gives the terminal back, including on early return.
struct TerminalGuard;

impl TerminalGuard {
    fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        Ok(TerminalGuard)
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        io::stdout(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Run the TUI application
pub fn run(config_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_or_default(config_dir);
    let client_state = read_state(config_dir);
    let token = client_state.token().map(str::to_string);
    let backend = ApiClient::new(&config.api, token);

    let mut app = App::new(
        Box::new(backend),
        config,
        client_state,
        Some(config_dir.to_path_buf()),
    );
    if app.is_signed_in() {
        app.request(Request::LoadTasks);
    }

    let _guard = TerminalGuard::acquire()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);
    terminal.show_cursor()?;
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        // The frame just drawn shows the loading label; block on the call,
        // then drop whatever was typed while it ran.
        if app.perform_pending() {
            while event::poll(Duration::ZERO)? {
                let _ = event::read()?;
            }
            continue;
        }

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
