use std::io::BufRead;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::api::{ApiClient, ApiError, Backend};
use crate::io::config_io;
use crate::io::oauth::complete_oauth;
use crate::io::state::{self, ClientState, Session, THEME_KEY, ThemeMode};
use crate::model::config::AppConfig;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::ops::explorer::{compile_query, group_tasks};
use crate::ops::form::{DraftField, LoginForm, RegisterForm, TaskDraft};
use crate::ops::timeline::{TimelineScale, date_axis, layout, today_offset};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: where state lives, the parsed config, and
/// the session restored from state.json
pub struct Context {
    pub dir: PathBuf,
    pub config: AppConfig,
    pub state: ClientState,
    pub session: Session,
    pub json: bool,
}

impl Context {
    pub fn load(dir: PathBuf, json: bool) -> Self {
        let config = config_io::load_config_or_default(&dir);
        let state = state::read_state(&dir);
        let session = Session::from_state(&state);
        Context {
            dir,
            config,
            state,
            session,
            json,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.config.api, self.session.token.clone())
    }

    /// A client for a command that needs a signed-in user
    fn authed_client(&self) -> Result<ApiClient, Box<dyn std::error::Error>> {
        if !self.session.is_authenticated() {
            return Err("not signed in (run `tf login`)".into());
        }
        Ok(self.client())
    }

    fn save_state(&self) -> CmdResult {
        state::write_state(&self.dir, &self.state)?;
        Ok(())
    }

    /// Turn a backend error into a command error. A rejected token is
    /// forgotten so the next command asks for a fresh login.
    fn api_failed(&mut self, err: ApiError) -> Box<dyn std::error::Error> {
        if let ApiError::Unauthorized { .. } = err {
            tracing::info!("token rejected, signing out");
            self.session.sign_out(&mut self.state);
            if let Err(e) = self.save_state() {
                tracing::warn!(error = %e, "could not clear stored token");
            }
        }
        Box::new(err)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let dir = config_io::config_dir(cli.config_dir.as_deref());
    let mut ctx = Context::load(dir, cli.json);
    tracing::debug!(dir = %ctx.dir.display(), "loaded client state");

    match cli.command {
        None => Ok(()),
        Some(cmd) => match cmd {
            // Session
            Commands::Login(args) => cmd_login(&mut ctx, args),
            Commands::Register(args) => cmd_register(&mut ctx, args),
            Commands::Logout => cmd_logout(&mut ctx),
            Commands::Oauth(args) => cmd_oauth(&mut ctx, args),
            Commands::Whoami => cmd_whoami(&mut ctx),

            // Read commands
            Commands::List(args) => cmd_list(&mut ctx, args),
            Commands::Show(args) => cmd_show(&mut ctx, args),
            Commands::Categories => cmd_categories(&mut ctx),
            Commands::Timeline(args) => cmd_timeline(&mut ctx, args),

            // Write commands
            Commands::Add(args) => cmd_add(&mut ctx, args),
            Commands::Status(args) => cmd_status(&mut ctx, args),
            Commands::Priority(args) => cmd_priority(&mut ctx, args),
            Commands::Label(args) => cmd_label(&mut ctx, args),
            Commands::Dep(args) => cmd_dep(&mut ctx, args),
            Commands::Delete(args) => cmd_delete(&mut ctx, args),

            // Settings
            Commands::Theme(args) => cmd_theme(&mut ctx, args),
            Commands::Config(args) => cmd_config(&mut ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Password from the flag, else the first line of stdin
fn read_password(flag: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(password) = flag {
        return Ok(password);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Fetch a task, apply `f`, stamp it, and save it back
fn modify_task<F>(ctx: &mut Context, id: &str, f: F) -> Result<Task, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Task) -> Result<(), String>,
{
    let client = ctx.authed_client()?;
    let id = TaskId::new(id);
    let mut task = client.get_task(&id).map_err(|e| match e {
        ApiError::NotFound => format!("task not found: {}", id).into(),
        other => ctx.api_failed(other),
    })?;
    f(&mut task)?;
    task.updated_at = Some(now());
    let saved = client.update_task(&task).map_err(|e| ctx.api_failed(e))?;
    tracing::info!(id = %saved.id, "task saved");
    Ok(saved)
}

fn print_task_result(ctx: &Context, task: &Task) -> CmdResult {
    if ctx.json {
        print_json(&task_to_json(task, &[]))
    } else {
        println!("{}", format_task_line(task));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session commands
// ---------------------------------------------------------------------------

fn cmd_login(ctx: &mut Context, args: LoginArgs) -> CmdResult {
    let form = LoginForm {
        email: args.email.trim().to_string(),
        password: read_password(args.password)?,
    };
    form.validate()?;

    let mut client = ctx.client();
    let auth = client
        .login(&form.email, &form.password)
        .map_err(|e| ctx.api_failed(e))?;
    client.set_token(Some(auth.token.clone()));
    let user = match auth.user {
        Some(user) => Some(user),
        None => client.current_user().ok(),
    };
    ctx.session.sign_in(&mut ctx.state, auth.token, user);
    ctx.save_state()?;

    let name = ctx
        .session
        .user
        .as_ref()
        .map_or(form.email.as_str(), |u| u.display_name());
    tracing::info!(email = %form.email, "signed in");
    println!("Signed in as {}", name);
    Ok(())
}

fn cmd_register(ctx: &mut Context, args: RegisterArgs) -> CmdResult {
    let form = RegisterForm {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        password: read_password(args.password)?,
    };
    form.validate()?;
    ctx.client()
        .register(&form.name, &form.email, &form.password)
        .map_err(|e| ctx.api_failed(e))?;
    println!("Account created. Run `tf login {}` to sign in.", form.email);
    Ok(())
}

fn cmd_logout(ctx: &mut Context) -> CmdResult {
    ctx.session.sign_out(&mut ctx.state);
    ctx.save_state()?;
    println!("Signed out");
    Ok(())
}

fn cmd_oauth(ctx: &mut Context, args: OAuthArgs) -> CmdResult {
    let mut client = ctx.client();
    let result = complete_oauth(&args.redirect, &mut client, &mut ctx.session, &mut ctx.state);
    // Success stores the token, failure clears it; both are persisted
    ctx.save_state()?;
    let user = result?;
    println!("Signed in as {}", user.display_name());
    Ok(())
}

fn cmd_whoami(ctx: &mut Context) -> CmdResult {
    let client = ctx.authed_client()?;
    let user = client.current_user().map_err(|e| ctx.api_failed(e))?;
    if ctx.json {
        return print_json(&user);
    }
    println!("{} <{}>", user.display_name(), user.email);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &mut Context, args: ListArgs) -> CmdResult {
    let status: Option<TaskStatus> = args.status.as_deref().map(str::parse).transpose()?;
    let client = ctx.authed_client()?;
    let mut tasks = client.list_tasks().map_err(|e| ctx.api_failed(e))?;
    if let Some(status) = status {
        tasks.retain(|t| t.status == status);
    }
    let query = args.search.as_deref().and_then(compile_query);
    let groups = group_tasks(&tasks, query.as_ref());

    if ctx.json {
        return print_json(&groups_to_json(&groups, &[]));
    }
    let lines = format_groups(&groups);
    if lines.is_empty() {
        println!("No tasks");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_show(ctx: &mut Context, args: ShowArgs) -> CmdResult {
    let client = ctx.authed_client()?;
    let id = TaskId::new(args.id);
    let task = client.get_task(&id).map_err(|e| match e {
        ApiError::NotFound => format!("task not found: {}", id).into(),
        other => ctx.api_failed(other),
    })?;
    // Category names are a nicety; the task prints without them
    let categories = client.categories().unwrap_or_default();

    if ctx.json {
        return print_json(&task_to_json(&task, &categories));
    }
    for line in format_task_detail(&task, &categories) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_categories(ctx: &mut Context) -> CmdResult {
    let client = ctx.authed_client()?;
    let categories = client.categories().map_err(|e| ctx.api_failed(e))?;
    if ctx.json {
        return print_json(&categories);
    }
    for line in format_categories(&categories) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_timeline(ctx: &mut Context, args: TimelineArgs) -> CmdResult {
    let client = ctx.authed_client()?;
    let tasks = client.list_tasks().map_err(|e| ctx.api_failed(e))?;

    let mut scale = TimelineScale::from(&ctx.config.timeline);
    if let Some(days) = args.days {
        scale.days = days.max(1);
    }
    let now = now();
    let axis = date_axis(now.date(), scale.days);
    let bars = layout(&tasks, &axis, &scale);

    if ctx.json {
        return print_json(&TimelineJson {
            start: axis
                .first()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            days: scale.days,
            bars,
        });
    }
    if bars.is_empty() {
        println!("No tasks with both a start and a due date");
        return Ok(());
    }
    for line in format_timeline(&bars, &axis, &scale, today_offset(now, &axis, &scale)) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &mut Context, args: AddArgs) -> CmdResult {
    let mut draft = TaskDraft::new(args.title);
    let fields = [
        (DraftField::Description, args.description),
        (DraftField::DueDate, args.due),
        (DraftField::Priority, args.priority),
        (DraftField::Status, args.status),
        (DraftField::Assignee, args.assignee),
        (
            DraftField::Labels,
            (!args.labels.is_empty()).then(|| args.labels.join(",")),
        ),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            draft.set_field(field, &value)?;
        }
    }
    let task = draft.into_task(now())?;

    let client = ctx.authed_client()?;
    let created = client.create_task(&task).map_err(|e| ctx.api_failed(e))?;
    tracing::info!(id = %created.id, "task created");
    print_task_result(ctx, &created)
}

fn cmd_status(ctx: &mut Context, args: StatusArgs) -> CmdResult {
    let status: TaskStatus = args.status.parse()?;
    let task = modify_task(ctx, &args.id, |t| {
        t.set_status(status);
        Ok(())
    })?;
    print_task_result(ctx, &task)
}

fn cmd_priority(ctx: &mut Context, args: PriorityArgs) -> CmdResult {
    let priority = args.priority.parse()?;
    let task = modify_task(ctx, &args.id, |t| {
        t.priority = priority;
        Ok(())
    })?;
    print_task_result(ctx, &task)
}

fn cmd_label(ctx: &mut Context, args: LabelArgs) -> CmdResult {
    let label = args.label.trim().to_string();
    let task = match args.action.as_str() {
        "add" => modify_task(ctx, &args.id, |t| {
            if t.add_label(&label) {
                Ok(())
            } else {
                Err(format!("label already present or empty: {}", label))
            }
        })?,
        "rm" | "remove" => modify_task(ctx, &args.id, |t| {
            if t.remove_label(&label) {
                Ok(())
            } else {
                Err(format!("label not found: {}", label))
            }
        })?,
        other => return Err(format!("unknown action '{}' (expected add or rm)", other).into()),
    };
    print_task_result(ctx, &task)
}

fn cmd_dep(ctx: &mut Context, args: DepArgs) -> CmdResult {
    let dep = TaskId::new(args.dep_id);
    let task = match args.action.as_str() {
        "add" => {
            // The dependency must exist before it is recorded
            let client = ctx.authed_client()?;
            client.get_task(&dep).map_err(|e| match e {
                ApiError::NotFound => format!("unknown task: {}", dep).into(),
                other => ctx.api_failed(other),
            })?;
            modify_task(ctx, &args.id, |t| {
                if t.add_dependency(dep.clone()) {
                    Ok(())
                } else {
                    Err(format!("cannot depend on {}", dep))
                }
            })?
        }
        "rm" | "remove" => modify_task(ctx, &args.id, |t| {
            if t.remove_dependency(&dep) {
                Ok(())
            } else {
                Err(format!("not a dependency: {}", dep))
            }
        })?,
        other => return Err(format!("unknown action '{}' (expected add or rm)", other).into()),
    };
    print_task_result(ctx, &task)
}

fn cmd_delete(ctx: &mut Context, args: DeleteArgs) -> CmdResult {
    let client = ctx.authed_client()?;
    let id = TaskId::new(args.id);
    client.delete_task(&id).map_err(|e| match e {
        ApiError::NotFound => format!("task not found: {}", id).into(),
        other => ctx.api_failed(other),
    })?;
    tracing::info!(%id, "task deleted");
    println!("Deleted {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn cmd_theme(ctx: &mut Context, args: ThemeArgs) -> CmdResult {
    let current = ctx.state.theme();
    let Some(mode) = args.mode else {
        println!("{}", current);
        return Ok(());
    };
    let next = match mode.as_str() {
        "toggle" => current.toggle(),
        other => other.parse::<ThemeMode>()?,
    };
    ctx.state.set(THEME_KEY, next.as_str());
    ctx.save_state()?;
    println!("{}", next);
    Ok(())
}

fn cmd_config(ctx: &mut Context, args: ConfigCmd) -> CmdResult {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            if ctx.json {
                return print_json(&ctx.config);
            }
            print!("{}", toml::to_string_pretty(&ctx.config)?);
            Ok(())
        }
        ConfigAction::Set(set) => {
            let (_, mut doc) = config_io::read_config(&ctx.dir)?;
            config_io::set_value(&mut doc, &set.key, &set.value)?;
            config_io::write_config(&ctx.dir, &doc)?;
            println!("{} = {}", set.key, set.value.trim_end_matches('/'));
            Ok(())
        }
    }
}
