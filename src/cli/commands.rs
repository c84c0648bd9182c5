use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tf", about = concat!("taskflow v", env!("CARGO_PKG_VERSION"), " - your task board in the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding config.toml and state.json
    #[arg(long = "config-dir", env = "TASKFLOW_HOME", global = true)]
    pub config_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Forget the stored token
    Logout,
    /// Finish an OAuth sign-in from the redirect URL
    Oauth(OAuthArgs),
    /// Show the signed-in user
    Whoami,
    /// List tasks grouped by status
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Create a task
    Add(AddArgs),
    /// Change task status
    Status(StatusArgs),
    /// Change task priority
    Priority(PriorityArgs),
    /// Add or remove labels
    Label(LabelArgs),
    /// Add or remove dependencies
    Dep(DepArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// List task categories
    Categories,
    /// Show dated tasks on the timeline
    Timeline(TimelineArgs),
    /// Show or change the color theme
    Theme(ThemeArgs),
    /// Show or edit config.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Session args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
    /// Password (read from stdin when omitted)
    #[arg(long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Password (read from stdin when omitted)
    #[arg(long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct OAuthArgs {
    /// Redirect URL or its query string (token=... or error=...)
    pub redirect: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only this status (todo, in-progress, review, done)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by regex over title, description and labels
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    pub id: String,
}

#[derive(Args)]
pub struct TimelineArgs {
    /// Days on the axis (default from config)
    #[arg(long)]
    pub days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Description text
    #[arg(long, short)]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// low, medium, high or critical
    #[arg(long)]
    pub priority: Option<String>,
    /// todo, in-progress, review or done
    #[arg(long)]
    pub status: Option<String>,
    /// Assignee
    #[arg(long)]
    pub assignee: Option<String>,
    /// Label (repeatable)
    #[arg(long = "label", short = 'l')]
    pub labels: Vec<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task ID
    pub id: String,
    /// New status
    pub status: String,
}

#[derive(Args)]
pub struct PriorityArgs {
    /// Task ID
    pub id: String,
    /// New priority
    pub priority: String,
}

#[derive(Args)]
pub struct LabelArgs {
    /// Task ID
    pub id: String,
    /// Action: "add" or "rm"
    pub action: String,
    /// Label name
    pub label: String,
}

#[derive(Args)]
pub struct DepArgs {
    /// Task ID
    pub id: String,
    /// Action: "add" or "rm"
    pub action: String,
    /// Dependency task ID
    pub dep_id: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID
    pub id: String,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ThemeArgs {
    /// light, dark or toggle (omit to print the current theme)
    pub mode: Option<String>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a value: api.base_url, api.version or api.timeout_secs
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key
    pub key: String,
    /// New value
    pub value: String,
}
