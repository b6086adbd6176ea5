//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use talentradar_employees::domain::aggregates::WorkerType;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "talentradar")]
#[command(about = "Operate the Talent Radar event store and bounded contexts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// Sign up an organization with its first user
    Register {
        #[arg(long)]
        organization: String,

        #[arg(long, default_value = "free")]
        plan: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Initial password for the identity provider
        #[arg(long, env = "TALENTRADAR_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Invite a user into an organization
    Invite {
        #[command(flatten)]
        caller: Caller,

        /// Display name; the first word becomes the first name
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Add an employee record
    CreateEmployee {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long)]
        manager: bool,

        /// FTE, DC or AC
        #[arg(long)]
        worker_type: Option<WorkerType>,

        #[arg(long, default_value_t = 0)]
        level: i32,

        #[arg(long)]
        team_id: Option<Uuid>,
    },

    /// Ask reviewers for feedback about one or more employees
    RequestFeedback {
        #[command(flatten)]
        caller: Caller,

        #[arg(long = "employee-id", required = true)]
        employee_ids: Vec<Uuid>,

        /// Extra reviewer, repeatable
        #[arg(long = "reviewer")]
        reviewers: Vec<String>,

        /// Also ask each employee's teammates
        #[arg(long)]
        include_team: bool,

        /// Days until the collection window closes
        #[arg(long, default_value_t = 14)]
        due_in_days: u32,
    },

    /// Print the feedback collected about an employee as JSON
    ListFeedback {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        employee_id: Uuid,
    },
}

/// Who the command runs as.
#[derive(Debug, Clone, Copy, Args)]
pub struct Caller {
    #[arg(long, env = "TALENTRADAR_ORGANIZATION_ID")]
    pub organization_id: Uuid,

    #[arg(long, env = "TALENTRADAR_USER_ID")]
    pub user_id: Option<Uuid>,
}
