//! `storekeep` — admin CLI for the back-office service.
//!
//! Shares the service wiring with the API server; point it at the same
//! `DATABASE_URL`.

use clap::{Parser, Subcommand};

use storekeep_api::app::services::build_services;
use storekeep_api::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "storekeep", about = "Storekeep back-office administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user account.
    CreateUser {
        #[arg(long)]
        username: String,

        /// Password; prompted on stdin when omitted.
        #[arg(long)]
        password: Option<String>,

        /// Grant the unconditional-bypass superuser flag.
        #[arg(long)]
        superuser: bool,
    },

    /// Ensure basic permissions for every resource type and materialize
    /// both role groups.
    SyncPermissions,

    /// Link an employee to a user and put the user in the matching role group.
    AssignEmployee {
        #[arg(long)]
        username: String,

        #[arg(long)]
        employee_id: String,
    },

    /// Clear a user's employee link and role-group membership.
    DeassignEmployee {
        #[arg(long)]
        username: String,
    },

    /// Delete every check (irreversible).
    ClearChecks {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storekeep_observability::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let services = build_services(&config).await?;

    match cli.command {
        Command::CreateUser {
            username,
            password,
            superuser,
        } => commands::create_user(&services, &username, password, superuser).await,
        Command::SyncPermissions => commands::sync_permissions(&services).await,
        Command::AssignEmployee {
            username,
            employee_id,
        } => commands::assign_employee(&services, &username, &employee_id).await,
        Command::DeassignEmployee { username } => {
            commands::deassign_employee(&services, &username).await
        }
        Command::ClearChecks { yes } => commands::clear_checks(&services, yes).await,
    }
}
