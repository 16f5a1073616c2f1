//! Local user administration for the sagra server.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sagra_server::user::{SqliteUserStore, UserManager, UserRole};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the directory holding the SQLite databases.
    #[clap(long)]
    pub db_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user, optionally with a password and a role.
    CreateUser {
        handle: String,
        #[clap(long)]
        password: Option<String>,
        #[clap(long)]
        role: Option<String>,
    },
    /// Set (or replace) a user's password.
    SetPassword { handle: String, password: String },
    /// Grant a role to a user.
    AddRole { handle: String, role: String },
    /// List all user handles.
    ListUsers,
}

fn parse_role(s: &str) -> Result<UserRole> {
    UserRole::from_str(s)
        .with_context(|| format!("Unknown role {:?}, expected Admin or Regular", s))
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let user_store = Arc::new(SqliteUserStore::new(cli_args.db_dir.join("users.db"))?);
    let manager = UserManager::new(user_store);

    match cli_args.command {
        Command::CreateUser {
            handle,
            password,
            role,
        } => {
            let user_id = manager.add_user(&handle)?;
            if let Some(role) = role {
                manager.add_user_role(user_id, parse_role(&role)?)?;
            }
            if let Some(password) = password {
                manager.create_password_credentials(&handle, &password)?;
            }
            println!("Created user {} with id {}", handle, user_id);
        }
        Command::SetPassword { handle, password } => {
            if manager.get_user_id(&handle)?.is_none() {
                bail!("User {} not found", handle);
            }
            let has_password = manager
                .get_user_credentials(&handle)?
                .map(|c| c.username_password.is_some())
                .unwrap_or(false);
            if has_password {
                manager.update_password_credentials(&handle, &password)?;
            } else {
                manager.create_password_credentials(&handle, &password)?;
            }
            println!("Password set for {}", handle);
        }
        Command::AddRole { handle, role } => {
            let user_id = manager
                .get_user_id(&handle)?
                .with_context(|| format!("User {} not found", handle))?;
            manager.add_user_role(user_id, parse_role(&role)?)?;
            println!("Granted {} to {}", role, handle);
        }
        Command::ListUsers => {
            for handle in manager.get_all_user_handles()? {
                println!("{}", handle);
            }
        }
    }
    Ok(())
}
