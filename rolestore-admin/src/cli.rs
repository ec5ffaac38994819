//! Command-line definitions

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rolestore-admin")]
#[command(about = "Manage users and role tiers in a rolestore deployment")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use a throwaway in-memory store seeded with the default tiers
    #[arg(long, global = true)]
    pub memory: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Seed the role hierarchy and create the first administrator
    Bootstrap,

    /// List role tiers, lowest first
    Roles,

    /// Create a user, or overwrite an existing user's credentials
    CreateUser {
        /// User id (email address)
        user_id: String,

        /// Role to grant
        #[arg(short, long)]
        role: Option<String>,

        /// Require a password change at next login
        #[arg(long)]
        default_password: bool,

        /// Password (generated when omitted)
        #[arg(short, long, env = "ROLESTORE_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Change a user's role and optionally their password
    EditUser {
        /// User id
        user_id: String,

        /// New role
        #[arg(short, long)]
        role: String,

        /// New password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Delete a user and all their memberships
    DeleteUser {
        /// User id
        user_id: String,
    },

    /// Print a user's record and tiers as JSON
    ShowUser {
        /// User id
        user_id: String,
    },

    /// Check a password against the strength policy
    CheckPassword {
        password: String,
    },

    /// Complete a forced password change
    ResetPassword {
        /// User id
        user_id: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
}
