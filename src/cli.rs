use clap::{Args, Parser, Subcommand};

use crate::models::{Action, Module};

#[derive(Parser)]
#[command(name = "permctl")]
#[command(about = "Terminal console for managing users and app permissions on a Nacos-style server")]
#[command(version)]
pub struct Cli {
    /// Server base URL (overrides PERMCTL_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Display locale: en-US or zh-CN (overrides PERMCTL_LOCALE)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive console
    Tui {
        /// Run against built-in demo data instead of a server
        #[arg(long)]
        demo: bool,
    },

    /// Manage app permissions
    #[command(subcommand)]
    Permissions(PermissionCommand),

    /// Manage users
    #[command(subcommand)]
    Users(UserCommand),

    /// List the apps permissions can be granted on
    Apps,
}

/// Paging options shared by the list commands
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: u32,
}

#[derive(Subcommand)]
pub enum PermissionCommand {
    /// List permission grants
    List {
        /// Filter by username
        #[arg(short, long)]
        username: Option<String>,

        /// Filter by app
        #[arg(short, long)]
        app: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Grant a user access to an app
    Add {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        app: String,

        /// Module: config, naming or *
        #[arg(short, long)]
        modules: Option<Module>,

        /// Action: r, w or rw
        #[arg(long)]
        action: Option<Action>,
    },

    /// Change the module and action of an existing grant
    Edit {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        app: String,

        #[arg(short, long)]
        modules: Option<Module>,

        #[arg(long)]
        action: Option<Action>,
    },

    /// Remove a grant
    Delete {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        app: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// List users
    List {
        /// Filter by username
        #[arg(short, long)]
        username: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Create a user
    Add {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Replace a user's namespace keys
    Update {
        #[arg(short, long)]
        username: String,

        /// Comma separated namespace keys
        #[arg(short, long)]
        kps: String,
    },

    /// Delete a user
    Delete {
        #[arg(short, long)]
        username: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
