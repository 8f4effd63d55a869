//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod cache;
pub mod resolve;

use anyhow::Result;
use clap::Subcommand;

use crate::core::policy::CachePolicy;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the artifact cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Resolve an artifact to a local file path
    Resolve {
        #[command(subcommand)]
        command: ResolveCommands,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List all cache entries
    List,

    /// Add an existing local file to the cache
    Add {
        /// Cache key, e.g. "jdk_8u241"
        #[arg(long)]
        key: String,

        /// Path of the file to register
        #[arg(long)]
        path: String,
    },

    /// Delete a cache entry
    Delete {
        /// Cache key to remove
        #[arg(long)]
        key: String,
    },

    /// Show cache size and entry statistics
    Info,

    /// Drop entries whose files no longer exist on disk
    Clean,
}

/// Artifact resolution subcommands
#[derive(Subcommand, Debug)]
pub enum ResolveCommands {
    /// Resolve an installer by category and version
    Installer {
        /// Installer category, e.g. "jdk"
        category: String,

        #[command(flatten)]
        options: ResolveOptions,
    },

    /// Resolve a patch; without --patch-id the newest patch is used
    Patch {
        /// Category the patch applies to
        category: String,

        /// Concrete patch id; omit to resolve the latest patch
        #[arg(long)]
        patch_id: Option<String>,

        #[command(flatten)]
        options: ResolveOptions,
    },
}

/// Options shared by the resolve subcommands
#[derive(clap::Args, Debug)]
pub struct ResolveOptions {
    /// Artifact version
    #[arg(long)]
    pub version: String,

    /// Cache policy
    #[arg(long, value_enum, default_value_t = CachePolicy::First)]
    pub policy: CachePolicy,

    /// Remote account identity for authenticated downloads
    #[arg(long)]
    pub user: Option<String>,

    /// Remote account secret (prefer the environment variable)
    #[arg(long, env = "DEPOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Commands {
    /// Execute the command
    pub async fn run(self, quiet: bool) -> Result<()> {
        match self {
            Commands::Cache { command } => match command {
                CacheCommands::List => cache::execute_list().await,
                CacheCommands::Add { key, path } => cache::execute_add(&key, &path).await,
                CacheCommands::Delete { key } => cache::execute_delete(&key).await,
                CacheCommands::Info => cache::execute_info().await,
                CacheCommands::Clean => cache::execute_clean().await,
            },
            Commands::Resolve { command } => resolve::execute(command, quiet).await,
        }
    }
}
