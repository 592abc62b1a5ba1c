//! # Incubator CLI Module
//!
//! This module implements the CLI interface.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `stages` - Show the stage catalog
//! - `open` - Open a new assessment
//! - `list` - List assessments
//! - `show` - Show one assessment
//! - `score` - Append a score
//! - `advance` / `retreat` - Move one stage forward or back
//! - `blocker add|resolve` - Manage blockers
//! - `export` / `import` - Snapshot files

mod commands;

use crate::AppError;
use crate::config::{BackendKind, FileConfig};
use clap::{Args, Parser, Subcommand};
use incubator_core::{Actor, Role};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Incubator - Assessment Workflow Server
///
/// Moves startup assessments through five review stages with role checks,
/// justified transitions and an append-only audit trail.
#[derive(Parser, Debug)]
#[command(name = "incubator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the assessment database [default: incubator.db]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend [default: redb]
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Identity of the person running a mutating command.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Actor id as issued by the identity provider
    #[arg(long)]
    pub actor_id: String,

    /// Display name recorded on scores (defaults to the id)
    #[arg(long)]
    pub actor_name: Option<String>,

    /// Portal role: admin, editor, reviewer, analyst, viewer
    #[arg(long)]
    pub role: Role,
}

impl ActorArgs {
    #[must_use]
    pub fn to_actor(&self) -> Actor {
        let name = self.actor_name.as_deref().unwrap_or(&self.actor_id);
        Actor::new(self.actor_id.as_str(), name, self.role)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show the stage catalog
    Stages,

    /// Open a new assessment at the initial stage
    Open {
        /// Assessment id
        id: String,

        /// Startup name
        startup_name: String,
    },

    /// List assessments
    List,

    /// Show one assessment
    Show {
        /// Assessment id
        id: String,
    },

    /// Append a score to an assessment
    Score {
        /// Assessment id
        id: String,

        /// Review category
        #[arg(long)]
        category: String,

        /// Awarded score
        #[arg(long)]
        score: i64,

        /// Maximum possible score [default: 100]
        #[arg(long)]
        max_score: Option<i64>,

        /// Reviewer comments
        #[arg(long)]
        comments: String,

        /// Version the change is based on (defaults to the current one)
        #[arg(long)]
        expected_version: Option<u64>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Move an assessment to the next stage
    Advance {
        /// Assessment id
        id: String,

        /// Justification for the move
        #[arg(short, long)]
        notes: String,

        /// Version the change is based on (defaults to the current one)
        #[arg(long)]
        expected_version: Option<u64>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Move an assessment back to the previous stage
    Retreat {
        /// Assessment id
        id: String,

        /// Justification for the move
        #[arg(short, long)]
        notes: String,

        /// Version the change is based on (defaults to the current one)
        #[arg(long)]
        expected_version: Option<u64>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Manage blockers
    Blocker {
        #[command(subcommand)]
        action: BlockerCommand,
    },

    /// Export all assessments to a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import assessments from a snapshot file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Blocker subcommands.
#[derive(Subcommand, Debug)]
pub enum BlockerCommand {
    /// Record a blocker
    Add {
        /// Assessment id
        id: String,

        /// Reason the assessment cannot advance
        reason: String,

        /// Version the change is based on (defaults to the current one)
        #[arg(long)]
        expected_version: Option<u64>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Resolve a blocker by its exact reason
    Resolve {
        /// Assessment id
        id: String,

        /// Reason as recorded
        reason: String,

        /// Version the change is based on (defaults to the current one)
        #[arg(long)]
        expected_version: Option<u64>,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let storage = file.storage.resolve(cli.database.as_deref(), cli.backend);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&storage, file.server.with_overrides(host, port)).await
        }
        Some(Commands::Init { force }) => cmd_init(&storage, force, json_mode),
        Some(Commands::Stages) => cmd_stages(json_mode),
        Some(Commands::Open { id, startup_name }) => {
            cmd_open(&storage, json_mode, &id, &startup_name)
        }
        Some(Commands::Show { id }) => cmd_show(&storage, json_mode, &id),
        Some(Commands::Score {
            id,
            category,
            score,
            max_score,
            comments,
            expected_version,
            actor,
        }) => {
            let mut candidate = incubator_core::ScoreCandidate::new(category, score, comments);
            candidate.max_score = max_score;
            cmd_score(
                &storage,
                json_mode,
                &id,
                &candidate,
                expected_version,
                &actor.to_actor(),
            )
        }
        Some(Commands::Advance {
            id,
            notes,
            expected_version,
            actor,
        }) => cmd_transition(
            &storage,
            json_mode,
            &id,
            incubator_core::Direction::Forward,
            notes,
            expected_version,
            &actor.to_actor(),
        ),
        Some(Commands::Retreat {
            id,
            notes,
            expected_version,
            actor,
        }) => cmd_transition(
            &storage,
            json_mode,
            &id,
            incubator_core::Direction::Backward,
            notes,
            expected_version,
            &actor.to_actor(),
        ),
        Some(Commands::Blocker { action }) => match action {
            BlockerCommand::Add {
                id,
                reason,
                expected_version,
                actor,
            } => cmd_blocker(
                &storage,
                json_mode,
                &id,
                BlockerAction::Add,
                &reason,
                expected_version,
                &actor.to_actor(),
            ),
            BlockerCommand::Resolve {
                id,
                reason,
                expected_version,
                actor,
            } => cmd_blocker(
                &storage,
                json_mode,
                &id,
                BlockerAction::Resolve,
                &reason,
                expected_version,
                &actor.to_actor(),
            ),
        },
        Some(Commands::Export { output }) => cmd_export(&storage, json_mode, &output),
        Some(Commands::Import { input }) => cmd_import(&storage, json_mode, &input),
        Some(Commands::List) | None => cmd_list(&storage, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
