//! Dossier CLI - command-line interface and dashboard for project documentation.

mod commands;
mod config;
mod progress;
mod shutdown;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::export::ExportFormat;
use crate::commands::limits::OutputFormat;
use dossier::{DeltaLinkType, DeltaPriority, DeltaType};

const DEFAULT_LOG_FILTER: &str = "dossier=info,dossier_cli=info";

#[derive(Parser)]
#[command(name = "dossier")]
#[command(version)]
#[command(about = "Project documentation and GitHub metadata, standardized")]
#[command(
    long_about = "Dossier parses project documentation into leveled sections, mirrors GitHub \
repository metadata (languages, dependencies, contributors, issues, pull requests, releases, \
branches) into a local database, links projects into component hierarchies, and exports \
portable .dossier reports."
)]
#[command(after_long_help = r#"EXAMPLES
    Import a repository with its docs folder:
        $ dossier github sync https://github.com/tokio-rs/axum

    Import every repository of an organization, five at a time:
        $ dossier github sync-org tokio-rs --skip-forks --language rust

    Read the overview-level docs of a project:
        $ dossier query tokio-rs/axum --level overview

    Serve the JSON API:
        $ dossier serve --port 8000

    Generate shell completions:
        $ dossier completions bash > ~/.local/share/bash-completion/completions/dossier

CONFIGURATION
    Dossier reads configuration from:
      1. ~/.config/dossier/config.toml (or $XDG_CONFIG_HOME/dossier/config.toml)
      2. ./dossier.toml
      3. Environment variables (DOSSIER_* prefix, nested keys with "__")
      4. .env file in current directory

ENVIRONMENT VARIABLES
    DOSSIER_DATABASE_URL      Database connection string (default: ~/.local/state/dossier/dossier.db)
    DOSSIER_GITHUB_TOKEN      GitHub personal access token
    GITHUB_TOKEN              Fallback GitHub token
    RUST_LOG                  Log filter (default: dossier=info,dossier_cli=info)
"#)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal dashboard
    Dashboard,
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
    /// Parse a Markdown file or directory into a project's sections
    Parse {
        /// Project name
        project: String,
        /// File or directory (directories are walked recursively)
        path: PathBuf,
    },
    /// Query a project's documentation
    Query {
        /// Project name
        project: String,
        /// Deepest level to include: summary, overview, detailed, technical
        #[arg(short, long, default_value = "overview")]
        level: String,
        /// Only sections of this type (setup, api, usage, configuration, ...)
        #[arg(short = 't', long)]
        section_type: Option<String>,
        /// Case-insensitive text search over titles and content
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Serve the JSON API
    Serve {
        /// Address to bind (default from config or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default from config or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// GitHub operations
    Github {
        #[command(subcommand)]
        action: GithubAction,
    },
    /// Manage component links between projects
    Components {
        #[command(subcommand)]
        action: ComponentsAction,
    },
    /// Export dossier reports (`export <project>` is short for `export dossier <project>`)
    #[command(args_conflicts_with_subcommands = true)]
    Export {
        #[command(flatten)]
        args: ExportArgs,
        #[command(subcommand)]
        action: Option<ExportAction>,
    },
    /// Write a .dossier template to fill in by hand
    Init {
        /// Project name (default: the current directory's name)
        name: Option<String>,
        /// Output file (default: <name>.dossier)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Track units of work (deltas) on a project
    Delta {
        #[command(subcommand)]
        action: DeltaAction,
    },
    /// Development and maintenance helpers
    Dev {
        #[command(subcommand)]
        action: DevAction,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run database migrations
    #[cfg(feature = "migrate")]
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ProjectsAction {
    /// List projects
    List {
        /// Show description, repository and sync time
        #[arg(short, long)]
        verbose: bool,
        /// Only projects synced from GitHub
        #[arg(short, long)]
        synced: bool,
    },
    /// Register a local project
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Repository URL
        #[arg(short, long)]
        repository: Option<String>,
        /// Path to the documentation on disk
        #[arg(short = 'p', long)]
        docs_path: Option<PathBuf>,
    },
    /// Remove a project with its sections, links and metadata
    Remove {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show a project's details and metadata counts
    Show { name: String },
    /// Rename a project
    Rename { old: String, new: String },
}

/// Options shared by `sync-user` and `sync-org`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BatchSyncOptions {
    /// Parent project to link every synced repository under
    /// (default: the user or organization name)
    #[arg(long)]
    parent: Option<String>,

    /// Stop after this many repositories (0 = no limit)
    #[arg(short, long, default_value_t = 0)]
    limit: usize,

    /// Skip forked repositories
    #[arg(long)]
    skip_forks: bool,

    /// Only repositories whose primary language matches (case-insensitive)
    #[arg(long)]
    language: Option<String>,

    /// Parse only the README, not the docs folder
    #[arg(long)]
    no_docs: bool,

    /// Repositories per batch (default from config or 5)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Re-sync repositories even if they were synced within the last hour
    #[arg(short, long)]
    force: bool,
}

#[derive(Subcommand)]
pub(crate) enum GithubAction {
    /// Import one repository: docs, metadata and versions
    Sync {
        /// Repository URL (https://github.com/owner/repo or git@github.com:owner/repo)
        url: String,
        /// Project name (default: owner/repo)
        #[arg(short, long)]
        name: Option<String>,
        /// Override the repository description
        #[arg(short, long)]
        description: Option<String>,
        /// Parse only the README, not the docs folder
        #[arg(long)]
        no_docs: bool,
    },
    /// Search GitHub repositories
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        /// stars, forks or updated
        #[arg(short, long, default_value = "stars")]
        sort: String,
    },
    /// Show repository metadata without importing it
    Info { url: String },
    /// Import every repository of a user
    SyncUser {
        user: String,
        #[command(flatten)]
        options: BatchSyncOptions,
    },
    /// Import every repository of an organization
    SyncOrg {
        org: String,
        #[command(flatten)]
        options: BatchSyncOptions,
    },
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
pub(crate) enum ComponentsAction {
    /// Link <child> under <parent> at the next free position
    Add {
        parent: String,
        child: String,
        /// component, dependency or related
        #[arg(short = 't', long = "type", default_value = "component")]
        relationship_type: String,
    },
    /// Remove a link
    Remove { parent: String, child: String },
    /// List a project's components
    List {
        project: String,
        /// Walk the whole hierarchy
        #[arg(short, long)]
        recursive: bool,
    },
    /// Turn synced metadata into linked projects
    /// (contributors, languages, packages, branches, issues, PRs, versions, docs)
    Autolink(AutolinkArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutolinkArgs {
    /// Project to autolink
    #[arg(required_unless_present = "all")]
    pub project: Option<String>,
    /// Autolink every project with a GitHub owner and repo
    #[arg(short, long, conflicts_with = "project")]
    pub all: bool,
    #[arg(long)]
    pub no_contributors: bool,
    #[arg(long)]
    pub no_languages: bool,
    #[arg(long)]
    pub no_dependencies: bool,
    #[arg(long)]
    pub no_branches: bool,
    #[arg(long)]
    pub no_issues: bool,
    #[arg(long)]
    pub no_prs: bool,
    #[arg(long)]
    pub no_versions: bool,
    #[arg(long)]
    pub no_docs: bool,
    #[arg(long, default_value_t = 10)]
    pub max_contributors: usize,
    #[arg(long, default_value_t = 50)]
    pub max_issues: usize,
    #[arg(long, default_value_t = 50)]
    pub max_prs: usize,
}

/// Arguments of `export dossier`, also accepted directly after `export`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExportArgs {
    /// Project name
    pub project: Option<String>,
    /// Output file (default: <project>.dossier, `/` replaced by `_`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Leave out the documentation overview
    #[arg(long)]
    pub no_docs: bool,
    /// Leave out issue, PR, contributor and branch activity
    #[arg(long)]
    pub no_activity: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ExportAction {
    /// Export one project to a .dossier file
    Dossier(ExportArgs),
    /// Export every project into a directory
    All {
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Dossier)]
        format: ExportFormat,
        /// Only projects synced from GitHub
        #[arg(long)]
        synced_only: bool,
    },
    /// Print a project's dossier to stdout
    Show { project: String },
    /// Check that a .dossier file has the required sections
    Validate { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub(crate) enum DeltaAction {
    /// Start a delta in the brainstorm phase
    New {
        project: String,
        /// Short identifier, unique within the project
        name: String,
        /// Title (default: the name)
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium, high or critical
        #[arg(short, long, default_value = "medium")]
        priority: DeltaPriority,
        /// feature, bugfix, refactor, docs or chore
        #[arg(short = 't', long = "type", default_value = "feature")]
        delta_type: DeltaType,
        #[arg(long)]
        issue: Option<i64>,
        #[arg(long)]
        pr: Option<i64>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// List a project's deltas
    List {
        project: String,
        /// Include complete and abandoned deltas
        #[arg(short, long)]
        all: bool,
    },
    /// Show a delta with its links and notes
    Show { project: String, name: String },
    /// Move a delta to its next phase
    Advance { project: String, name: String },
    /// Mark a delta abandoned
    Abandon {
        project: String,
        name: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Add a note to a delta's current phase
    Note {
        project: String,
        name: String,
        content: String,
    },
    /// Link a delta to an issue, pr, branch, doc or another delta
    Link {
        project: String,
        name: String,
        link_type: DeltaLinkType,
        /// Number for issues and PRs (`#12` or `12`), name otherwise
        target: String,
    },
    /// Delete a delta with its notes and links
    Remove {
        project: String,
        name: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub(crate) enum DumpFormat {
    #[default]
    Json,
    Summary,
}

#[derive(Subcommand)]
pub(crate) enum DevAction {
    /// Drop all tables and reapply migrations
    #[cfg(feature = "migrate")]
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete rows from selected tables
    Clear {
        #[arg(long)]
        projects: bool,
        #[arg(long)]
        docs: bool,
        #[arg(long)]
        components: bool,
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every project whose name contains a pattern
    Purge {
        /// Case-insensitive substring of project names
        #[arg(short, long, default_value = "test")]
        pattern: String,
        #[arg(short, long)]
        yes: bool,
        /// List the matches without deleting
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Show row counts and recently synced projects
    Status,
    /// Compact the SQLite database file
    Vacuum,
    /// Dump every project with its sections
    Dump {
        /// Output file (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },
    /// Insert sample projects and docs
    Seed {
        /// Also link the sample projects into a hierarchy
        #[arg(long)]
        example: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration (token masked)
    Show,
    /// Save a GitHub token to the user config file
    SetToken { token: String },
}

#[cfg(feature = "migrate")]
#[derive(Subcommand)]
pub(crate) enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = commands::shared::sqlite_path(database_url) else {
        return Ok(());
    };

    if db_path.is_relative() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The server always logs; other commands log only when not on a TTY.
    // The dashboard owns the terminal and never logs.
    let serving = matches!(cli.command, Commands::Serve { .. });
    let dashboard = matches!(cli.command, Commands::Dashboard);
    if serving || (!dashboard && !Term::stdout().is_term()) {
        init_tracing();
    }

    // Handle commands that don't require configuration or database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        Commands::Init {
            name,
            output,
            force,
        } => {
            commands::export::handle_init(name.clone(), output.clone(), *force)?;
            return Ok(());
        }
        Commands::Export {
            action: Some(ExportAction::Validate { file }),
            ..
        } => {
            commands::export::handle_validate(file)?;
            return Ok(());
        }
        _ => {}
    }

    let config = config::Config::load();
    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set DOSSIER_DATABASE_URL")?;
    ensure_sqlite_dir(&database_url)?;

    match cli.command {
        Commands::Dashboard => tui::run(&config, &database_url).await?,
        Commands::Projects { action } => {
            commands::projects::handle_projects(action, &database_url).await?;
        }
        Commands::Parse { project, path } => {
            commands::docs::handle_parse(&project, &path, &database_url).await?;
        }
        Commands::Query {
            project,
            level,
            section_type,
            search,
        } => {
            commands::docs::handle_query(
                &project,
                &level,
                section_type.as_deref(),
                search,
                &database_url,
            )
            .await?;
        }
        Commands::Serve { host, port } => {
            commands::serve::handle_serve(host, port, &config, &database_url).await?;
        }
        Commands::Github { action } => {
            commands::github::handle_github(action, &config, &database_url).await?;
        }
        Commands::Components { action } => {
            commands::components::handle_components(action, &database_url).await?;
        }
        Commands::Export { args, action } => {
            commands::export::handle_export(args, action, &database_url).await?;
        }
        Commands::Delta { action } => {
            commands::deltas::handle_deltas(action, &database_url).await?;
        }
        Commands::Dev { action } => {
            commands::dev::handle_dev(action, &database_url).await?;
        }
        Commands::Config { action } => commands::settings::handle_config(action, &config)?,
        #[cfg(feature = "migrate")]
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } | Commands::Init { .. } => {}
    }

    Ok(())
}
