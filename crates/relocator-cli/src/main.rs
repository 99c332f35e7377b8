mod cmd;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, folder::FolderSubcommand, project::ProjectSubcommand,
    status::StatusSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relocator",
    about = "Keep project folders under the status directory that matches each project's status",
    version,
    propagate_version = true
)]
struct Cli {
    /// Projects root (default: auto-detect from .relocator/)
    #[arg(long, global = true, env = "PROJECT_BASE_PATH")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the projects root: status directories, config and database
    Init,

    /// Manage project records
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Show which status directory holds a project's folder
    Locate { number: String },

    /// Inspect status directories
    Folder {
        #[command(subcommand)]
        subcommand: FolderSubcommand,
    },

    /// Change project status, moving the folder when needed
    Status {
        #[command(subcommand)]
        subcommand: StatusSubcommand,
    },

    /// Mark a project completed and move it to 99 Completed
    Archive {
        number: String,
        /// Don't ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Move a project out of 01 RFPs: current, archive or inactive
    Promote {
        number: String,
        destination: String,
        /// Don't ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Compare every project's status with its folder location
    Reconcile {
        /// Move misplaced folders to the directory their status maps to
        #[arg(long)]
        repair: bool,
    },

    /// Finish or discard relocations that were interrupted
    Recover,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Locate { number } => cmd::locate::run(&root, &number, cli.json),
        Commands::Folder { subcommand } => cmd::folder::run(&root, subcommand, cli.json),
        Commands::Status { subcommand } => cmd::status::run(&root, subcommand, cli.json),
        Commands::Archive { number, yes } => cmd::status::archive(&root, &number, yes, cli.json),
        Commands::Promote {
            number,
            destination,
            yes,
        } => cmd::status::promote(&root, &number, &destination, yes, cli.json),
        Commands::Reconcile { repair } => cmd::reconcile::run(&root, repair, cli.json),
        Commands::Recover => cmd::reconcile::recover(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
