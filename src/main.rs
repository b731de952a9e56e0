use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wiki_sync::conflict::ResolutionStrategy;
use wiki_sync::{handlers, logger, VerbosityLevel};

#[derive(Parser)]
#[command(name = "wiki-sync")]
#[command(about = "Keep a local working tree of wiki topics in sync with a remote repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug output and revision details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a directory to a remote repository
    Init {
        /// Remote repository (file:// URI or directory path)
        uri: String,

        /// Working tree directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Namespace to create on the remote (repeatable)
        #[arg(short, long = "namespace")]
        namespaces: Vec<String>,

        /// Create the remote directory if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Show the status of topics
    Status {
        /// Files or directories to limit the listing to
        paths: Vec<PathBuf>,

        /// Include up-to-date topics
        #[arg(short, long)]
        all: bool,

        /// Print a JSON report instead of the listing
        #[arg(long)]
        json: bool,
    },

    /// Fetch remote changes into the working tree
    Update {
        /// Files or directories to update
        paths: Vec<PathBuf>,
    },

    /// Publish local changes to the remote
    Commit {
        /// Files or directories to commit
        paths: Vec<PathBuf>,

        /// Author recorded on the new revisions
        #[arg(short, long)]
        author: Option<String>,

        /// Commit what can be committed and skip conflicting topics
        #[arg(long)]
        ignore_conflicts: bool,
    },

    /// Resolve conflicting topics
    Resolve {
        /// Files or directories to resolve
        paths: Vec<PathBuf>,

        /// Keep the working tree content for every conflict
        #[arg(long, conflicts_with = "keep_remote")]
        keep_local: bool,

        /// Take the remote content for every conflict
        #[arg(long)]
        keep_remote: bool,
    },

    /// Configure client settings
    Config {
        /// Default commit author
        #[arg(long)]
        identity: Option<String>,

        /// Resolution used by `resolve` without a terminal
        #[arg(long, value_enum)]
        default_resolution: Option<ResolutionStrategy>,

        /// List up-to-date topics in `status`
        #[arg(long)]
        show_up_to_date: Option<bool>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = VerbosityLevel::from_flags(cli.verbose, cli.quiet);
    logger::init_logger(verbosity.log_level())?;

    match cli.command {
        Commands::Init {
            uri,
            dir,
            namespaces,
            create,
        } => {
            handlers::handle_init(&uri, &dir, &namespaces, create)?;
        }
        Commands::Status { paths, all, json } => {
            handlers::handle_status(&paths, all, json, verbosity)?;
        }
        Commands::Update { paths } => {
            handlers::handle_update(&paths, verbosity)?;
        }
        Commands::Commit {
            paths,
            author,
            ignore_conflicts,
        } => {
            handlers::handle_commit(&paths, author.as_deref(), ignore_conflicts, verbosity)?;
        }
        Commands::Resolve {
            paths,
            keep_local,
            keep_remote,
        } => {
            let strategy = if keep_local {
                Some(ResolutionStrategy::Local)
            } else if keep_remote {
                Some(ResolutionStrategy::Remote)
            } else {
                None
            };
            handlers::handle_resolve(&paths, strategy, verbosity)?;
        }
        Commands::Config {
            identity,
            default_resolution,
            show_up_to_date,
            show,
        } => {
            handlers::handle_config(identity, default_resolution, show_up_to_date, show)?;
        }
    }

    Ok(())
}
