//! Mind CLI - create, version and pack machine-learning projects.
//!
//! A Mind lives in a project directory, a mind-file (zip archive), or both.
//! Every command that works on a Mind takes `--dir` and/or `--file`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mind_core::{Bump, Identity};
use mind_ops::{Config, MindSource};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;

use commands::{archive, config as config_cmd, mind};

/// Mind CLI - versioned, packageable machine-learning projects.
#[derive(Parser, Debug)]
#[command(
    name = "mind",
    author,
    version,
    about = "Mind: versioned, packageable machine-learning projects",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Owner identity, e.g. "Jane Doe <jane@example.com>" (overrides config).
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where a Mind lives.
#[derive(Args, Debug, Clone)]
struct MindArgs {
    /// Project directory.
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Mind-file.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl MindArgs {
    fn source(&self) -> MindSource {
        MindSource::new(self.file.clone(), self.dir.clone())
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or open a Mind.
    ///
    /// With only `--dir`, the directory is templated and its history started
    /// at version 0.0.0. With both `--dir` and `--file`, a missing mind-file is
    /// written from the directory.
    Init {
        #[command(flatten)]
        mind: MindArgs,
    },

    /// Pack a project directory into a mind-file.
    Pack {
        /// Project directory to pack.
        dir: PathBuf,

        /// Mind-file to write (replaced if present).
        file: PathBuf,
    },

    /// Unpack a mind-file into a directory.
    Unpack {
        /// Mind-file to read.
        file: PathBuf,

        /// Destination directory.
        dir: PathBuf,
    },

    /// Save the working tree as a new version.
    ///
    /// A Mind opened from a mind-file only is written back to that file.
    Save {
        #[command(flatten)]
        mind: MindArgs,

        /// Version component to bump: major, minor, patch, prerelease or build.
        #[arg(short, long, default_value = "patch")]
        bump: Bump,

        /// Engineer making this save (defaults to the engineer of the previous save).
        #[arg(short, long)]
        engineer: Option<Identity>,
    },

    /// Print the newest saved version.
    Latest {
        #[command(flatten)]
        mind: MindArgs,
    },

    /// List saved versions, oldest first.
    Versions {
        #[command(flatten)]
        mind: MindArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the history of the current variant, newest first.
    Log {
        #[command(flatten)]
        mind: MindArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current variant, or switch to (and create) another.
    Variant {
        #[command(flatten)]
        mind: MindArgs,

        /// Variant to switch to.
        name: Option<String>,
    },

    /// Show Mind status and info.
    Status {
        #[command(flatten)]
        mind: MindArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();
    let mut config = Config::load()?;

    // The owner flag applies to Mind commands only, never to saved config.
    let mut mind_config = config.clone();
    if let Some(owner) = cli.owner {
        mind_config.owner = Some(owner);
    }

    match cli.command {
        Commands::Init { mind: args } => {
            mind::init(&mind_config, &args.source())?;
        }

        Commands::Pack { dir, file } => {
            archive::pack(&config, &dir, &file)?;
        }

        Commands::Unpack { file, dir } => {
            archive::unpack(&file, &dir)?;
        }

        Commands::Save {
            mind: args,
            bump,
            engineer,
        } => {
            mind::save(&mind_config, &args.source(), bump, engineer)?;
        }

        Commands::Latest { mind: args } => {
            mind::latest(&mind_config, &args.source())?;
        }

        Commands::Versions { mind: args, json } => {
            mind::versions(&mind_config, &args.source(), json)?;
        }

        Commands::Log { mind: args, json } => {
            mind::log(&mind_config, &args.source(), json)?;
        }

        Commands::Variant { mind: args, name } => {
            mind::variant(&mind_config, &args.source(), name.as_deref())?;
        }

        Commands::Status { mind: args, json } => {
            mind::status(&mind_config, &args.source(), json)?;
        }

        Commands::Config(config_cmd_inner) => match config_cmd_inner {
            ConfigCommands::Show => {
                config_cmd::show(&config)?;
            }
            ConfigCommands::Set { key, value } => {
                config_cmd::set(&mut config, &key, &value)?;
            }
            ConfigCommands::Get { key } => {
                config_cmd::get(&config, &key)?;
            }
            ConfigCommands::Reset => {
                config_cmd::reset()?;
            }
            ConfigCommands::Path => {
                if let Some(path) = Config::config_file_path() {
                    println!("{}", path.display());
                } else {
                    println!("(no config file path available)");
                }
            }
        },
    }

    Ok(())
}
