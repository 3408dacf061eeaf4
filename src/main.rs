//! git-pair CLI - share one commit identity between pair programmers.

use clap::Parser;
use git_pair::cli::{Cli, Commands, ConfigCommands};
use git_pair::commands::{self, CommandResult};
use git_pair::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use git_pair::git::find_git_root;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "GIT_PAIR_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut overrides = ConfigOverrides::new();
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Some(file) = cli.roster_file {
        overrides = overrides.with_roster_file(file);
    }
    if let Some(ms) = cli.timeout_ms {
        overrides = overrides.with_git_timeout_ms(ms);
    }

    let config = match resolve_config(&overrides) {
        Ok(config) => config,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = config.output_format() == OutputFormat::Human;

    // Determine repo path: --repo flag > GIT_PAIR_REPO env > auto-detect git root > cwd
    let repo_path = resolve_repo_path(cli.repo_path, config.git_timeout(), human);

    match run_command(cli.command, &repo_path, &config, human) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => exit_with_error(&e, human),
    }
}

/// Log to stderr so stdout only carries command output.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("git_pair=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the repository path based on explicit flag, environment variable, or auto-detection.
///
/// An explicit path is used literally. Otherwise the git root of the current
/// directory is used, falling back to the current directory outside a work tree.
/// Root detection is bounded by the configured git timeout.
fn resolve_repo_path(explicit_path: Option<PathBuf>, timeout: Duration, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                let e = git_pair::Error::InvalidInput(format!(
                    "Specified repo path does not exist: {}",
                    path.display()
                ));
                exit_with_error(&e, human);
            }
            path
        }
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            match find_git_root(&cwd, timeout) {
                Ok(root) => root.unwrap_or(cwd),
                Err(e) => exit_with_error(&e, human),
            }
        }
    }
}

/// Run the command. `Ok(false)` means the command ran but wants a failing exit code.
fn run_command(
    command: Commands,
    repo_path: &Path,
    config: &ResolvedConfig,
    human: bool,
) -> Result<bool, git_pair::Error> {
    match command {
        Commands::Status => {
            let session = commands::open_session(repo_path, config)?;
            output(&commands::status(&session), human);
        }
        Commands::List => {
            let session = commands::open_session(repo_path, config)?;
            output(&commands::list(&session), human);
        }
        Commands::Toggle { tags } => {
            let session = commands::open_session(repo_path, config)?;
            output(&commands::toggle(&session, &tags)?, human);
        }
        Commands::Solo => {
            let session = commands::open_session(repo_path, config)?;
            output(&commands::solo(&session)?, human);
        }
        Commands::Check => {
            let result = commands::check(repo_path, config)?;
            output(&result, human);
            return Ok(result.is_clean());
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(config), human),
        },
    }
    Ok(true)
}

fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn exit_with_error(e: &git_pair::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}
