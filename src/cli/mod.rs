//! CLI argument definitions for git-pair.

use clap::{Parser, Subcommand};

/// git-pair - share one commit identity between everyone at the keyboard.
///
/// Team members are listed in a `.pairs` file at the repository root. Toggle
/// members with `git-pair toggle <tag>` and the combined name and email are
/// written to git config.
#[derive(Parser, Debug)]
#[command(name = "git-pair")]
#[command(author, about = "Pair programming commit identities for git", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_PAIR_GIT_COMMIT"), ")"))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if git-pair was started in <path> instead of the current directory.
    /// The path must exist and is used literally, without git root detection.
    /// Can also be set via GIT_PAIR_REPO environment variable.
    #[arg(short = 'C', long = "repo", global = true, env = "GIT_PAIR_REPO")]
    pub repo_path: Option<std::path::PathBuf>,

    /// Roster file name relative to the repository root (default: .pairs)
    #[arg(long = "roster", global = true)]
    pub roster_file: Option<String>,

    /// Timeout for each git invocation, in milliseconds
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the current pair and the identity written to git config
    Status,

    /// List roster members and who is currently paired
    List,

    /// Add members to the pair, or remove them if already paired
    Toggle {
        /// Member tags from the roster (e.g., gc, rw)
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Work alone: remove everyone from the pair and clear the identity
    #[command(alias = "clear")]
    Solo,

    /// Validate the roster and report entries that were skipped
    Check,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved settings and where each one came from
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_toggle_tags() {
        let cli = Cli::try_parse_from(["git-pair", "toggle", "gc", "rw"]).unwrap();
        match cli.command {
            Commands::Toggle { tags } => assert_eq!(tags, ["gc", "rw"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_toggle_requires_a_tag() {
        assert!(Cli::try_parse_from(["git-pair", "toggle"]).is_err());
    }

    #[test]
    fn test_clear_is_solo() {
        let cli = Cli::try_parse_from(["git-pair", "clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Solo));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "git-pair",
            "status",
            "-H",
            "--roster",
            "team.yml",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.roster_file.as_deref(), Some("team.yml"));
        assert_eq!(cli.timeout_ms, Some(250));
    }
}
