//! CLI interface for Bow
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags of the `bow` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bow Navigational Instruction Interface
///
/// Compiles plain-language motion instructions into a control-flow graph and
/// drives the robot's controller by walking it.
#[derive(Parser, Debug)]
#[command(name = "bow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive instruction session on stdin
    Session,

    /// Feed every line of a script through a session
    Run {
        /// Script file, one instruction per line
        file: PathBuf,
    },

    /// Print a saved plan without executing it
    Show {
        /// Plan name as given to `save`
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["bow", "session"]);
        assert!(matches!(cli.command, Command::Session));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["bow", "--json", "--log", "debug", "session"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["bow", "run", "patrol.txt"]);
        if let Command::Run { file } = cli.command {
            assert_eq!(file, PathBuf::from("patrol.txt"));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_show_command_with_config() {
        let cli = Cli::parse_from(["bow", "show", "patrol", "--config", "/tmp/bow.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/bow.toml")));
        if let Command::Show { name } = cli.command {
            assert_eq!(name, "patrol");
        } else {
            panic!("Expected Show command");
        }
    }
}
