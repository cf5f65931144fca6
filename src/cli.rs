use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "depshift")]
#[command(about = "Multi-module build migration: classify versions, fix managed dependencies, generate scan configuration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a project, decide per module, and apply safe edits
    Run {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Configuration file (defaults to depshift.toml under the root)
        #[arg(short, long, env = "DEPSHIFT_CONFIG")]
        config: Option<PathBuf>,

        /// Process-wide setting, e.g. `--set generate=true` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Compute every change without writing files
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,

        /// Number of worker threads (0 = all cores)
        #[arg(short = 'j', long = "jobs", default_value = "0")]
        jobs: usize,
    },

    /// Write a starter depshift.toml
    Init {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    pub fn verbosity(&self) -> u8 {
        match self {
            Commands::Run { verbosity, .. } => *verbosity,
            Commands::Init { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["depshift", "run"]);
        match cli.command {
            Commands::Run {
                path,
                dry_run,
                format,
                jobs,
                set,
                ..
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert!(!dry_run);
                assert_eq!(format, OutputFormat::Terminal);
                assert_eq!(jobs, 0);
                assert!(set.is_empty());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_with_overrides() {
        let cli = Cli::parse_from([
            "depshift",
            "run",
            "proj",
            "--set",
            "generate=true",
            "--set",
            "indent=tab",
            "--dry-run",
            "-f",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.command.verbosity(), 2);
        match cli.command {
            Commands::Run { set, dry_run, format, .. } => {
                assert_eq!(set, vec!["generate=true".to_string(), "indent=tab".to_string()]);
                assert!(dry_run);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_init_command_with_force() {
        let cli = Cli::parse_from(["depshift", "init", "--force"]);
        match cli.command {
            Commands::Init { force, .. } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }
}
