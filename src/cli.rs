use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cropops", version, about = "Agro-meteorological advisory dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build today's advisory, mail it and append it to the run log
    Report {
        /// Field note from the grower, passed to the advisor
        #[arg(short, long)]
        note: Option<String>,

        /// Print the report without mailing it
        #[arg(long)]
        no_email: bool,
    },
    /// Re-run interactive setup
    Init,
    /// Validate config and test connections
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_flags_parse() {
        let cli = Cli::parse_from(["cropops", "-v", "report", "--note", "choveu", "--no-email"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Commands::Report { note, no_email }) => {
                assert_eq!(note.as_deref(), Some("choveu"));
                assert!(no_email);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn no_subcommand_opens_dashboard() {
        let cli = Cli::parse_from(["cropops", "--config", "farm.yaml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("farm.yaml")));
    }
}
