use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trialstats_core::Domain;

#[derive(Parser, Debug)]
#[command(
    name = "trialstats",
    version,
    about = "Period-scoped statistics and leaderboards for athletic trials"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Statistics for one athlete in one domain.
    Personal {
        #[arg(long, value_enum)]
        domain: DomainArg,
        #[arg(long)]
        athlete: Option<i64>,
        #[arg(long, help = "weekly, monthly, or general (defaults to config)")]
        period: Option<String>,
    },
    /// Top players in one domain.
    Leaderboard {
        #[arg(long, value_enum)]
        domain: DomainArg,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        position: Option<String>,
    },
    /// Load athletes and finished trials from CSV files.
    Import {
        #[arg(long)]
        athletes: Option<PathBuf>,
        #[arg(long)]
        trials: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DomainArg {
    Reaction,
    Throw,
    Jump,
}

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Reaction => Domain::Reaction,
            DomainArg::Throw => Domain::Throw,
            DomainArg::Jump => Domain::Jump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_personal() {
        let cli = Cli::try_parse_from([
            "trialstats",
            "personal",
            "--domain",
            "reaction",
            "--athlete",
            "7",
            "--period",
            "weekly",
        ])
        .unwrap();
        match cli.command {
            Commands::Personal {
                domain,
                athlete,
                period,
            } => {
                assert_eq!(Domain::from(domain), Domain::Reaction);
                assert_eq!(athlete, Some(7));
                assert_eq!(period.as_deref(), Some("weekly"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_leaderboard_filters() {
        let cli = Cli::try_parse_from([
            "trialstats",
            "leaderboard",
            "--domain",
            "throw",
            "--track",
            "engineering",
        ])
        .unwrap();
        match cli.command {
            Commands::Leaderboard {
                domain,
                period,
                track,
                position,
            } => {
                assert_eq!(domain, DomainArg::Throw);
                assert!(period.is_none());
                assert_eq!(track.as_deref(), Some("engineering"));
                assert!(position.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_domain() {
        assert!(Cli::try_parse_from(["trialstats", "leaderboard", "--domain", "swim"]).is_err());
    }
}
