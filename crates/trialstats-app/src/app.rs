// Command dispatch: wires CLI commands to the statistics service and store.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use trialstats_core::{
    Domain, Leaderboard, LeaderboardRequest, PersonalRequest, PersonalSummary, StatsService,
};
use trialstats_store::Database;

use crate::cli::Commands;
use crate::import;

/// Counts written by an `import` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub athletes: usize,
    pub trials: usize,
}

pub struct App {
    service: StatsService<Database>,
    default_period: String,
}

impl App {
    pub fn new(db: Database, default_period: impl Into<String>) -> Self {
        Self {
            service: StatsService::new(db),
            default_period: default_period.into(),
        }
    }

    /// Pin the reference date used for weekly and monthly windows.
    pub fn as_of(self, today: NaiveDate) -> Self {
        Self {
            service: self.service.as_of(today),
            default_period: self.default_period,
        }
    }

    pub fn db(&self) -> &Database {
        self.service.source()
    }

    fn period_or_default(&self, period: Option<String>) -> String {
        period.unwrap_or_else(|| self.default_period.clone())
    }

    pub async fn personal(
        &self,
        domain: Domain,
        athlete_id: Option<i64>,
        period: Option<String>,
    ) -> Result<PersonalSummary> {
        let request = PersonalRequest {
            athlete_id,
            period: Some(self.period_or_default(period)),
        };
        let summary = self.service.personal_summary(domain, &request).await?;
        Ok(summary)
    }

    pub async fn leaderboard(
        &self,
        domain: Domain,
        period: Option<String>,
        track: Option<String>,
        position: Option<String>,
    ) -> Result<Leaderboard> {
        let request = LeaderboardRequest {
            period: Some(self.period_or_default(period)),
            track,
            position,
        };
        let board = self.service.leaderboard(domain, &request).await?;
        Ok(board)
    }

    /// Import athletes first so trials can reference them.
    pub fn import(&self, athletes: Option<&Path>, trials: Option<&Path>) -> Result<ImportReport> {
        if athletes.is_none() && trials.is_none() {
            bail!("nothing to import: pass --athletes and/or --trials");
        }

        let mut report = ImportReport::default();
        if let Some(path) = athletes {
            let rows = import::load_athletes(path)?;
            self.db()
                .import_athletes(&rows)
                .with_context(|| format!("failed to import athletes from {}", path.display()))?;
            report.athletes = rows.len();
        }
        if let Some(path) = trials {
            let rows = import::load_trials(path)?;
            self.db()
                .import_trials(&rows)
                .with_context(|| format!("failed to import trials from {}", path.display()))?;
            report.trials = rows.len();
        }

        info!(
            "import complete: {} athlete(s), {} trial(s)",
            report.athletes, report.trials
        );
        Ok(report)
    }

    /// Run one command and render its result as pretty-printed JSON.
    pub async fn run(&self, command: Commands) -> Result<String> {
        let json = match command {
            Commands::Personal {
                domain,
                athlete,
                period,
            } => {
                let summary = self.personal(domain.into(), athlete, period).await?;
                serde_json::to_string_pretty(&summary)
            }
            Commands::Leaderboard {
                domain,
                period,
                track,
                position,
            } => {
                let board = self
                    .leaderboard(domain.into(), period, track, position)
                    .await?;
                serde_json::to_string_pretty(&board)
            }
            Commands::Import { athletes, trials } => {
                let report = self.import(athletes.as_deref(), trials.as_deref())?;
                serde_json::to_string_pretty(&report)
            }
        };
        json.context("failed to serialize result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DomainArg;
    use trialstats_core::model::{Athlete, Metrics, Profile, Role, ThrowMetrics};
    use trialstats_core::StatsError;

    fn app() -> App {
        let db = Database::open(":memory:").unwrap();
        db.upsert_athlete(&Athlete {
            id: 1,
            name: "Ana".into(),
            role: Role::Player,
            profile: Some(Profile {
                track: Some("engineering".into()),
                position: Some("pitcher".into()),
            }),
        })
        .unwrap();
        db.insert_finished(
            1,
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            Metrics::Throw(ThrowMetrics {
                distance: Some(40.0),
                ..Default::default()
            }),
        )
        .unwrap();
        App::new(db, "general").as_of(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
    }

    #[tokio::test]
    async fn default_period_is_applied_and_echoed() {
        let app = app();
        let board = app.leaderboard(Domain::Throw, None, None, None).await.unwrap();
        assert_eq!(board.period, "general");
        assert_eq!(board.entries.len(), 1);

        let weekly = app
            .leaderboard(Domain::Throw, Some("weekly".into()), None, None)
            .await
            .unwrap();
        assert!(weekly.entries.is_empty());
    }

    #[tokio::test]
    async fn missing_athlete_surfaces_invalid_input() {
        let err = app().personal(Domain::Throw, None, None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn run_renders_pretty_json() {
        let out = app()
            .run(Commands::Personal {
                domain: DomainArg::Throw,
                athlete: Some(1),
                period: None,
            })
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["period"], "general");
        assert_eq!(json["stats"]["means"]["distance"], "40.00");
        assert!(out.contains('\n'));
    }

    #[test]
    fn import_without_inputs_fails() {
        assert!(app().import(None, None).is_err());
    }
}
