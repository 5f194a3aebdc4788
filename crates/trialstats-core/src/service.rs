// Request orchestration: resolve the period, fetch, aggregate.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::StatsError;
use crate::grouping::group_by_athlete;
use crate::leaderboard::{rank, Leaderboard, LeaderboardFilters};
use crate::model::{AthleteId, Domain, Role, TrialRecord};
use crate::period::Period;
use crate::source::{ProfileFilter, RecordFilter, RecordOrder, RecordSource};
use crate::summary::{personal_summary, PersonalSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalRequest {
    pub athlete_id: Option<AthleteId>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardRequest {
    pub period: Option<String>,
    pub track: Option<String>,
    pub position: Option<String>,
}

/// Runs personal-summary and leaderboard requests against a `RecordSource`.
pub struct StatsService<S> {
    source: S,
    as_of: Option<NaiveDate>,
}

impl<S: RecordSource> StatsService<S> {
    pub fn new(source: S) -> Self {
        Self { source, as_of: None }
    }

    /// Pin "today" for period resolution instead of reading the local clock.
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.as_of = Some(today);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TrialRecord>, StatsError> {
        let mut records = self.source.fetch(filter).await.map_err(StatsError::Source)?;
        records.retain(|r| filter.matches(r));
        filter.order.apply(&mut records);

        let inconsistent = records.iter().filter(|r| r.is_inconsistent()).count();
        if inconsistent > 0 {
            warn!(
                domain = %filter.domain,
                "{} finished record(s) have missing metrics; counting them as zero",
                inconsistent
            );
        }
        Ok(records)
    }

    /// Period-scoped statistics for one athlete.
    pub async fn personal_summary(
        &self,
        domain: Domain,
        request: &PersonalRequest,
    ) -> Result<PersonalSummary, StatsError> {
        let athlete_id = request
            .athlete_id
            .ok_or(StatsError::InvalidInput { field: "athlete_id" })?;
        let period_tag = echo_period(request.period.as_deref());
        let range = Period::from_tag(request.period.as_deref()).resolve(self.today());

        // Throw and jump summaries read newest first, so the latest of equal
        // best records wins and the athlete comes from the latest record.
        let order = match domain {
            Domain::Reaction => RecordOrder::Insertion,
            Domain::Throw | Domain::Jump => RecordOrder::NewestFirst,
        };
        let filter = RecordFilter::new(domain)
            .athlete(athlete_id)
            .within(range)
            .ordered(order);
        let records = self.fetch(&filter).await?;
        debug!(
            athlete_id,
            %domain,
            period = %period_tag,
            "fetched {} record(s) for personal summary",
            records.len()
        );

        Ok(personal_summary(period_tag, domain, &records))
    }

    /// Top players for `domain` in the requested period, optionally narrowed
    /// by track and position. No matching records yields an empty board.
    pub async fn leaderboard(
        &self,
        domain: Domain,
        request: &LeaderboardRequest,
    ) -> Result<Leaderboard, StatsError> {
        let period_tag = echo_period(request.period.as_deref());
        let range = Period::from_tag(request.period.as_deref()).resolve(self.today());
        let profile = ProfileFilter::new(request.track.as_deref(), request.position.as_deref());
        let filters = LeaderboardFilters::from(&profile);

        let filter = RecordFilter::new(domain)
            .within(range)
            .role(Role::Player)
            .profile(profile);
        let records = self.fetch(&filter).await?;

        let groups = group_by_athlete(records);
        let athletes = groups.len();
        let entries = rank(domain, groups);
        info!(
            %domain,
            period = %period_tag,
            "leaderboard ranked {} athlete(s), returning {}",
            athletes,
            entries.len()
        );

        Ok(Leaderboard {
            period: period_tag,
            filters,
            entries,
        })
    }
}

/// The period label echoed back to callers: the requested tag as given, or
/// the default when none was supplied.
fn echo_period(tag: Option<&str>) -> String {
    match tag.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => Period::DEFAULT_TAG.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metrics, Profile, ReactionKind, RecordState};
    use crate::source::MemorySource;
    use crate::summary::DomainStats;
    use crate::testing::*;
    use async_trait::async_trait;

    fn service(records: Vec<TrialRecord>) -> StatsService<MemorySource> {
        StatsService::new(MemorySource::new(records)).as_of(day(17))
    }

    struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        async fn fetch(&self, _filter: &RecordFilter) -> anyhow::Result<Vec<TrialRecord>> {
            anyhow::bail!("storage unavailable")
        }
    }

    /// Ignores the filter entirely, like a misbehaving upstream.
    struct UnfilteredSource(Vec<TrialRecord>);

    #[async_trait]
    impl RecordSource for UnfilteredSource {
        async fn fetch(&self, _filter: &RecordFilter) -> anyhow::Result<Vec<TrialRecord>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn personal_summary_requires_athlete_id() {
        let svc = service(vec![reaction(1, 1, ReactionKind::Manual, Some(1), 1, 0)]);
        let err = svc
            .personal_summary(Domain::Reaction, &PersonalRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput { field: "athlete_id" }));
    }

    #[tokio::test]
    async fn personal_summary_scopes_to_athlete_and_period() {
        let mut old = reaction(4, 1, ReactionKind::Manual, Some(10), 0, 10);
        old.date = day(1);
        let svc = service(vec![
            reaction(1, 1, ReactionKind::Manual, Some(10), 7, 3),
            reaction(2, 2, ReactionKind::Manual, Some(10), 1, 9),
            reaction(3, 1, ReactionKind::Manual, Some(5), 5, 0),
            old,
        ]);
        let request = PersonalRequest {
            athlete_id: Some(1),
            period: Some("weekly".into()),
        };
        let summary = svc.personal_summary(Domain::Reaction, &request).await.unwrap();
        assert_eq!(summary.period, "weekly");
        assert_eq!(summary.athlete.unwrap().id, 1);
        let DomainStats::Reaction(stats) = summary.stats else {
            panic!("expected reaction stats");
        };
        assert_eq!(stats.general.total_tests, 2);
        assert_eq!(stats.general.hit_rate.to_string(), "80.00");
    }

    #[tokio::test]
    async fn personal_summary_with_no_records_is_zero_shaped() {
        let svc = service(vec![]);
        let request = PersonalRequest {
            athlete_id: Some(42),
            period: None,
        };
        let summary = svc.personal_summary(Domain::Jump, &request).await.unwrap();
        assert_eq!(summary.period, "general");
        assert!(summary.athlete.is_none());
        assert_eq!(summary.stats.domain(), Domain::Jump);
    }

    #[tokio::test]
    async fn unknown_period_echoes_tag_and_applies_no_bound() {
        let mut old = throw(1, 1, 30.0);
        old.date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let svc = service(vec![old]);
        let request = LeaderboardRequest {
            period: Some("yearly".into()),
            ..Default::default()
        };
        let board = svc.leaderboard(Domain::Throw, &request).await.unwrap();
        assert_eq!(board.period, "yearly");
        assert_eq!(board.entries.len(), 1);
    }

    #[tokio::test]
    async fn leaderboard_excludes_non_players_and_missing_profiles() {
        let mut coach = throw(1, 1, 90.0);
        coach.athlete.role = Role::Coach;
        let mut no_profile = throw(2, 2, 80.0);
        no_profile.athlete.profile = None;
        let mut started = throw(3, 3, 70.0);
        started.state = RecordState::Started;

        let svc = service(vec![coach, no_profile, started, throw(4, 4, 10.0)]);
        let board = svc
            .leaderboard(Domain::Throw, &LeaderboardRequest::default())
            .await
            .unwrap();
        let ids: Vec<_> = board.entries.iter().map(|e| e.athlete.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test]
    async fn leaderboard_track_filter_matching_nothing_is_empty() {
        let svc = service(vec![throw(1, 1, 40.0), throw(2, 2, 50.0)]);
        let request = LeaderboardRequest {
            period: None,
            track: Some("astronomy".into()),
            position: None,
        };
        let board = svc.leaderboard(Domain::Throw, &request).await.unwrap();
        assert!(board.entries.is_empty());
        assert_eq!(board.period, "general");
        assert_eq!(board.filters.track, "astronomy");
        assert_eq!(board.filters.position, "all");

        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["entries"], serde_json::json!([]));
        assert_eq!(json["filters"]["track"], "astronomy");
    }

    #[tokio::test]
    async fn leaderboard_filters_by_position() {
        let mut catcher = throw(1, 1, 40.0);
        catcher.athlete.profile = Some(Profile {
            track: Some("engineering".into()),
            position: Some("catcher".into()),
        });
        let svc = service(vec![catcher, throw(2, 2, 50.0)]);
        let request = LeaderboardRequest {
            position: Some("catcher".into()),
            ..Default::default()
        };
        let board = svc.leaderboard(Domain::Throw, &request).await.unwrap();
        let ids: Vec<_> = board.entries.iter().map(|e| e.athlete.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn records_from_a_loose_source_are_refiltered() {
        let mut started = reaction(1, 1, ReactionKind::Manual, None, 0, 0);
        started.state = RecordState::Started;
        let svc = StatsService::new(UnfilteredSource(vec![
            started,
            throw(2, 1, 40.0),
            reaction(3, 1, ReactionKind::Random, Some(4), 4, 0),
        ]))
        .as_of(day(17));
        let board = svc
            .leaderboard(Domain::Reaction, &LeaderboardRequest::default())
            .await
            .unwrap();
        assert_eq!(board.entries.len(), 1);
        let DomainStats::Reaction(stats) = &board.entries[0].stats else {
            panic!("expected reaction stats");
        };
        assert_eq!(stats.general.total_tests, 1);
    }

    #[tokio::test]
    async fn inconsistent_records_count_as_zero() {
        let mut partial = throw(1, 1, 0.0);
        if let Metrics::Throw(m) = &mut partial.metrics {
            m.distance = None;
            m.power = None;
        }
        let svc = service(vec![partial, throw(2, 1, 40.0)]);
        let request = PersonalRequest {
            athlete_id: Some(1),
            period: None,
        };
        let summary = svc.personal_summary(Domain::Throw, &request).await.unwrap();
        let DomainStats::Throw(stats) = summary.stats else {
            panic!("expected throw stats");
        };
        assert_eq!(stats.means.distance.to_string(), "20.00");
        assert_eq!(stats.means.power.to_string(), "150.00");
    }

    #[tokio::test]
    async fn personal_throw_tie_goes_to_latest_record() {
        let mut older = throw(1, 1, 50.0);
        older.date = day(1);
        let mut newer = throw(2, 1, 50.0);
        newer.date = day(15);
        newer.athlete.name = "Renamed".into();
        let svc = service(vec![older, newer]);
        let request = PersonalRequest {
            athlete_id: Some(1),
            period: None,
        };

        let summary = svc.personal_summary(Domain::Throw, &request).await.unwrap();
        assert_eq!(summary.athlete.unwrap().name, "Renamed");
        let DomainStats::Throw(stats) = summary.stats else {
            panic!("expected throw stats");
        };
        assert_eq!(stats.best_record.unwrap().id, 2);
    }

    #[tokio::test]
    async fn personal_reaction_tie_goes_to_earliest_record() {
        let mut later = reaction(1, 1, ReactionKind::Manual, Some(4), 4, 0);
        later.date = day(15);
        let mut earlier = reaction(2, 1, ReactionKind::Random, Some(2), 2, 0);
        earlier.date = day(12);
        let svc = service(vec![later, earlier]);
        let request = PersonalRequest {
            athlete_id: Some(1),
            period: None,
        };

        let summary = svc.personal_summary(Domain::Reaction, &request).await.unwrap();
        let DomainStats::Reaction(stats) = summary.stats else {
            panic!("expected reaction stats");
        };
        // Reaction summaries keep insertion order.
        assert_eq!(stats.best_record.unwrap().id, 1);
    }

    #[tokio::test]
    async fn source_failure_is_reported_as_generic_failure() {
        let svc = StatsService::new(FailingSource);
        let err = svc
            .leaderboard(Domain::Jump, &LeaderboardRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::Source(_)));
        assert!(err.to_string().contains("storage unavailable"));
    }
}
