// Record-fetch boundary.

use async_trait::async_trait;

use crate::model::{Athlete, AthleteId, Domain, RecordState, Role, TrialRecord};
use crate::period::DateRange;

/// Track/position filter applied to an athlete's profile.
///
/// The profile join is hard: an athlete without a profile never matches,
/// even when both filters are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFilter {
    pub track: Option<String>,
    pub position: Option<String>,
}

impl ProfileFilter {
    /// Build a filter from optional request values; blank values count as
    /// absent.
    pub fn new(track: Option<&str>, position: Option<&str>) -> Self {
        let clean = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            track: clean(track),
            position: clean(position),
        }
    }

    pub fn admits(&self, athlete: &Athlete) -> bool {
        let Some(profile) = &athlete.profile else {
            return false;
        };
        let track_ok = match &self.track {
            Some(want) => profile.track.as_deref() == Some(want.as_str()),
            None => true,
        };
        let position_ok = match &self.position {
            Some(want) => profile.position.as_deref() == Some(want.as_str()),
            None => true,
        };
        track_ok && position_ok
    }
}

/// Order in which a source returns records. Best-record selection keeps
/// the first of equal candidates, so the order decides ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordOrder {
    /// Ascending trial id.
    #[default]
    Insertion,
    /// Latest date first, then highest trial id.
    NewestFirst,
}

impl RecordOrder {
    /// Sort `records` in place. Stable, so `Insertion` on already ordered
    /// input is a no-op.
    pub fn apply(self, records: &mut [TrialRecord]) {
        match self {
            RecordOrder::Insertion => records.sort_by_key(|r| r.id),
            RecordOrder::NewestFirst => {
                records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)))
            }
        }
    }
}

/// What to fetch. Defaults to finished records of one domain, unbounded,
/// in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub domain: Domain,
    pub athlete_id: Option<AthleteId>,
    pub date_range: Option<DateRange>,
    pub state: RecordState,
    pub role: Option<Role>,
    pub profile: Option<ProfileFilter>,
    pub order: RecordOrder,
}

impl RecordFilter {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            athlete_id: None,
            date_range: None,
            state: RecordState::Finished,
            role: None,
            profile: None,
            order: RecordOrder::Insertion,
        }
    }

    pub fn athlete(mut self, id: AthleteId) -> Self {
        self.athlete_id = Some(id);
        self
    }

    pub fn within(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn profile(mut self, profile: ProfileFilter) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn ordered(mut self, order: RecordOrder) -> Self {
        self.order = order;
        self
    }

    /// In-memory form of the predicate a `RecordSource` applies.
    pub fn matches(&self, record: &TrialRecord) -> bool {
        if record.domain() != self.domain || record.state != self.state {
            return false;
        }
        if self.athlete_id.is_some_and(|id| record.athlete.id != id) {
            return false;
        }
        if self.date_range.is_some_and(|range| !range.contains(record.date)) {
            return false;
        }
        if self.role.is_some_and(|role| record.athlete.role != role) {
            return false;
        }
        match &self.profile {
            Some(profile) => profile.admits(&record.athlete),
            None => true,
        }
    }
}

/// Supplies trial records, each with its athlete embedded, in the order
/// `filter.order` names.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, filter: &RecordFilter) -> anyhow::Result<Vec<TrialRecord>>;
}

/// A `RecordSource` over records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<TrialRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<TrialRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch(&self, filter: &RecordFilter) -> anyhow::Result<Vec<TrialRecord>> {
        let mut records: Vec<TrialRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        filter.order.apply(&mut records);
        Ok(records)
    }
}
