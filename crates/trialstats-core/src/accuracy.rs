// Accuracy totals for reaction trials and metric means for throws and jumps.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fixed::Fixed2;
use crate::model::{JumpMetrics, Metrics, ReactionKind, ReactionMetrics, ThrowMetrics, TrialRecord};

// ---------------------------------------------------------------------------
// Reaction accuracy
// ---------------------------------------------------------------------------

/// Running sums over reaction counters.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    count: usize,
    attempts: u64,
    hits: u64,
    misses: u64,
}

impl Tally {
    fn add(&mut self, m: &ReactionMetrics) {
        self.count += 1;
        self.attempts += m.effective_attempts();
        self.hits += u64::from(m.hits());
        self.misses += u64::from(m.misses());
    }

    fn hit_rate(&self) -> Fixed2 {
        Fixed2::percent(self.hits, self.attempts)
    }

    fn miss_rate(&self) -> Fixed2 {
        Fixed2::percent(self.misses, self.attempts)
    }
}

/// Totals across every reaction trial in a set, regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyTotals {
    pub total_tests: usize,
    pub total_attempts: u64,
    pub total_hits: u64,
    pub total_misses: u64,
    pub hit_rate: Fixed2,
    pub miss_rate: Fixed2,
}

impl From<Tally> for AccuracyTotals {
    fn from(t: Tally) -> Self {
        Self {
            total_tests: t.count,
            total_attempts: t.attempts,
            total_hits: t.hits,
            total_misses: t.misses,
            hit_rate: t.hit_rate(),
            miss_rate: t.miss_rate(),
        }
    }
}

/// Totals for a single reaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub total_attempts: u64,
    pub total_hits: u64,
    pub total_misses: u64,
    pub hit_rate: Fixed2,
    pub miss_rate: Fixed2,
}

impl From<Tally> for CategoryStats {
    fn from(t: Tally) -> Self {
        Self {
            count: t.count,
            total_attempts: t.attempts,
            total_hits: t.hits,
            total_misses: t.misses,
            hit_rate: t.hit_rate(),
            miss_rate: t.miss_rate(),
        }
    }
}

/// Per-kind statistics. Always holds an entry for every `ReactionKind`.
pub type CategoryBreakdown = BTreeMap<ReactionKind, CategoryStats>;

fn reaction_metrics(records: &[TrialRecord]) -> impl Iterator<Item = &ReactionMetrics> {
    records.iter().filter_map(|r| match &r.metrics {
        Metrics::Reaction(m) => Some(m),
        _ => None,
    })
}

/// Sum counters across all reaction trials in `records`.
pub fn accuracy_totals(records: &[TrialRecord]) -> AccuracyTotals {
    let mut tally = Tally::default();
    for m in reaction_metrics(records) {
        tally.add(m);
    }
    tally.into()
}

/// Sum counters per reaction kind.
///
/// Every kind is seeded up front so that kinds without trials still report
/// all-zero values; callers rely on the complete key set.
pub fn accuracy_by_kind(records: &[TrialRecord]) -> CategoryBreakdown {
    let mut tallies: BTreeMap<ReactionKind, Tally> = ReactionKind::ALL
        .iter()
        .map(|&kind| (kind, Tally::default()))
        .collect();

    for m in reaction_metrics(records) {
        tallies.entry(m.kind).or_default().add(m);
    }

    tallies
        .into_iter()
        .map(|(kind, tally)| (kind, CategoryStats::from(tally)))
        .collect()
}

// ---------------------------------------------------------------------------
// Throw and jump means
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThrowMeans {
    pub distance: Fixed2,
    pub flight_time: Fixed2,
    pub speed: Fixed2,
    pub power: Fixed2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JumpMeans {
    pub left_extension: Fixed2,
    pub right_extension: Fixed2,
    pub movement: Fixed2,
}

impl JumpMeans {
    /// Mean of the three rounded means; the jump leaderboard's primary key.
    pub fn overall(&self) -> f64 {
        (self.left_extension.value() + self.right_extension.value() + self.movement.value()) / 3.0
    }
}

pub fn throw_metrics(
    records: &[TrialRecord],
) -> impl Iterator<Item = (&TrialRecord, &ThrowMetrics)> {
    records.iter().filter_map(|r| match &r.metrics {
        Metrics::Throw(m) => Some((r, m)),
        _ => None,
    })
}

pub fn jump_metrics(records: &[TrialRecord]) -> impl Iterator<Item = &JumpMetrics> {
    records.iter().filter_map(|r| match &r.metrics {
        Metrics::Jump(m) => Some(m),
        _ => None,
    })
}

/// Running sums over throw measurements. Missing values count as zero.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ThrowSums {
    n: usize,
    distance: f64,
    flight_time: f64,
    speed: f64,
    power: f64,
}

impl ThrowSums {
    pub(crate) fn add(&mut self, m: &ThrowMetrics) {
        self.n += 1;
        self.distance += m.distance.unwrap_or(0.0);
        self.flight_time += m.flight_time.unwrap_or(0.0);
        self.speed += m.speed.unwrap_or(0.0);
        self.power += m.power.unwrap_or(0.0);
    }

    pub(crate) fn count(&self) -> usize {
        self.n
    }

    pub(crate) fn means(&self) -> ThrowMeans {
        ThrowMeans {
            distance: Fixed2::mean(self.distance, self.n),
            flight_time: Fixed2::mean(self.flight_time, self.n),
            speed: Fixed2::mean(self.speed, self.n),
            power: Fixed2::mean(self.power, self.n),
        }
    }
}

/// Running sums over jump measurements. Missing values count as zero.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct JumpSums {
    n: usize,
    left: f64,
    right: f64,
    movement: f64,
}

impl JumpSums {
    pub(crate) fn add(&mut self, m: &JumpMetrics) {
        self.n += 1;
        self.left += m.left_extension.unwrap_or(0.0);
        self.right += m.right_extension.unwrap_or(0.0);
        self.movement += m.movement.unwrap_or(0.0);
    }

    pub(crate) fn count(&self) -> usize {
        self.n
    }

    pub(crate) fn means(&self) -> JumpMeans {
        JumpMeans {
            left_extension: Fixed2::mean(self.left, self.n),
            right_extension: Fixed2::mean(self.right, self.n),
            movement: Fixed2::mean(self.movement, self.n),
        }
    }
}

/// Arithmetic means of the throw measurements; zeros for an empty set.
pub fn throw_means(records: &[TrialRecord]) -> ThrowMeans {
    let mut sums = ThrowSums::default();
    for (_, m) in throw_metrics(records) {
        sums.add(m);
    }
    sums.means()
}

/// Arithmetic means of the jump measurements; zeros for an empty set.
pub fn jump_means(records: &[TrialRecord]) -> JumpMeans {
    let mut sums = JumpSums::default();
    for m in jump_metrics(records) {
        sums.add(m);
    }
    sums.means()
}
