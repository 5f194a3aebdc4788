// Best-record selection.
//
// Reaction trials are scanned for the highest hit rate. Throws and jumps track
// their best record inside the same fold that accumulates their means, so a
// bucket is walked once.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::accuracy::{JumpMeans, JumpSums, ThrowMeans, ThrowSums};
use crate::fixed::Fixed2;
use crate::model::{Metrics, ReactionKind, ThrowMetrics, TrialId, TrialRecord};

// ---------------------------------------------------------------------------
// Reaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestReactionRecord {
    pub id: TrialId,
    pub kind: ReactionKind,
    pub date: NaiveDate,
    pub attempts: u64,
    pub hits: u32,
    pub misses: u32,
    pub hit_rate: Fixed2,
    pub started_at: Option<NaiveTime>,
    pub finished_at: Option<NaiveTime>,
}

/// Pick the reaction trial with the highest hit rate.
///
/// Trials with zero attempts score -1 and lose to any trial with attempts.
/// Ties keep the earliest trial. Returns `None` only when `records` holds no
/// reaction trial.
pub fn best_reaction(records: &[TrialRecord]) -> Option<BestReactionRecord> {
    let mut best = None;
    let mut best_rate = f64::NEG_INFINITY;

    for record in records {
        let Metrics::Reaction(m) = &record.metrics else {
            continue;
        };
        let attempts = m.effective_attempts();
        let rate = if attempts > 0 {
            f64::from(m.hits()) / attempts as f64
        } else {
            -1.0
        };
        if best.is_none() || rate > best_rate {
            best = Some((record, m));
            best_rate = rate;
        }
    }

    best.map(|(record, m)| {
        let attempts = m.effective_attempts();
        BestReactionRecord {
            id: record.id,
            kind: m.kind,
            date: record.date,
            attempts,
            hits: m.hits(),
            misses: m.misses(),
            hit_rate: Fixed2::percent(u64::from(m.hits()), attempts),
            started_at: m.started_at,
            finished_at: m.finished_at,
        }
    })
}

// ---------------------------------------------------------------------------
// Throw
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestThrowRecord {
    pub id: TrialId,
    pub distance: Option<f64>,
    pub flight_time: Option<f64>,
    pub speed: Option<f64>,
    pub power: Option<f64>,
    pub date: NaiveDate,
}

/// Means and the longest throw of a bucket, from one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowFold {
    pub total_records: usize,
    pub means: ThrowMeans,
    pub best: Option<BestThrowRecord>,
    /// Distance of `best`; 0.0 when there is none.
    pub best_distance: f64,
}

/// Fold throw trials into means plus the longest throw. A missing distance
/// compares as zero; the first of equal distances is kept.
pub fn fold_throws(records: &[TrialRecord]) -> ThrowFold {
    let mut sums = ThrowSums::default();
    let mut best: Option<(&TrialRecord, &ThrowMetrics)> = None;
    let mut best_distance = 0.0;

    for record in records {
        let Metrics::Throw(m) = &record.metrics else {
            continue;
        };
        sums.add(m);
        let distance = m.distance.unwrap_or(0.0);
        if best.is_none() || distance > best_distance {
            best = Some((record, m));
            best_distance = distance;
        }
    }

    ThrowFold {
        total_records: sums.count(),
        means: sums.means(),
        best: best.map(|(record, m)| BestThrowRecord {
            id: record.id,
            distance: m.distance,
            flight_time: m.flight_time,
            speed: m.speed,
            power: m.power,
            date: record.date,
        }),
        best_distance,
    }
}

// ---------------------------------------------------------------------------
// Jump
// ---------------------------------------------------------------------------

/// Means and the best single-jump composite of a bucket, from one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpFold {
    pub total_records: usize,
    pub means: JumpMeans,
    /// Highest per-record `(left + right + movement) / 3`; 0.0 when empty.
    pub best_composite: f64,
}

pub fn fold_jumps(records: &[TrialRecord]) -> JumpFold {
    let mut sums = JumpSums::default();
    let mut best_composite: Option<f64> = None;

    for record in records {
        let Metrics::Jump(m) = &record.metrics else {
            continue;
        };
        sums.add(m);
        let composite = m.composite();
        if best_composite.map_or(true, |b| composite > b) {
            best_composite = Some(composite);
        }
    }

    JumpFold {
        total_records: sums.count(),
        means: sums.means(),
        best_composite: best_composite.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn scenario_best_reaction_is_perfect_manual() {
        let records = vec![
            reaction(1, 1, ReactionKind::Manual, Some(10), 7, 3),
            reaction(2, 1, ReactionKind::Manual, Some(5), 5, 0),
            reaction(3, 1, ReactionKind::Sequential, Some(8), 2, 6),
        ];
        let best = best_reaction(&records).unwrap();
        assert_eq!(best.id, 2);
        assert_eq!(best.kind, ReactionKind::Manual);
        assert_eq!(best.hit_rate.to_string(), "100.00");
        assert_eq!(best.attempts, 5);
    }

    #[test]
    fn first_occurrence_wins_ties() {
        let records = vec![
            reaction(1, 1, ReactionKind::Manual, Some(4), 2, 2),
            reaction(2, 1, ReactionKind::Random, Some(8), 4, 4),
            reaction(3, 1, ReactionKind::Sequential, Some(2), 1, 1),
        ];
        assert_eq!(best_reaction(&records).unwrap().id, 1);
    }

    #[test]
    fn zero_attempt_trials_lose_to_any_valid_trial() {
        let records = vec![
            reaction(1, 1, ReactionKind::Manual, Some(0), 0, 0),
            reaction(2, 1, ReactionKind::Manual, Some(10), 0, 10),
        ];
        // 0% beats the -1 assigned to a trial without attempts.
        assert_eq!(best_reaction(&records).unwrap().id, 2);
    }

    #[test]
    fn huge_counters_keep_full_attempts() {
        let records = vec![reaction(
            1,
            1,
            ReactionKind::Random,
            None,
            3_000_000_000,
            2_000_000_000,
        )];
        let best = best_reaction(&records).unwrap();
        assert_eq!(best.attempts, 5_000_000_000);
        assert_eq!(best.hit_rate.to_string(), "60.00");
    }

    #[test]
    fn only_zero_attempt_trials_still_yields_first() {
        let records = vec![
            reaction(4, 1, ReactionKind::Manual, None, 0, 0),
            reaction(5, 1, ReactionKind::Random, None, 0, 0),
        ];
        let best = best_reaction(&records).unwrap();
        assert_eq!(best.id, 4);
        assert_eq!(best.hit_rate, Fixed2::ZERO);
    }

    #[test]
    fn empty_input_has_no_best() {
        assert!(best_reaction(&[]).is_none());
        assert!(fold_throws(&[]).best.is_none());
    }

    #[test]
    fn longest_throw_first_occurrence_wins() {
        let records = vec![throw(1, 1, 40.0), throw(2, 1, 50.0), throw(3, 1, 50.0)];
        let fold = fold_throws(&records);
        let best = fold.best.unwrap();
        assert_eq!(best.id, 2);
        assert_eq!(best.distance, Some(50.0));
        assert_eq!(fold.best_distance, 50.0);
        assert_eq!(fold.total_records, 3);
        assert_eq!(fold.means.distance.to_string(), "46.67");
    }

    #[test]
    fn missing_distance_compares_as_zero() {
        let mut first = throw(1, 1, 0.0);
        if let Metrics::Throw(m) = &mut first.metrics {
            m.distance = None;
        }
        let records = vec![first, throw(2, 1, 5.0)];
        assert_eq!(fold_throws(&records).best.unwrap().id, 2);
    }

    #[test]
    fn jump_fold_tracks_best_composite() {
        let records = vec![jump(1, 1, 30.0, 30.0, 30.0), jump(2, 1, 40.0, 35.0, 30.0)];
        let fold = fold_jumps(&records);
        assert_eq!(fold.total_records, 2);
        assert!((fold.best_composite - 35.0).abs() < 1e-9);
        assert_eq!(fold.means.left_extension.to_string(), "35.00");
    }

    #[test]
    fn best_record_serializes_plain_fields() {
        let records = vec![reaction(9, 1, ReactionKind::Sequential, Some(4), 3, 1)];
        let json = serde_json::to_value(best_reaction(&records).unwrap()).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["kind"], "sequential");
        assert_eq!(json["hit_rate"], "75.00");
        assert_eq!(json["date"], "2026-10-10");
    }
}
