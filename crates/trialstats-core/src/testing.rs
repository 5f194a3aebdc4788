// Record builders shared by the unit tests.

use chrono::NaiveDate;

use crate::model::*;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

pub fn player(id: AthleteId) -> Athlete {
    Athlete {
        id,
        name: format!("Player {id}"),
        role: Role::Player,
        profile: Some(Profile {
            track: Some("engineering".into()),
            position: Some("pitcher".into()),
        }),
    }
}

pub fn reaction(
    id: TrialId,
    athlete: AthleteId,
    kind: ReactionKind,
    attempts: Option<u32>,
    hits: u32,
    misses: u32,
) -> TrialRecord {
    TrialRecord {
        id,
        athlete: player(athlete),
        date: day(10),
        state: RecordState::Finished,
        metrics: Metrics::Reaction(ReactionMetrics {
            kind,
            attempts,
            hits: Some(hits),
            misses: Some(misses),
            started_at: None,
            finished_at: None,
        }),
    }
}

pub fn throw(id: TrialId, athlete: AthleteId, distance: f64) -> TrialRecord {
    TrialRecord {
        id,
        athlete: player(athlete),
        date: day(10),
        state: RecordState::Finished,
        metrics: Metrics::Throw(ThrowMetrics {
            flight_time: Some(1.5),
            speed: Some(20.0),
            power: Some(300.0),
            distance: Some(distance),
        }),
    }
}

pub fn jump(id: TrialId, athlete: AthleteId, left: f64, right: f64, movement: f64) -> TrialRecord {
    TrialRecord {
        id,
        athlete: player(athlete),
        date: day(10),
        state: RecordState::Finished,
        metrics: Metrics::Jump(JumpMetrics {
            left_extension: Some(left),
            right_extension: Some(right),
            movement: Some(movement),
        }),
    }
}
