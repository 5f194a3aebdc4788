// Trial records, athletes, and their per-domain metrics.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StatsError;

pub type AthleteId = i64;
pub type TrialId = i64;

// ---------------------------------------------------------------------------
// Athletes
// ---------------------------------------------------------------------------

/// Account role. Only players appear on leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Coach,
    Technician,
}

impl Role {
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "player" => Some(Role::Player),
            "coach" => Some(Role::Coach),
            "technician" => Some(Role::Technician),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Coach => "coach",
            Role::Technician => "technician",
        }
    }
}

/// Player profile: the career track and primary position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub track: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub role: Role,
    pub profile: Option<Profile>,
}

// ---------------------------------------------------------------------------
// Domains and metrics
// ---------------------------------------------------------------------------

/// The three record families. Each is aggregated and ranked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Reaction,
    Throw,
    Jump,
}

impl Domain {
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reaction" => Some(Domain::Reaction),
            "throw" => Some(Domain::Throw),
            "jump" => Some(Domain::Jump),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Reaction => "reaction",
            Domain::Throw => "throw",
            Domain::Jump => "jump",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction-test variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Manual,
    Sequential,
    Random,
}

impl ReactionKind {
    /// Every kind, in reporting order.
    pub const ALL: [ReactionKind; 3] = [
        ReactionKind::Manual,
        ReactionKind::Sequential,
        ReactionKind::Random,
    ];

    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Some(ReactionKind::Manual),
            "sequential" => Some(ReactionKind::Sequential),
            "random" => Some(ReactionKind::Random),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Manual => "manual",
            ReactionKind::Sequential => "sequential",
            ReactionKind::Random => "random",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionMetrics {
    pub kind: ReactionKind,
    pub attempts: Option<u32>,
    pub hits: Option<u32>,
    pub misses: Option<u32>,
    pub started_at: Option<NaiveTime>,
    pub finished_at: Option<NaiveTime>,
}

impl ReactionMetrics {
    /// Empty counters for a trial that has only been started.
    pub fn pending(kind: ReactionKind) -> Self {
        Self {
            kind,
            attempts: None,
            hits: None,
            misses: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits.unwrap_or(0)
    }

    pub fn misses(&self) -> u32 {
        self.misses.unwrap_or(0)
    }

    /// Attempts used by every aggregate: the recorded value when present and
    /// non-zero, otherwise hits + misses.
    pub fn effective_attempts(&self) -> u64 {
        match self.attempts {
            Some(n) if n > 0 => u64::from(n),
            _ => u64::from(self.hits()) + u64::from(self.misses()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrowMetrics {
    pub flight_time: Option<f64>,
    pub speed: Option<f64>,
    pub power: Option<f64>,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpMetrics {
    pub left_extension: Option<f64>,
    pub right_extension: Option<f64>,
    pub movement: Option<f64>,
}

impl JumpMetrics {
    /// Mean of the three measurements, missing ones counted as zero.
    pub fn composite(&self) -> f64 {
        (self.left_extension.unwrap_or(0.0)
            + self.right_extension.unwrap_or(0.0)
            + self.movement.unwrap_or(0.0))
            / 3.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum Metrics {
    Reaction(ReactionMetrics),
    Throw(ThrowMetrics),
    Jump(JumpMetrics),
}

impl Metrics {
    pub fn domain(&self) -> Domain {
        match self {
            Metrics::Reaction(_) => Domain::Reaction,
            Metrics::Throw(_) => Domain::Throw,
            Metrics::Jump(_) => Domain::Jump,
        }
    }

    /// Whether any numeric field is unset.
    pub fn has_missing_fields(&self) -> bool {
        match self {
            Metrics::Reaction(m) => m.hits.is_none() || m.misses.is_none(),
            Metrics::Throw(m) => {
                m.flight_time.is_none()
                    || m.speed.is_none()
                    || m.power.is_none()
                    || m.distance.is_none()
            }
            Metrics::Jump(m) => {
                m.left_extension.is_none() || m.right_extension.is_none() || m.movement.is_none()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Trial records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Started,
    Finished,
}

impl RecordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Started => "started",
            RecordState::Finished => "finished",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "started" => Some(RecordState::Started),
            "finished" => Some(RecordState::Finished),
            _ => None,
        }
    }
}

/// One measurement session for one athlete, with the athlete embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: TrialId,
    pub athlete: Athlete,
    pub date: NaiveDate,
    pub state: RecordState,
    pub metrics: Metrics,
}

impl TrialRecord {
    pub fn domain(&self) -> Domain {
        self.metrics.domain()
    }

    pub fn is_finished(&self) -> bool {
        self.state == RecordState::Finished
    }

    /// A finished record with unset numeric fields. Aggregates count the
    /// missing fields as zero.
    pub fn is_inconsistent(&self) -> bool {
        self.is_finished() && self.metrics.has_missing_fields()
    }

    /// Attach final metrics to a started record.
    ///
    /// A finished record is immutable: finishing it again is rejected, as is
    /// finishing with metrics from another domain. For reaction trials the
    /// kind chosen at start is kept.
    pub fn finish(mut self, metrics: Metrics) -> Result<TrialRecord, StatsError> {
        if self.is_finished() {
            return Err(StatsError::AlreadyFinished { id: self.id });
        }
        if metrics.domain() != self.domain() {
            return Err(StatsError::DomainMismatch {
                id: self.id,
                expected: self.domain(),
                found: metrics.domain(),
            });
        }
        self.metrics = match (self.metrics, metrics) {
            (Metrics::Reaction(started), Metrics::Reaction(done)) => {
                Metrics::Reaction(ReactionMetrics {
                    kind: started.kind,
                    ..done
                })
            }
            (_, done) => done,
        };
        self.state = RecordState::Finished;
        Ok(self)
    }
}
