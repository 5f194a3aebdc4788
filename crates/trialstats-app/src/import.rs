// CSV import of athletes and finished trials.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::warn;
use trialstats_core::model::{
    Athlete, AthleteId, Domain, JumpMetrics, Metrics, Profile, ReactionKind, ReactionMetrics,
    Role, ThrowMetrics,
};
use trialstats_store::NewTrial;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

/// `id,name,role,track,position`. Blank track and position mean the athlete
/// has no profile.
#[derive(Debug, Deserialize)]
struct RawAthlete {
    id: AthleteId,
    name: String,
    role: String,
    #[serde(default)]
    track: Option<String>,
    #[serde(default)]
    position: Option<String>,
}

/// One finished trial. Only the columns of the row's domain are read; the
/// rest may be blank.
#[derive(Debug, Deserialize)]
struct RawTrial {
    athlete_id: AthleteId,
    domain: String,
    date: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    attempts: Option<u32>,
    #[serde(default)]
    hits: Option<u32>,
    #[serde(default)]
    misses: Option<u32>,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    finished_at: Option<String>,
    #[serde(default)]
    flight_time: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    power: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    left_extension: Option<f64>,
    #[serde(default)]
    right_extension: Option<f64>,
    #[serde(default)]
    movement: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_time(value: Option<String>) -> Result<Option<NaiveTime>, String> {
    match non_blank(value) {
        Some(t) => NaiveTime::parse_from_str(&t, "%H:%M:%S")
            .map(Some)
            .map_err(|e| format!("bad time '{t}': {e}")),
        None => Ok(None),
    }
}

/// Finite, non-negative measurement or `None`.
fn measurement(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl RawTrial {
    fn into_new_trial(self) -> Result<NewTrial, String> {
        let domain = Domain::from_tag(&self.domain)
            .ok_or_else(|| format!("unknown domain '{}'", self.domain.trim()))?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|e| format!("bad date '{}': {e}", self.date.trim()))?;

        let metrics = match domain {
            Domain::Reaction => {
                let kind_tag = non_blank(self.kind).ok_or("reaction trial without kind")?;
                let kind = ReactionKind::from_tag(&kind_tag)
                    .ok_or_else(|| format!("unknown reaction kind '{kind_tag}'"))?;
                Metrics::Reaction(ReactionMetrics {
                    kind,
                    attempts: self.attempts,
                    hits: self.hits,
                    misses: self.misses,
                    started_at: parse_time(self.started_at)?,
                    finished_at: parse_time(self.finished_at)?,
                })
            }
            Domain::Throw => Metrics::Throw(ThrowMetrics {
                flight_time: measurement(self.flight_time),
                speed: measurement(self.speed),
                power: measurement(self.power),
                distance: measurement(self.distance),
            }),
            Domain::Jump => Metrics::Jump(JumpMetrics {
                left_extension: measurement(self.left_extension),
                right_extension: measurement(self.right_extension),
                movement: measurement(self.movement),
            }),
        };

        Ok(NewTrial {
            athlete_id: self.athlete_id,
            date,
            metrics,
        })
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

pub fn load_athletes_from_reader<R: Read>(rdr: R) -> Result<Vec<Athlete>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut athletes = Vec::new();
    for result in reader.deserialize::<RawAthlete>() {
        match result {
            Ok(raw) => {
                let Some(role) = Role::from_tag(&raw.role) else {
                    warn!("skipping athlete {}: unknown role '{}'", raw.id, raw.role.trim());
                    continue;
                };
                let track = non_blank(raw.track);
                let position = non_blank(raw.position);
                let profile = if track.is_some() || position.is_some() {
                    Some(Profile { track, position })
                } else {
                    None
                };
                athletes.push(Athlete {
                    id: raw.id,
                    name: raw.name.trim().to_string(),
                    role,
                    profile,
                });
            }
            Err(e) => {
                warn!("skipping malformed athlete row: {}", e);
            }
        }
    }
    Ok(athletes)
}

pub fn load_trials_from_reader<R: Read>(rdr: R) -> Result<Vec<NewTrial>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut trials = Vec::new();
    for result in reader.deserialize::<RawTrial>() {
        match result {
            Ok(raw) => {
                let athlete_id = raw.athlete_id;
                match raw.into_new_trial() {
                    Ok(trial) => trials.push(trial),
                    Err(reason) => {
                        warn!("skipping trial for athlete {}: {}", athlete_id, reason);
                    }
                }
            }
            Err(e) => {
                warn!("skipping malformed trial row: {}", e);
            }
        }
    }
    Ok(trials)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

pub fn load_athletes(path: &Path) -> Result<Vec<Athlete>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_athletes_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_trials(path: &Path) -> Result<Vec<NewTrial>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_trials_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}
