// Cross-athlete leaderboards.

use std::cmp::Ordering;

use serde::Serialize;

use crate::best::{fold_jumps, fold_throws};
use crate::grouping::{AthleteBucket, AthleteGroups};
use crate::model::{Athlete, Domain};
use crate::source::ProfileFilter;
use crate::summary::{reaction_stats, DomainStats};

/// Maximum number of entries on a leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Label echoed for a filter that was not supplied.
const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardFilters {
    pub track: String,
    pub position: String,
}

impl From<&ProfileFilter> for LeaderboardFilters {
    fn from(filter: &ProfileFilter) -> Self {
        Self {
            track: filter.track.clone().unwrap_or_else(|| ALL.to_string()),
            position: filter.position.clone().unwrap_or_else(|| ALL.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub athlete: Athlete,
    pub stats: DomainStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub period: String,
    pub filters: LeaderboardFilters,
    pub entries: Vec<LeaderboardEntry>,
}

/// An entry with the keys it is ranked by. The keys are dropped before the
/// entry leaves this module.
struct Ranked {
    entry: LeaderboardEntry,
    primary: f64,
    secondary: f64,
}

/// Compute the statistics bundle and ranking keys for one athlete.
///
/// | domain   | primary                      | tie-break              |
/// |----------|------------------------------|------------------------|
/// | reaction | rounded total hit rate       | total hits             |
/// | throw    | rounded mean distance        | longest single throw   |
/// | jump     | mean of the three jump means | best single-jump mean  |
fn score(domain: Domain, bucket: AthleteBucket) -> Ranked {
    let AthleteBucket { athlete, records } = bucket;
    let (stats, primary, secondary) = match domain {
        Domain::Reaction => {
            let stats = reaction_stats(&records);
            let primary = stats.general.hit_rate.value();
            let secondary = stats.general.total_hits as f64;
            (DomainStats::Reaction(stats), primary, secondary)
        }
        Domain::Throw => {
            let fold = fold_throws(&records);
            let primary = fold.means.distance.value();
            let secondary = fold.best_distance;
            (DomainStats::Throw(fold.into()), primary, secondary)
        }
        Domain::Jump => {
            let fold = fold_jumps(&records);
            let primary = fold.means.overall();
            let secondary = fold.best_composite;
            (DomainStats::Jump(fold.into()), primary, secondary)
        }
    };
    Ranked {
        entry: LeaderboardEntry { athlete, stats },
        primary,
        secondary,
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Rank grouped athletes for `domain`, best first, capped at
/// `LEADERBOARD_SIZE`.
///
/// Sorting is stable, so athletes tied on both keys keep grouping order.
pub fn rank(domain: Domain, groups: AthleteGroups) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<Ranked> = groups
        .into_iter()
        .map(|bucket| score(domain, bucket))
        .collect();

    ranked.sort_by(|a, b| {
        descending(a.primary, b.primary).then_with(|| descending(a.secondary, b.secondary))
    });
    ranked.truncate(LEADERBOARD_SIZE);

    ranked.into_iter().map(|r| r.entry).collect()
}
