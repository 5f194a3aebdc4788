// Statistics engine for athletic trial records: period windows, accuracy
// aggregation, best-record selection, per-athlete grouping, and leaderboards.

pub mod accuracy;
pub mod best;
pub mod error;
pub mod fixed;
pub mod grouping;
pub mod leaderboard;
pub mod model;
pub mod period;
pub mod service;
pub mod source;
pub mod summary;

#[cfg(test)]
mod testing;

pub use error::StatsError;
pub use leaderboard::{Leaderboard, LEADERBOARD_SIZE};
pub use model::{Athlete, Domain, Metrics, RecordState, Role, TrialRecord};
pub use period::{DateRange, Period};
pub use service::{LeaderboardRequest, PersonalRequest, StatsService};
pub use source::{MemorySource, ProfileFilter, RecordFilter, RecordOrder, RecordSource};
pub use summary::{DomainStats, PersonalSummary};
