// Per-domain statistics bundles and personal summaries.

use serde::Serialize;

use crate::accuracy::{
    accuracy_by_kind, accuracy_totals, AccuracyTotals, CategoryBreakdown, JumpMeans, ThrowMeans,
};
use crate::best::{
    best_reaction, fold_jumps, fold_throws, BestReactionRecord, BestThrowRecord, JumpFold,
    ThrowFold,
};
use crate::model::{Athlete, Domain, TrialRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionStats {
    pub general: AccuracyTotals,
    pub per_category: CategoryBreakdown,
    pub best_record: Option<BestReactionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThrowStats {
    pub total_records: usize,
    pub means: ThrowMeans,
    pub best_record: Option<BestThrowRecord>,
}

impl From<ThrowFold> for ThrowStats {
    fn from(fold: ThrowFold) -> Self {
        Self {
            total_records: fold.total_records,
            means: fold.means,
            best_record: fold.best,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JumpStats {
    pub total_records: usize,
    pub means: JumpMeans,
}

impl From<JumpFold> for JumpStats {
    fn from(fold: JumpFold) -> Self {
        Self {
            total_records: fold.total_records,
            means: fold.means,
        }
    }
}

/// The statistics bundle for one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainStats {
    Reaction(ReactionStats),
    Throw(ThrowStats),
    Jump(JumpStats),
}

impl DomainStats {
    /// Compute the bundle for `domain` over `records`. Records from other
    /// domains are ignored. An empty set yields the zero-shaped bundle.
    pub fn compute(domain: Domain, records: &[TrialRecord]) -> Self {
        match domain {
            Domain::Reaction => DomainStats::Reaction(reaction_stats(records)),
            Domain::Throw => DomainStats::Throw(fold_throws(records).into()),
            Domain::Jump => DomainStats::Jump(fold_jumps(records).into()),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            DomainStats::Reaction(_) => Domain::Reaction,
            DomainStats::Throw(_) => Domain::Throw,
            DomainStats::Jump(_) => Domain::Jump,
        }
    }
}

pub fn reaction_stats(records: &[TrialRecord]) -> ReactionStats {
    ReactionStats {
        general: accuracy_totals(records),
        per_category: accuracy_by_kind(records),
        best_record: best_reaction(records),
    }
}

/// Period-scoped statistics for a single athlete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalSummary {
    pub period: String,
    /// `None` when no trial matched.
    pub athlete: Option<Athlete>,
    pub stats: DomainStats,
}

/// Summarize one athlete's records. The athlete is taken from the first
/// record.
pub fn personal_summary(
    period: impl Into<String>,
    domain: Domain,
    records: &[TrialRecord],
) -> PersonalSummary {
    PersonalSummary {
        period: period.into(),
        athlete: records.first().map(|r| r.athlete.clone()),
        stats: DomainStats::compute(domain, records),
    }
}
