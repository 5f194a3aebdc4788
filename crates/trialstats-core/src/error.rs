// Error taxonomy for the statistics engine.

use thiserror::Error;

use crate::model::{Domain, TrialId};

#[derive(Debug, Error)]
pub enum StatsError {
    /// A required correlation identifier was not supplied. Nothing is
    /// fetched or computed.
    #[error("missing required field `{field}`")]
    InvalidInput { field: &'static str },

    #[error("trial {id} has already been finished")]
    AlreadyFinished { id: TrialId },

    #[error("trial {id} is a {expected} trial, got {found} metrics")]
    DomainMismatch {
        id: TrialId,
        expected: Domain,
        found: Domain,
    },

    /// The upstream record fetch failed.
    #[error("failed to fetch trial records: {0:#}")]
    Source(#[source] anyhow::Error),
}
