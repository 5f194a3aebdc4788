// Per-athlete bucketing of trial records.

use std::collections::HashMap;

use crate::model::{Athlete, AthleteId, TrialRecord};

/// One athlete and their trials, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteBucket {
    pub athlete: Athlete,
    pub records: Vec<TrialRecord>,
}

/// Records partitioned by athlete, iterating in order of each athlete's
/// first appearance.
#[derive(Debug, Default)]
pub struct AthleteGroups {
    index: HashMap<AthleteId, usize>,
    buckets: Vec<AthleteBucket>,
}

impl AthleteGroups {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, id: AthleteId) -> Option<&AthleteBucket> {
        self.index.get(&id).map(|&i| &self.buckets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AthleteBucket> {
        self.buckets.iter()
    }

    fn push(&mut self, record: TrialRecord) {
        match self.index.get(&record.athlete.id) {
            Some(&i) => self.buckets[i].records.push(record),
            None => {
                self.index.insert(record.athlete.id, self.buckets.len());
                self.buckets.push(AthleteBucket {
                    athlete: record.athlete.clone(),
                    records: vec![record],
                });
            }
        }
    }
}

impl IntoIterator for AthleteGroups {
    type Item = AthleteBucket;
    type IntoIter = std::vec::IntoIter<AthleteBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}

/// Partition `records` by athlete in a single pass. The athlete of a bucket
/// is the one embedded in its first record.
pub fn group_by_athlete(records: impl IntoIterator<Item = TrialRecord>) -> AthleteGroups {
    let mut groups = AthleteGroups::default();
    for record in records {
        groups.push(record);
    }
    groups
}
