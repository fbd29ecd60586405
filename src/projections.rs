//! First-touch projection over stored events.
//!
//! A pure function over already-filtered events; the service layer decides
//! which events and persons are in scope.

use crate::enrichment::PersonLookup;
use crate::models::{ActivityEvent, FirstTouchpoint};
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ordering key of one person reference within the scan.
///
/// Timestamps compare as instants at full precision, whatever their offset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScanKey {
    timestamp: DateTime<FixedOffset>,
    touchpoint_id: String,
    position: usize,
}

impl Ord for ScanKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.touchpoint_id.cmp(&other.touchpoint_id))
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for ScanKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    key: ScanKey,
    touch: FirstTouchpoint,
}

/// Earliest touchpoint per person, as a min-reduction keyed by person id.
///
/// `absorb` and `merge` keep, for each person, the reference with the smallest
/// `(timestamp, touchpoint_id, position)`; because that is associative and
/// commutative, partial projections over disjoint event batches can be merged
/// in any order and still agree with a single sequential scan.
#[derive(Debug, Default, Clone)]
pub struct FirstTouchProjection {
    firsts: HashMap<String, Candidate>,
}

impl FirstTouchProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every reference in `event` whose person is known to `persons`.
    pub fn absorb<L: PersonLookup + ?Sized>(&mut self, event: &ActivityEvent, persons: &L) {
        for (position, person_ref) in event.people.iter().enumerate() {
            let Some(person) = persons.lookup(&person_ref.id) else {
                continue;
            };

            let candidate = Candidate {
                key: ScanKey {
                    timestamp: event.timestamp,
                    touchpoint_id: event.touchpoint_id.clone(),
                    position,
                },
                touch: FirstTouchpoint {
                    person_id: person_ref.id.clone(),
                    person_name: person.full_name(),
                    timestamp: event.timestamp,
                    date: event.timestamp.date_naive(),
                },
            };
            self.keep_earliest(candidate);
        }
    }

    pub fn merge(mut self, other: FirstTouchProjection) -> Self {
        for candidate in other.firsts.into_values() {
            self.keep_earliest(candidate);
        }
        self
    }

    fn keep_earliest(&mut self, candidate: Candidate) {
        let earlier = self
            .firsts
            .get(&candidate.touch.person_id)
            .map_or(true, |existing| candidate.key < existing.key);
        if earlier {
            self.firsts
                .insert(candidate.touch.person_id.clone(), candidate);
        }
    }

    /// Winners in the order a chronological scan would first meet them
    pub fn into_touchpoints(self) -> Vec<FirstTouchpoint> {
        let mut candidates: Vec<Candidate> = self.firsts.into_values().collect();
        candidates.sort_by(|a, b| a.key.cmp(&b.key));
        candidates.into_iter().map(|c| c.touch).collect()
    }
}

pub fn first_touchpoints<'a, I, L>(events: I, persons: &L) -> Vec<FirstTouchpoint>
where
    I: IntoIterator<Item = &'a ActivityEvent>,
    L: PersonLookup + ?Sized,
{
    events
        .into_iter()
        .fold(FirstTouchProjection::new(), |mut projection, event| {
            projection.absorb(event, persons);
            projection
        })
        .into_touchpoints()
}
