use crate::models::{ActivityEvent, ActivityEventView, EnrichedPerson, Person, PersonDetails, PersonRef};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

/// Resolves a person reference by id; a miss is a normal outcome
pub trait PersonLookup {
    fn lookup(&self, id: &str) -> Option<&Person>;
}

impl PersonLookup for HashMap<String, Person> {
    fn lookup(&self, id: &str) -> Option<&Person> {
        self.get(id)
    }
}

/// Merge each reference with its person's details, preserving order and duplicates
pub fn enrich_people<L: PersonLookup + ?Sized>(refs: &[PersonRef], lookup: &L) -> Vec<EnrichedPerson> {
    refs.iter()
        .map(|person_ref| EnrichedPerson {
            id: person_ref.id.clone(),
            role_in_touchpoint: person_ref.role_in_touchpoint.clone(),
            details: lookup.lookup(&person_ref.id).map(|person| PersonDetails {
                first_name: person.first_name.clone(),
                last_name: person.last_name.clone(),
                email_address: person.email_address.clone(),
                job_title: person.job_title.clone(),
            }),
        })
        .collect()
}

/// `YYYY-MM-DD HH:MM` in the timestamp's own offset
pub fn format_date(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

pub fn to_view<L: PersonLookup + ?Sized>(event: ActivityEvent, lookup: &L) -> ActivityEventView {
    let people_details = enrich_people(&event.people, lookup);
    ActivityEventView {
        formatted_date: format_date(&event.timestamp),
        touchpoint_id: event.touchpoint_id,
        timestamp: event.timestamp,
        activity: event.activity,
        channel: event.channel,
        status: event.status,
        direction: event.direction,
        people: event.people,
        people_details,
        involved_team_ids: event.involved_team_ids,
        campaign_name: event.campaign_name,
        record_type: event.record_type,
    }
}

/// Distinct person ids referenced across a batch of events
pub fn referenced_ids(events: &[ActivityEvent]) -> Vec<&str> {
    let mut ids: Vec<&str> = events
        .iter()
        .flat_map(|event| event.people.iter().map(|p| p.id.as_str()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
