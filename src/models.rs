use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Direction value stored for events flowing toward the organization
pub const INBOUND: &str = "IN";

/// Person record (read-only from this service)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    #[serde(default)]
    pub job_title: Option<String>,
    pub customer_org_id: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Person as listed by the persons endpoint
#[derive(Debug, Serialize, Clone)]
pub struct PersonSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub job_title: Option<String>,
}

impl From<Person> for PersonSummary {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            email_address: person.email_address,
            job_title: person.job_title,
        }
    }
}

/// Weak reference from an event to a person, by id only
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PersonRef {
    pub id: String,
    #[serde(default)]
    pub role_in_touchpoint: Option<String>,
}

/// Stored touchpoint event
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActivityEvent {
    pub touchpoint_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub activity: String,
    pub channel: String,
    pub status: String,
    pub direction: String,
    #[serde(default)]
    pub people: Vec<PersonRef>,
    #[serde(default)]
    pub involved_team_ids: Vec<String>,
    #[serde(default)]
    pub campaign_name: Option<String>,
    pub record_type: String,
    pub customer_org_id: String,
    pub account_id: String,
}

/// Person details merged into an event reference when the person exists
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PersonDetails {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub job_title: Option<String>,
}

/// Event reference after enrichment; details are omitted entirely on a miss
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EnrichedPerson {
    pub id: String,
    pub role_in_touchpoint: Option<String>,
    #[serde(flatten)]
    pub details: Option<PersonDetails>,
}

/// Event as returned by the listing endpoints
#[derive(Debug, Serialize, Clone)]
pub struct ActivityEventView {
    pub touchpoint_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub formatted_date: String,
    pub activity: String,
    pub channel: String,
    pub status: String,
    pub direction: String,
    pub people: Vec<PersonRef>,
    pub people_details: Vec<EnrichedPerson>,
    pub involved_team_ids: Vec<String>,
    pub campaign_name: Option<String>,
    pub record_type: String,
}

/// Inbound events on one calendar date
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DailyActivityCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Earliest touchpoint recorded for a person
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FirstTouchpoint {
    pub person_id: String,
    pub person_name: String,
    pub timestamp: DateTime<FixedOffset>,
    pub date: NaiveDate,
}

/// Initial-load bundle for the timeline view
#[derive(Debug, Serialize)]
pub struct AllActivityData {
    pub activities: Vec<ActivityEventView>,
    pub daily_counts: Vec<DailyActivityCount>,
    pub first_touchpoints: Vec<FirstTouchpoint>,
    pub total_count: u64,
}

/// Fixture file accepted by the `import` command
#[derive(Debug, Deserialize, Default)]
pub struct Fixture {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub events: Vec<ActivityEvent>,
}
