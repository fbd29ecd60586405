use crate::db::Database;
use crate::models::{ActivityEvent, Person, PersonRef};
use chrono::DateTime;

pub fn person(id: &str, org: &str) -> Person {
    Person {
        id: id.to_string(),
        first_name: format!("First {}", id),
        last_name: format!("Last {}", id),
        email_address: format!("{}@example.com", id),
        job_title: Some("Engineer".to_string()),
        customer_org_id: org.to_string(),
    }
}

/// Event in `org_1`/`acct_1` referencing the given person ids
pub fn event(id: &str, timestamp: &str, direction: &str, people: &[&str]) -> ActivityEvent {
    ActivityEvent {
        touchpoint_id: id.to_string(),
        timestamp: DateTime::parse_from_rfc3339(timestamp).unwrap(),
        activity: "meeting".to_string(),
        channel: "email".to_string(),
        status: "completed".to_string(),
        direction: direction.to_string(),
        people: people
            .iter()
            .map(|pid| PersonRef {
                id: pid.to_string(),
                role_in_touchpoint: Some("attendee".to_string()),
            })
            .collect(),
        involved_team_ids: vec!["team_1".to_string()],
        campaign_name: None,
        record_type: "touchpoint".to_string(),
        customer_org_id: "org_1".to_string(),
        account_id: "acct_1".to_string(),
    }
}

pub fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.upsert_person(&person("p1", "org_1")).unwrap();
    db.upsert_person(&person("p2", "org_1")).unwrap();
    db.upsert_person(&person("p3", "org_2")).unwrap();

    let events = [
        event("t1", "2024-01-01T09:00:00+00:00", "IN", &["p1"]),
        event("t2", "2024-01-01T15:00:00+00:00", "OUT", &["p2", "p1"]),
        event("t3", "2024-01-02T11:00:00+00:00", "IN", &["p2", "missing"]),
        event("t4", "2024-01-04T08:30:00+00:00", "IN", &["p3"]),
    ];
    for e in &events {
        db.upsert_event(e).unwrap();
    }

    let mut foreign = event("t5", "2023-12-31T08:00:00+00:00", "IN", &["p1"]);
    foreign.account_id = "acct_2".to_string();
    db.upsert_event(&foreign).unwrap();

    db
}
