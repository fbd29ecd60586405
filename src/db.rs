use crate::error::{StorageError, StorageResult};
use crate::models::{ActivityEvent, Fixture, Person};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS persons (
    id              TEXT PRIMARY KEY,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    email_address   TEXT NOT NULL,
    job_title       TEXT,
    customer_org_id TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_persons_org ON persons (customer_org_id);

CREATE TABLE IF NOT EXISTS activity_events (
    touchpoint_id     TEXT PRIMARY KEY,
    timestamp         TEXT NOT NULL,
    timestamp_us      INTEGER NOT NULL,
    activity          TEXT NOT NULL,
    channel           TEXT NOT NULL,
    status            TEXT NOT NULL,
    direction         TEXT NOT NULL,
    people            TEXT NOT NULL DEFAULT '[]',
    involved_team_ids TEXT NOT NULL DEFAULT '[]',
    campaign_name     TEXT,
    record_type       TEXT NOT NULL,
    customer_org_id   TEXT NOT NULL,
    account_id        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_scope
    ON activity_events (customer_org_id, account_id, timestamp_us);
";

/// Shared handle to the SQLite store
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opened activity database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    pub fn upsert_person(&self, person: &Person) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO persons
                (id, first_name, last_name, email_address, job_title, customer_org_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person.id,
                person.first_name,
                person.last_name,
                person.email_address,
                person.job_title,
                person.customer_org_id,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_event(&self, event: &ActivityEvent) -> StorageResult<()> {
        let people = serde_json::to_string(&event.people)?;
        let team_ids = serde_json::to_string(&event.involved_team_ids)?;

        self.conn()?.execute(
            "INSERT OR REPLACE INTO activity_events
                (touchpoint_id, timestamp, timestamp_us, activity, channel, status, direction,
                 people, involved_team_ids, campaign_name, record_type, customer_org_id, account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                event.touchpoint_id,
                event.timestamp.to_rfc3339(),
                event.timestamp.timestamp_micros(),
                event.activity,
                event.channel,
                event.status,
                event.direction,
                people,
                team_ids,
                event.campaign_name,
                event.record_type,
                event.customer_org_id,
                event.account_id,
            ],
        )?;
        Ok(())
    }

    /// Load a JSON fixture of persons and events, replacing rows with the same id
    pub fn import_fixture<P: AsRef<Path>>(&self, path: P) -> StorageResult<(usize, usize)> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let fixture: Fixture = serde_json::from_str(&raw)?;

        for person in &fixture.persons {
            self.upsert_person(person)?;
        }
        for event in &fixture.events {
            self.upsert_event(event)?;
        }

        debug!(
            persons = fixture.persons.len(),
            events = fixture.events.len(),
            "fixture imported"
        );
        Ok((fixture.persons.len(), fixture.events.len()))
    }
}
