//! Read-only SQL access for events and persons.
//!
//! Filters are compiled into a parameterised `WHERE` clause; everything above
//! this module works with typed records only.

use crate::db::Database;
use crate::error::StorageResult;
use crate::models::{ActivityEvent, DailyActivityCount, Person, PersonRef, INBOUND};
use chrono::{DateTime, NaiveDate};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Row};
use std::collections::HashMap;

const EVENT_COLUMNS: &str = "touchpoint_id, timestamp, activity, channel, status, direction, \
     people, involved_team_ids, campaign_name, record_type, customer_org_id, account_id";

const PERSON_COLUMNS: &str =
    "id, first_name, last_name, email_address, job_title, customer_org_id";

/// Conjunctive event filter; `None` means no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub customer_org_id: Option<String>,
    pub account_id: Option<String>,
    pub direction: Option<String>,
    /// Inclusive lower bound, unix microseconds
    pub start_us: Option<i64>,
    /// Inclusive upper bound, unix microseconds
    pub end_us: Option<i64>,
}

impl EventFilter {
    pub fn scoped(customer_org_id: Option<String>, account_id: Option<String>) -> Self {
        Self {
            customer_org_id,
            account_id,
            ..Self::default()
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        let exact = [
            ("customer_org_id", &self.customer_org_id),
            ("account_id", &self.account_id),
            ("direction", &self.direction),
        ];
        for (column, value) in exact {
            if let Some(value) = value {
                values.push(Value::Text(value.clone()));
                clauses.push(format!("{} = ?{}", column, values.len()));
            }
        }
        if let Some(start) = self.start_us {
            values.push(Value::Integer(start));
            clauses.push(format!("timestamp_us >= ?{}", values.len()));
        }
        if let Some(end) = self.end_us {
            values.push(Value::Integer(end));
            clauses.push(format!("timestamp_us <= ?{}", values.len()));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first, ties by touchpoint id
    Ascending,
    /// Newest first, ties by touchpoint id
    Descending,
}

impl SortOrder {
    fn order_by(self) -> &'static str {
        match self {
            SortOrder::Ascending => " ORDER BY timestamp_us ASC, touchpoint_id ASC",
            SortOrder::Descending => " ORDER BY timestamp_us DESC, touchpoint_id ASC",
        }
    }
}

pub struct Repository<'a> {
    db: &'a Database,
}

impl<'a> Repository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn find_events(
        &self,
        filter: &EventFilter,
        order: SortOrder,
        limit: Option<u64>,
        offset: u64,
    ) -> StorageResult<Vec<ActivityEvent>> {
        let (where_sql, mut values) = filter.where_clause();
        let mut sql = format!(
            "SELECT {} FROM activity_events{}{}",
            EVENT_COLUMNS,
            where_sql,
            order.order_by()
        );
        if let Some(limit) = limit {
            values.push(Value::Integer(limit as i64));
            values.push(Value::Integer(offset as i64));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", values.len() - 1, values.len()));
        }

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params_from_iter(values.iter()), map_event_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn count_events(&self, filter: &EventFilter) -> StorageResult<u64> {
        let (where_sql, values) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM activity_events{}", where_sql);

        let conn = self.db.conn()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Distinct inbound touchpoints per calendar date, oldest date first.
    ///
    /// The date is the one written in each stored timestamp, i.e. in the
    /// event's own offset. Dates without events are not emitted.
    pub fn daily_inbound_counts(
        &self,
        filter: &EventFilter,
    ) -> StorageResult<Vec<DailyActivityCount>> {
        let inbound = EventFilter {
            direction: Some(INBOUND.to_string()),
            ..filter.clone()
        };
        let (where_sql, values) = inbound.where_clause();
        let sql = format!(
            "SELECT substr(timestamp, 1, 10) AS day, COUNT(DISTINCT touchpoint_id) AS count \
             FROM activity_events{} GROUP BY day ORDER BY day ASC",
            where_sql
        );

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let counts = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                let day: String = row.get("day")?;
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                let count: i64 = row.get("count")?;
                Ok(DailyActivityCount {
                    date,
                    count: count as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    pub fn find_persons(
        &self,
        customer_org_id: Option<&str>,
        limit: Option<u64>,
        offset: u64,
    ) -> StorageResult<Vec<Person>> {
        let mut values = Vec::new();
        let mut sql = format!("SELECT {} FROM persons", PERSON_COLUMNS);
        if let Some(org) = customer_org_id {
            values.push(Value::Text(org.to_string()));
            sql.push_str(" WHERE customer_org_id = ?1");
        }
        sql.push_str(" ORDER BY id ASC");
        if let Some(limit) = limit {
            values.push(Value::Integer(limit as i64));
            values.push(Value::Integer(offset as i64));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", values.len() - 1, values.len()));
        }

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let persons = stmt
            .query_map(params_from_iter(values.iter()), map_person_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(persons)
    }

    pub fn count_persons(&self, customer_org_id: Option<&str>) -> StorageResult<u64> {
        let conn = self.db.conn()?;
        let count: i64 = match customer_org_id {
            Some(org) => conn.query_row(
                "SELECT COUNT(*) FROM persons WHERE customer_org_id = ?1",
                [org],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    /// Persons keyed by id for the given ids; unknown ids are simply missing
    pub fn persons_by_ids(&self, ids: &[&str]) -> StorageResult<HashMap<String, Person>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM persons WHERE id IN ({})",
            PERSON_COLUMNS, placeholders
        );

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_person_row)?;

        let mut persons = HashMap::new();
        for person in rows {
            let person = person?;
            persons.insert(person.id.clone(), person);
        }
        Ok(persons)
    }

    /// Up to `limit` events of one account in random order
    pub fn random_events(
        &self,
        customer_org_id: &str,
        account_id: &str,
        limit: u32,
    ) -> StorageResult<Vec<ActivityEvent>> {
        let sql = format!(
            "SELECT {} FROM activity_events WHERE customer_org_id = ?1 AND account_id = ?2 \
             ORDER BY RANDOM() LIMIT ?3",
            EVENT_COLUMNS
        );
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(
                rusqlite::params![customer_org_id, account_id, limit],
                map_event_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Up to `limit` persons of one org in random order
    pub fn random_persons(&self, customer_org_id: &str, limit: u32) -> StorageResult<Vec<Person>> {
        let sql = format!(
            "SELECT {} FROM persons WHERE customer_org_id = ?1 ORDER BY RANDOM() LIMIT ?2",
            PERSON_COLUMNS
        );
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let persons = stmt
            .query_map(rusqlite::params![customer_org_id, limit], map_person_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(persons)
    }
}

fn map_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email_address: row.get("email_address")?,
        job_title: row.get("job_title")?,
        customer_org_id: row.get("customer_org_id")?,
    })
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<ActivityEvent> {
    let raw_timestamp: String = row.get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let raw_people: String = row.get("people")?;
    let people: Vec<PersonRef> = serde_json::from_str(&raw_people)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    let raw_teams: String = row.get("involved_team_ids")?;
    let involved_team_ids: Vec<String> = serde_json::from_str(&raw_teams)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(ActivityEvent {
        touchpoint_id: row.get("touchpoint_id")?,
        timestamp,
        activity: row.get("activity")?,
        channel: row.get("channel")?,
        status: row.get("status")?,
        direction: row.get("direction")?,
        people,
        involved_team_ids,
        campaign_name: row.get("campaign_name")?,
        record_type: row.get("record_type")?,
        customer_org_id: row.get("customer_org_id")?,
        account_id: row.get("account_id")?,
    })
}
