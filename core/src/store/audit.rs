//! SQLite-backed audit trail.
//!
//! RULE: Only this file talks to the database.
//! Events are inserted once and never updated or deleted; the schema enforces it.

use crate::{
    error::CourtroomResult,
    model::{AuditEvent, AuditEventType, JsonMap},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub struct AuditLog {
    conn: Connection,
}

struct AuditRow {
    event_id: String,
    case_id: String,
    event_type: String,
    timestamp: String,
    metadata: String,
}

impl AuditRow {
    fn into_event(self) -> CourtroomResult<AuditEvent> {
        let event_type = AuditEventType::parse(&self.event_type).ok_or_else(|| {
            anyhow::anyhow!("unknown audit event type '{}' on {}", self.event_type, self.event_id)
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| anyhow::anyhow!("bad timestamp on {}: {e}", self.event_id))?
            .with_timezone(&Utc);
        let metadata: JsonMap = serde_json::from_str(&self.metadata)?;
        Ok(AuditEvent {
            event_id: self.event_id,
            case_id: self.case_id,
            event_type,
            timestamp,
            metadata,
        })
    }
}

impl AuditLog {
    /// Open (or create) an audit database at `path`.
    pub fn open(path: &str) -> CourtroomResult<Self> {
        let conn = Connection::open(path)?;
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let log = Self { conn };
        log.migrate()?;
        Ok(log)
    }

    /// Session-only audit log.
    pub fn in_memory() -> CourtroomResult<Self> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn };
        log.migrate()?;
        Ok(log)
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CourtroomResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_audit_log.sql"))?;
        Ok(())
    }

    pub fn append(&self, event: &AuditEvent) -> CourtroomResult<()> {
        self.conn.execute(
            "INSERT INTO audit_event (event_id, case_id, event_type, timestamp, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_id,
                event.case_id,
                event.event_type.as_str(),
                event.timestamp.to_rfc3339(),
                serde_json::to_string(&event.metadata)?,
            ],
        )?;
        Ok(())
    }

    /// Events of one case in the order they were recorded.
    pub fn for_case(&self, case_id: &str) -> CourtroomResult<Vec<AuditEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, case_id, event_type, timestamp, metadata
             FROM audit_event WHERE case_id = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map(params![case_id], |row| {
                Ok(AuditRow {
                    event_id: row.get(0)?,
                    case_id: row.get(1)?,
                    event_type: row.get(2)?,
                    timestamp: row.get(3)?,
                    metadata: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AuditRow::into_event).collect()
    }

    pub fn count_for_case(&self, case_id: &str) -> CourtroomResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM audit_event WHERE case_id = ?1",
            params![case_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_of_type(&self, case_id: &str, event_type: AuditEventType) -> CourtroomResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM audit_event WHERE case_id = ?1 AND event_type = ?2",
            params![case_id, event_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn total(&self) -> CourtroomResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM audit_event", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str, case_id: &str, kind: AuditEventType) -> AuditEvent {
        AuditEvent {
            event_id: id.into(),
            case_id: case_id.into(),
            event_type: kind,
            timestamp: Utc::now(),
            metadata: json!({ "source": "test" }).as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn events_come_back_in_insertion_order() {
        let log = AuditLog::in_memory().expect("audit log");
        log.append(&event("evt_1", "case_a", AuditEventType::CreatedCase)).unwrap();
        log.append(&event("evt_2", "case_b", AuditEventType::CreatedCase)).unwrap();
        log.append(&event("evt_3", "case_a", AuditEventType::UpdatedApplicant)).unwrap();

        let events = log.for_case("case_a").unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["evt_1", "evt_3"]);
        assert_eq!(events[1].event_type, AuditEventType::UpdatedApplicant);
        assert_eq!(events[0].metadata["source"], "test");
        assert_eq!(log.total().unwrap(), 3);
    }

    #[test]
    fn audit_rows_cannot_be_deleted() {
        let log = AuditLog::in_memory().expect("audit log");
        log.append(&event("evt_1", "case_a", AuditEventType::CreatedCase)).unwrap();
        let deleted = log
            .conn
            .execute("DELETE FROM audit_event WHERE case_id = ?1", params!["case_a"]);
        assert!(deleted.is_err());
        assert_eq!(log.count_for_case("case_a").unwrap(), 1);
    }

    #[test]
    fn duplicate_event_ids_are_rejected() {
        let log = AuditLog::in_memory().expect("audit log");
        log.append(&event("evt_1", "case_a", AuditEventType::CreatedCase)).unwrap();
        assert!(log.append(&event("evt_1", "case_a", AuditEventType::CreatedCase)).is_err());
    }
}
