//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode};

use super::{Ticket, TicketError, TicketFilter, TicketOrder, TicketStatus, TicketStore};

const COLUMNS: &str = "id, number, sequence, office_id, service_id, status, priority, \
     operator_id, service_point_id, issue_time, call_time, start_service_time, \
     completion_time, actual_service_time_mins, visitor_phone, is_appointment, \
     appointment_datetime, updated_at, version";

/// Fixed-width RFC 3339 so that text order is chronological.
fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_time(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_time(idx, v)).transpose()
}

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                number TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                office_id TEXT NOT NULL,
                service_id TEXT NOT NULL,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                operator_id TEXT,
                service_point_id TEXT,
                issue_time TEXT NOT NULL,
                call_time TEXT,
                start_service_time TEXT,
                completion_time TEXT,
                actual_service_time_mins REAL,
                visitor_phone TEXT,
                is_appointment INTEGER NOT NULL DEFAULT 0,
                appointment_datetime TEXT,
                updated_at TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_queue
                ON tickets(office_id, status, priority DESC, issue_time ASC);
            CREATE INDEX IF NOT EXISTS idx_tickets_operator ON tickets(operator_id, status);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref office_id) = filter.office_id {
            conditions.push("office_id = ?".to_string());
            params.push(Box::new(office_id.clone()));
        }

        if !filter.statuses.is_empty() {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            conditions.push(format!("status IN ({})", placeholders));
            for status in &filter.statuses {
                params.push(Box::new(status.as_str()));
            }
        }

        if let Some(ref service_ids) = filter.service_ids {
            if service_ids.is_empty() {
                conditions.push("0".to_string());
            } else {
                let placeholders = vec!["?"; service_ids.len()].join(", ");
                conditions.push(format!("service_id IN ({})", placeholders));
                for id in service_ids {
                    params.push(Box::new(id.clone()));
                }
            }
        }

        if let Some(ref operator_id) = filter.operator_id {
            conditions.push("operator_id = ?".to_string());
            params.push(Box::new(operator_id.clone()));
        }

        if let Some(ref from) = filter.issued_from {
            conditions.push("issue_time >= ?".to_string());
            params.push(Box::new(format_time(from)));
        }

        if let Some(ref from) = filter.completed_from {
            conditions.push("completion_time >= ?".to_string());
            params.push(Box::new(format_time(from)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn order_clause(order: TicketOrder) -> &'static str {
        match order {
            TicketOrder::Queue => "ORDER BY priority DESC, issue_time ASC, sequence ASC, id ASC",
            TicketOrder::LatestActivity => {
                "ORDER BY MAX(COALESCE(call_time, ''), COALESCE(start_service_time, ''), \
                 COALESCE(completion_time, '')) DESC, id ASC"
            }
            TicketOrder::RecentlyUpdated => "ORDER BY updated_at DESC, id ASC",
        }
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let status_str: String = row.get(5)?;
        let status = status_str.parse::<TicketStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
        })?;

        Ok(Ticket {
            id: row.get(0)?,
            number: row.get(1)?,
            sequence: row.get(2)?,
            office_id: row.get(3)?,
            service_id: row.get(4)?,
            status,
            priority: row.get(6)?,
            operator_id: row.get(7)?,
            service_point_id: row.get(8)?,
            issue_time: parse_time(9, row.get(9)?)?,
            call_time: parse_optional_time(10, row.get(10)?)?,
            start_service_time: parse_optional_time(11, row.get(11)?)?,
            completion_time: parse_optional_time(12, row.get(12)?)?,
            actual_service_time_mins: row.get(13)?,
            visitor_phone: row.get(14)?,
            is_appointment: row.get(15)?,
            appointment_datetime: parse_optional_time(16, row.get(16)?)?,
            updated_at: parse_time(17, row.get(17)?)?,
            version: row.get(18)?,
        })
    }
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let conn = self.lock()?;

        let result = conn.execute(
            &format!(
                "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                COLUMNS
            ),
            params![
                ticket.id,
                ticket.number,
                ticket.sequence,
                ticket.office_id,
                ticket.service_id,
                ticket.status.as_str(),
                ticket.priority,
                ticket.operator_id,
                ticket.service_point_id,
                format_time(&ticket.issue_time),
                ticket.call_time.as_ref().map(format_time),
                ticket.start_service_time.as_ref().map(format_time),
                ticket.completion_time.as_ref().map(format_time),
                ticket.actual_service_time_mins,
                ticket.visitor_phone,
                ticket.is_appointment,
                ticket.appointment_datetime.as_ref().map(format_time),
                format_time(&ticket.updated_at),
                ticket.version,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(TicketError::Duplicate(ticket.id.clone()))
            }
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", COLUMNS),
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} {} LIMIT ? OFFSET ?",
            COLUMNS,
            where_clause,
            Self::order_clause(filter.order)
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        // Build parameter slice with limit and offset
        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }

    fn update_if_unchanged(
        &self,
        ticket: &Ticket,
        expected_status: TicketStatus,
        expected_version: i64,
    ) -> Result<bool, TicketError> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE tickets SET status = ?, priority = ?, operator_id = ?, service_point_id = ?, \
                 call_time = ?, start_service_time = ?, completion_time = ?, \
                 actual_service_time_mins = ?, visitor_phone = ?, updated_at = ?, version = ? \
                 WHERE id = ? AND status = ? AND version = ?",
                params![
                    ticket.status.as_str(),
                    ticket.priority,
                    ticket.operator_id,
                    ticket.service_point_id,
                    ticket.call_time.as_ref().map(format_time),
                    ticket.start_service_time.as_ref().map(format_time),
                    ticket.completion_time.as_ref().map(format_time),
                    ticket.actual_service_time_mins,
                    ticket.visitor_phone,
                    format_time(&ticket.updated_at),
                    ticket.version,
                    ticket.id,
                    expected_status.as_str(),
                    expected_version,
                ],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(updated == 1)
    }
}
