//! SQLite-backed directory.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Directory, DirectoryError, Office, OfficeService, Operator, Organization, Service,
    ServiceCategory, ServicePoint,
};
use crate::schedule::{DateException, Schedule, WeeklyRule};

const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn db_err(e: rusqlite::Error) -> DirectoryError {
    DirectoryError::Database(e.to_string())
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn parse_time(schedule_id: &str, value: &str) -> Result<NaiveTime, DirectoryError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| DirectoryError::InvalidData {
            entity: "schedule",
            id: schedule_id.to_string(),
            reason: format!("bad time '{}': {}", value, e),
        })
}

fn parse_optional_time(
    schedule_id: &str,
    value: Option<String>,
) -> Result<Option<NaiveTime>, DirectoryError> {
    value.map(|v| parse_time(schedule_id, &v)).transpose()
}

/// SQLite-backed directory with `save_*` methods for seeding.
pub struct SqliteDirectory {
    conn: Mutex<Connection>,
}

impl SqliteDirectory {
    /// Create a new SQLite directory, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, DirectoryError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite directory (useful for testing).
    pub fn in_memory() -> Result<Self, DirectoryError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DirectoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS organizations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                default_schedule TEXT
            );

            CREATE TABLE IF NOT EXISTS offices (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                abbreviation TEXT,
                timezone TEXT,
                schedule_id TEXT,
                organization_id TEXT
            );

            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                live_queue_enabled INTEGER NOT NULL DEFAULT 1,
                category_id TEXT,
                icon TEXT
            );

            CREATE TABLE IF NOT EXISTS office_services (
                office_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                service_id TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (office_id, position)
            );

            CREATE TABLE IF NOT EXISTS service_categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                display_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS service_points (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                office_id TEXT
            );

            CREATE TABLE IF NOT EXISTS operators (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                default_office TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS operator_skills (
                operator_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                service_id TEXT NOT NULL,
                PRIMARY KEY (operator_id, position)
            );

            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS schedule_rules (
                schedule_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                day_of_week TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                PRIMARY KEY (schedule_id, position)
            );

            CREATE TABLE IF NOT EXISTS schedule_exceptions (
                schedule_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                is_workday INTEGER NOT NULL,
                start_time TEXT,
                end_time TEXT,
                PRIMARY KEY (schedule_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_operators_user ON operators(user_id);
            CREATE INDEX IF NOT EXISTS idx_schedule_exceptions_date
                ON schedule_exceptions(schedule_id, date);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DirectoryError> {
        self.conn
            .lock()
            .map_err(|_| DirectoryError::Database("connection lock poisoned".to_string()))
    }

    pub fn save_organization(&self, org: &Organization) -> Result<(), DirectoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO organizations (id, name, default_schedule) VALUES (?, ?, ?)",
            params![org.id, org.name, org.default_schedule],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn save_office(&self, office: &Office) -> Result<(), DirectoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO offices (id, name, abbreviation, timezone, schedule_id, organization_id) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                office.id,
                office.name,
                office.abbreviation,
                office.timezone,
                office.schedule_id,
                office.organization_id
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn save_service(&self, service: &Service) -> Result<(), DirectoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO services (id, name, enabled, live_queue_enabled, category_id, icon) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                service.id,
                service.name,
                service.enabled,
                service.live_queue_enabled,
                service.category_id,
                service.icon
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Replace an office's service assignments; slice order is kept.
    pub fn save_office_services(
        &self,
        office_id: &str,
        assignments: &[OfficeService],
    ) -> Result<(), DirectoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "DELETE FROM office_services WHERE office_id = ?",
            params![office_id],
        )
        .map_err(db_err)?;
        for (position, assignment) in assignments.iter().enumerate() {
            tx.execute(
                "INSERT INTO office_services (office_id, position, service_id, is_active) VALUES (?, ?, ?, ?)",
                params![office_id, position as i64, assignment.service_id, assignment.is_active],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)
    }

    pub fn save_service_category(&self, category: &ServiceCategory) -> Result<(), DirectoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO service_categories (id, name, display_order) VALUES (?, ?, ?)",
            params![category.id, category.name, category.display_order],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn save_service_point(&self, point: &ServicePoint) -> Result<(), DirectoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO service_points (id, name, office_id) VALUES (?, ?, ?)",
            params![point.id, point.name, point.office_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Insert or replace an operator together with its ordered skills.
    pub fn save_operator(&self, operator: &Operator) -> Result<(), DirectoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO operators (id, user_id, name, default_office, is_active) VALUES (?, ?, ?, ?, ?)",
            params![
                operator.id,
                operator.user_id,
                operator.name,
                operator.default_office,
                operator.is_active
            ],
        )
        .map_err(db_err)?;
        tx.execute(
            "DELETE FROM operator_skills WHERE operator_id = ?",
            params![operator.id],
        )
        .map_err(db_err)?;
        for (position, service_id) in operator.skills.iter().enumerate() {
            tx.execute(
                "INSERT INTO operator_skills (operator_id, position, service_id) VALUES (?, ?, ?)",
                params![operator.id, position as i64, service_id],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)
    }

    /// Insert or replace a schedule with all its rules and exceptions.
    pub fn save_schedule(&self, schedule: &Schedule) -> Result<(), DirectoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO schedules (id, name) VALUES (?, ?)",
            params![schedule.id, schedule.name],
        )
        .map_err(db_err)?;
        tx.execute(
            "DELETE FROM schedule_rules WHERE schedule_id = ?",
            params![schedule.id],
        )
        .map_err(db_err)?;
        tx.execute(
            "DELETE FROM schedule_exceptions WHERE schedule_id = ?",
            params![schedule.id],
        )
        .map_err(db_err)?;

        for (position, rule) in schedule.rules.iter().enumerate() {
            tx.execute(
                "INSERT INTO schedule_rules (schedule_id, position, day_of_week, start_time, end_time) VALUES (?, ?, ?, ?, ?)",
                params![
                    schedule.id,
                    position as i64,
                    weekday_name(rule.day_of_week),
                    rule.start_time.format(TIME_FORMAT).to_string(),
                    rule.end_time.format(TIME_FORMAT).to_string()
                ],
            )
            .map_err(db_err)?;
        }

        for (position, exception) in schedule.exceptions.iter().enumerate() {
            tx.execute(
                "INSERT INTO schedule_exceptions (schedule_id, position, date, is_workday, start_time, end_time) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    schedule.id,
                    position as i64,
                    exception.date.format(DATE_FORMAT).to_string(),
                    exception.is_workday,
                    exception.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                    exception.end_time.map(|t| t.format(TIME_FORMAT).to_string())
                ],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)
    }

    fn load_skills(conn: &Connection, operator_id: &str) -> Result<Vec<String>, DirectoryError> {
        let mut stmt = conn
            .prepare("SELECT service_id FROM operator_skills WHERE operator_id = ? ORDER BY position")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![operator_id], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn row_to_operator(row: &rusqlite::Row) -> rusqlite::Result<Operator> {
        Ok(Operator {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            default_office: row.get(3)?,
            is_active: row.get(4)?,
            skills: Vec::new(),
        })
    }

    fn with_skills(
        conn: &Connection,
        operator: Option<Operator>,
    ) -> Result<Option<Operator>, DirectoryError> {
        match operator {
            Some(mut operator) => {
                operator.skills = Self::load_skills(conn, &operator.id)?;
                Ok(Some(operator))
            }
            None => Ok(None),
        }
    }
}

impl Directory for SqliteDirectory {
    fn organization(&self, id: &str) -> Result<Option<Organization>, DirectoryError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, default_schedule FROM organizations WHERE id = ?",
            params![id],
            |row| {
                Ok(Organization {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    default_schedule: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    fn office(&self, id: &str) -> Result<Option<Office>, DirectoryError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, abbreviation, timezone, schedule_id, organization_id FROM offices WHERE id = ?",
            params![id],
            |row| {
                Ok(Office {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    abbreviation: row.get(2)?,
                    timezone: row.get(3)?,
                    schedule_id: row.get(4)?,
                    organization_id: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    fn service(&self, id: &str) -> Result<Option<Service>, DirectoryError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, enabled, live_queue_enabled, category_id, icon FROM services WHERE id = ?",
            params![id],
            |row| {
                Ok(Service {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    enabled: row.get(2)?,
                    live_queue_enabled: row.get(3)?,
                    category_id: row.get(4)?,
                    icon: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    fn office_services(&self, office_id: &str) -> Result<Vec<OfficeService>, DirectoryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT office_id, service_id, is_active FROM office_services WHERE office_id = ? ORDER BY position",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![office_id], |row| {
                Ok(OfficeService {
                    office_id: row.get(0)?,
                    service_id: row.get(1)?,
                    is_active: row.get(2)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn service_categories(&self) -> Result<Vec<ServiceCategory>, DirectoryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, display_order FROM service_categories ORDER BY display_order, name")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ServiceCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    display_order: row.get(2)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn service_point(&self, id: &str) -> Result<Option<ServicePoint>, DirectoryError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, office_id FROM service_points WHERE id = ?",
            params![id],
            |row| {
                Ok(ServicePoint {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    office_id: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    fn operator(&self, id: &str) -> Result<Option<Operator>, DirectoryError> {
        let conn = self.lock()?;
        let operator = conn
            .query_row(
                "SELECT id, user_id, name, default_office, is_active FROM operators WHERE id = ?",
                params![id],
                Self::row_to_operator,
            )
            .optional()
            .map_err(db_err)?;
        Self::with_skills(&conn, operator)
    }

    fn active_operator_for_user(&self, user_id: &str) -> Result<Option<Operator>, DirectoryError> {
        let conn = self.lock()?;
        let operator = conn
            .query_row(
                "SELECT id, user_id, name, default_office, is_active FROM operators WHERE user_id = ? AND is_active = 1 ORDER BY id LIMIT 1",
                params![user_id],
                Self::row_to_operator,
            )
            .optional()
            .map_err(db_err)?;
        Self::with_skills(&conn, operator)
    }

    fn schedule(&self, id: &str) -> Result<Option<Schedule>, DirectoryError> {
        let conn = self.lock()?;

        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM schedules WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        let Some(name) = name else {
            return Ok(None);
        };

        let mut schedule = Schedule::new(id);
        schedule.name = name;

        let mut stmt = conn
            .prepare(
                "SELECT day_of_week, start_time, end_time FROM schedule_rules WHERE schedule_id = ? ORDER BY position",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;
        for row in rows {
            let (day, start, end) = row.map_err(db_err)?;
            let day_of_week =
                day.parse::<Weekday>()
                    .map_err(|_| DirectoryError::InvalidData {
                        entity: "schedule",
                        id: id.to_string(),
                        reason: format!("bad day of week '{}'", day),
                    })?;
            schedule.rules.push(WeeklyRule::new(
                day_of_week,
                parse_time(id, &start)?,
                parse_time(id, &end)?,
            ));
        }

        let mut stmt = conn
            .prepare(
                "SELECT date, is_workday, start_time, end_time FROM schedule_exceptions WHERE schedule_id = ? ORDER BY position",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(db_err)?;
        for row in rows {
            let (date, is_workday, start, end) = row.map_err(db_err)?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                DirectoryError::InvalidData {
                    entity: "schedule",
                    id: id.to_string(),
                    reason: format!("bad date '{}': {}", date, e),
                }
            })?;
            schedule.exceptions.push(DateException {
                date,
                is_workday,
                start_time: parse_optional_time(id, start)?,
                end_time: parse_optional_time(id, end)?,
            });
        }

        Ok(Some(schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn create_test_directory() -> SqliteDirectory {
        SqliteDirectory::in_memory().unwrap()
    }

    #[test]
    fn test_office_round_trip() {
        let dir = create_test_directory();
        let office = Office::new("o1", "Central")
            .with_abbreviation("CEN")
            .with_timezone("Europe/Kyiv")
            .with_schedule("sched-1")
            .with_organization("org-1");
        dir.save_office(&office).unwrap();

        assert_eq!(dir.office("o1").unwrap(), Some(office));
        assert_eq!(dir.office("missing").unwrap(), None);
    }

    #[test]
    fn test_office_services_keep_assignment_order() {
        let dir = create_test_directory();
        let assignments = vec![
            OfficeService::active("o1", "svc-c"),
            OfficeService::active("o1", "svc-a"),
            OfficeService {
                office_id: "o1".to_string(),
                service_id: "svc-b".to_string(),
                is_active: false,
            },
        ];
        dir.save_office_services("o1", &assignments).unwrap();

        assert_eq!(dir.office_services("o1").unwrap(), assignments);
        assert!(dir.office_services("o2").unwrap().is_empty());
    }

    #[test]
    fn test_operator_skills_are_ordered() {
        let dir = create_test_directory();
        let operator = Operator::new("op-1", "user-1", "Olena").with_skills(["svc-b", "svc-a"]);
        dir.save_operator(&operator).unwrap();

        let loaded = dir.operator("op-1").unwrap().unwrap();
        assert_eq!(loaded.skills, vec!["svc-b", "svc-a"]);

        // Saving again replaces skills rather than appending.
        dir.save_operator(&operator.clone().with_skills(["svc-c"]))
            .unwrap();
        let loaded = dir.operator("op-1").unwrap().unwrap();
        assert_eq!(loaded.skills, vec!["svc-c"]);
    }

    #[test]
    fn test_active_operator_for_user_skips_inactive() {
        let dir = create_test_directory();
        let mut retired = Operator::new("op-old", "user-1", "Old");
        retired.is_active = false;
        dir.save_operator(&retired).unwrap();
        assert!(dir.active_operator_for_user("user-1").unwrap().is_none());

        dir.save_operator(&Operator::new("op-new", "user-1", "New").with_skills(["svc-a"]))
            .unwrap();
        let active = dir.active_operator_for_user("user-1").unwrap().unwrap();
        assert_eq!(active.id, "op-new");
        assert_eq!(active.skills, vec!["svc-a"]);
    }

    #[test]
    fn test_schedule_round_trip() {
        let dir = create_test_directory();
        let holiday = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let short = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut schedule = Schedule::new("sched-1")
            .with_rule(Weekday::Mon, t(9, 0), t(13, 0))
            .with_rule(Weekday::Mon, t(14, 0), t(18, 0))
            .with_rule(Weekday::Sat, t(10, 0), t(14, 0))
            .with_exception(DateException::closed(holiday))
            .with_exception(DateException::open(short, t(9, 0), t(12, 0)));
        schedule.name = "Weekdays".to_string();
        dir.save_schedule(&schedule).unwrap();

        assert_eq!(dir.schedule("sched-1").unwrap(), Some(schedule));
        assert_eq!(dir.schedule("none").unwrap(), None);
    }

    #[test]
    fn test_malformed_stored_time_is_an_error() {
        let dir = create_test_directory();
        dir.save_schedule(&Schedule::new("bad")).unwrap();
        {
            let conn = dir.lock().unwrap();
            conn.execute(
                "INSERT INTO schedule_rules (schedule_id, position, day_of_week, start_time, end_time) VALUES ('bad', 0, 'Monday', 'nine', '17:00')",
                [],
            )
            .unwrap();
        }

        let err = dir.schedule("bad").unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidData { .. }));
    }

    #[test]
    fn test_short_time_format_is_accepted() {
        assert_eq!(parse_time("s", "09:30").unwrap(), t(9, 30));
        assert_eq!(parse_time("s", "09:30:00").unwrap(), t(9, 30));
    }

    #[test]
    fn test_categories_sorted_by_display_order_then_name() {
        let dir = create_test_directory();
        for (id, name, order) in [("c1", "Zeta", 1), ("c2", "Alpha", 2), ("c3", "Beta", 1)] {
            dir.save_service_category(&ServiceCategory {
                id: id.to_string(),
                name: name.to_string(),
                display_order: order,
            })
            .unwrap();
        }

        let ids: Vec<_> = dir
            .service_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn test_directory_persists_across_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("directory.db");
        {
            let dir = SqliteDirectory::new(&path).unwrap();
            dir.save_service(&Service::new("svc-a", "Passports")).unwrap();
            dir.save_service_point(&ServicePoint {
                id: "w1".to_string(),
                name: "Window 1".to_string(),
                office_id: Some("o1".to_string()),
            })
            .unwrap();
        }

        let dir = SqliteDirectory::new(&path).unwrap();
        assert_eq!(dir.service("svc-a").unwrap().unwrap().name, "Passports");
        assert_eq!(
            dir.service_point("w1").unwrap().unwrap().office_id.as_deref(),
            Some("o1")
        );
    }
}
