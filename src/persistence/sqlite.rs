use super::{
    AssignmentLedger, HolidayStore, ReplaceSummary, RosterStore, StoreError, StoreResult,
    validate_replacement,
};
use crate::assignment::{Assignment, DutyType, Origin};
use crate::calendar::Holiday;
use crate::member::{Member, MemberId, NewMember};
use crate::month::MonthWindow;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::Mutex;

pub struct SqliteDutyStore {
    connection: Mutex<Connection>,
}

const MEMBER_COLUMNS: &str = "id, name, contact_handle, color, avatar_emoji, active";
const ASSIGNMENT_COLUMNS: &str = "date, duty, member_id, origin";

impl SqliteDutyStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> StoreResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                contact_handle TEXT,
                color TEXT NOT NULL,
                avatar_emoji TEXT,
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS holidays (
                date TEXT PRIMARY KEY,
                label TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS assignments (
                date TEXT NOT NULL,
                duty TEXT NOT NULL CHECK (duty IN ('primary', 'secondary')),
                member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                origin TEXT NOT NULL CHECK (origin IN ('algorithmic', 'manual', 'wheel')),
                UNIQUE (date, duty)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().expect("sqlite mutex poisoned")
    }

    fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
        Ok(Member {
            id: row.get(0)?,
            name: row.get(1)?,
            contact_handle: row.get(2)?,
            color: row.get(3)?,
            avatar_emoji: row.get(4)?,
            active: row.get(5)?,
        })
    }

    fn assignment_from_columns(
        date: String,
        duty: String,
        member_id: MemberId,
        origin: String,
    ) -> StoreResult<Assignment> {
        let date = parse_date(&date)?;
        let duty: DutyType = duty
            .parse()
            .map_err(|err: crate::assignment::UnknownVariant| {
                StoreError::Inconsistent(err.to_string())
            })?;
        let origin: Origin = origin
            .parse()
            .map_err(|err: crate::assignment::UnknownVariant| {
                StoreError::Inconsistent(err.to_string())
            })?;
        Ok(Assignment::new(date, duty, member_id, origin))
    }

    fn query_assignments(
        conn: &Connection,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> StoreResult<Vec<Assignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments {filter} \
             ORDER BY date ASC, CASE duty WHEN 'primary' THEN 0 ELSE 1 END"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, MemberId>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut assignments = Vec::new();
        for row in rows {
            let (date, duty, member_id, origin) = row?;
            assignments.push(Self::assignment_from_columns(date, duty, member_id, origin)?);
        }
        Ok(assignments)
    }

    fn month_bounds(month: MonthWindow) -> (String, String) {
        (month.first_day().to_string(), month.last_day().to_string())
    }
}

fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| StoreError::Inconsistent(format!("invalid date '{raw}': {err}")))
}

impl RosterStore for SqliteDutyStore {
    fn list_members(&self) -> StoreResult<Vec<Member>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], Self::member_from_row)?;
        let mut members = Vec::new();
        for member in rows {
            members.push(member?);
        }
        Ok(members)
    }

    fn find_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"
        ))?;
        Ok(stmt
            .query_row(params![id], Self::member_from_row)
            .optional()?)
    }

    fn add_member(&self, member: NewMember) -> StoreResult<Member> {
        let member = member
            .normalized()
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO members (name, contact_handle, color, avatar_emoji, active) \
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                member.name,
                member.contact_handle,
                member.color,
                member.avatar_emoji
            ],
        )?;
        Ok(member.into_member(conn.last_insert_rowid()))
    }

    fn set_member_active(&self, id: MemberId, active: bool) -> StoreResult<bool> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE members SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(updated > 0)
    }

    fn remove_member(&self, id: MemberId) -> StoreResult<bool> {
        let conn = self.lock();
        let removed = conn.execute("DELETE FROM members WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

impl HolidayStore for SqliteDutyStore {
    fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT date, label FROM holidays ORDER BY date ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut holidays = Vec::new();
        for row in rows {
            let (date, label) = row?;
            holidays.push(Holiday {
                date: parse_date(&date)?,
                label,
            });
        }
        Ok(holidays)
    }

    fn put_holiday(&self, holiday: Holiday) -> StoreResult<Option<Holiday>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let date = holiday.date.to_string();
        let previous: Option<String> = tx
            .query_row(
                "SELECT label FROM holidays WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()?;
        tx.execute(
            "INSERT INTO holidays (date, label) VALUES (?1, ?2) \
             ON CONFLICT(date) DO UPDATE SET label = excluded.label",
            params![date, holiday.label],
        )?;
        tx.commit()?;
        Ok(previous.map(|label| Holiday {
            date: holiday.date,
            label,
        }))
    }

    fn remove_holiday(&self, date: NaiveDate) -> StoreResult<bool> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM holidays WHERE date = ?1",
            params![date.to_string()],
        )?;
        Ok(removed > 0)
    }
}

impl AssignmentLedger for SqliteDutyStore {
    fn assignments_in(&self, month: MonthWindow) -> StoreResult<Vec<Assignment>> {
        let conn = self.lock();
        let (first, last) = Self::month_bounds(month);
        Self::query_assignments(&conn, "WHERE date BETWEEN ?1 AND ?2", &[&first, &last])
    }

    fn assignments_on(&self, date: NaiveDate) -> StoreResult<Vec<Assignment>> {
        let conn = self.lock();
        let date = date.to_string();
        Self::query_assignments(&conn, "WHERE date = ?1", &[&date])
    }

    fn all_assignments(&self) -> StoreResult<Vec<Assignment>> {
        let conn = self.lock();
        Self::query_assignments(&conn, "", &[])
    }

    fn upsert_assignment(&self, assignment: Assignment) -> StoreResult<Option<Assignment>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let exists: Option<MemberId> = tx
            .query_row(
                "SELECT id FROM members WHERE id = ?1",
                params![assignment.member_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(format!(
                "member {}",
                assignment.member_id
            )));
        }

        let date = assignment.date.to_string();
        let previous = Self::query_assignments(
            &tx,
            "WHERE date = ?1 AND duty = ?2",
            &[&date, &assignment.duty.as_str()],
        )?
        .into_iter()
        .next();
        tx.execute(
            "INSERT INTO assignments (date, duty, member_id, origin) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(date, duty) DO UPDATE SET \
             member_id = excluded.member_id, origin = excluded.origin",
            params![
                date,
                assignment.duty.as_str(),
                assignment.member_id,
                assignment.origin.as_str()
            ],
        )?;
        tx.commit()?;
        Ok(previous)
    }

    fn remove_assignments(&self, date: NaiveDate, duty: Option<DutyType>) -> StoreResult<usize> {
        let conn = self.lock();
        let date = date.to_string();
        let removed = match duty {
            Some(duty) => conn.execute(
                "DELETE FROM assignments WHERE date = ?1 AND duty = ?2",
                params![date, duty.as_str()],
            )?,
            None => conn.execute("DELETE FROM assignments WHERE date = ?1", params![date])?,
        };
        Ok(removed)
    }

    fn replace_algorithmic(
        &self,
        month: MonthWindow,
        assignments: &[Assignment],
    ) -> StoreResult<ReplaceSummary> {
        validate_replacement(month, assignments)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let (first, last) = Self::month_bounds(month);

        let removed = tx.execute(
            "DELETE FROM assignments WHERE date BETWEEN ?1 AND ?2 AND origin = 'algorithmic'",
            params![first, last],
        )?;

        let mut summary = ReplaceSummary {
            removed,
            ..ReplaceSummary::default()
        };
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assignments (date, duty, member_id, origin) \
                 VALUES (?1, ?2, ?3, 'algorithmic') ON CONFLICT(date, duty) DO NOTHING",
            )?;
            for assignment in assignments {
                let written = stmt.execute(params![
                    assignment.date.to_string(),
                    assignment.duty.as_str(),
                    assignment.member_id
                ])?;
                if written == 0 {
                    summary.ignored += 1;
                } else {
                    summary.inserted += written;
                }
            }
        }
        // Dropping an uncommitted transaction rolls back, so an error above leaves the
        // previous month untouched.
        tx.commit()?;
        Ok(summary)
    }
}
