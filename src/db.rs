use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "baseline_tracker_schema_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS machines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS tools (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    type TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS installations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id INTEGER NOT NULL,
    tool_id INTEGER NOT NULL,
    installed_date DATE NOT NULL,
    installation_time TIME,
    removal_date DATE,
    notes TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (machine_id) REFERENCES machines(id),
    FOREIGN KEY (tool_id) REFERENCES tools(id),
    UNIQUE(machine_id, tool_id, installed_date)
);

CREATE INDEX IF NOT EXISTS idx_installations_installed_date
    ON installations(installed_date);
CREATE INDEX IF NOT EXISTS idx_installations_tool_id ON installations(tool_id);
"#,
}];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_connection(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applied schema migration"
        );
    }

    tx.commit()?;
    tracing::debug!(schema_version = CURRENT_SCHEMA_VERSION, "schema ready");
    Ok(())
}

fn now_utc_rfc3339() -> String {
    // Rfc3339 only fails for years outside 0..=9999.
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Installation joined with its machine and tool names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRecord {
    pub id: i64,
    pub machine: String,
    pub tool: String,
    pub tool_type: Option<String>,
    pub installed_date: String,
    pub installation_time: Option<String>,
    pub removal_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

pub struct InsertInstallation<'a> {
    pub machine_id: i64,
    pub tool_id: i64,
    pub installed_date: &'a str,
    pub installation_time: Option<&'a str>,
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationScope<'a> {
    All,
    Machine(&'a str),
    Tool(&'a str),
}

const INSTALLATION_SELECT: &str = r#"
SELECT i.id, m.name, t.name, t.type, i.installed_date, i.installation_time,
       i.removal_date, i.notes, i.created_at
FROM installations i
JOIN machines m ON i.machine_id = m.id
JOIN tools t ON i.tool_id = t.id
"#;

const INSTALLATION_ORDER: &str = "ORDER BY i.installed_date DESC, i.id ASC";

fn installation_from_row(row: &Row<'_>) -> Result<InstallationRecord> {
    Ok(InstallationRecord {
        id: row.get(0)?,
        machine: row.get(1)?,
        tool: row.get(2)?,
        tool_type: row.get(3)?,
        installed_date: row.get(4)?,
        installation_time: row.get(5)?,
        removal_date: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert_machine(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO machines (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_tool(conn: &Connection, name: &str, tool_type: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO tools (name, type) VALUES (?1, ?2)",
        params![name, tool_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_machine_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM machines WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
}

pub fn find_tool_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM tools WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
}

pub fn insert_installation(conn: &Connection, args: &InsertInstallation<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO installations (
    machine_id, tool_id, installed_date, installation_time, notes
)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
        params![
            args.machine_id,
            args.tool_id,
            args.installed_date,
            args.installation_time,
            args.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_installations(
    conn: &Connection,
    scope: InstallationScope<'_>,
) -> Result<Vec<InstallationRecord>> {
    let (filter, name) = match scope {
        InstallationScope::All => ("", None),
        InstallationScope::Machine(name) => ("WHERE m.name = ?1", Some(name)),
        InstallationScope::Tool(name) => ("WHERE t.name = ?1", Some(name)),
    };
    let sql = format!("{INSTALLATION_SELECT}{filter}\n{INSTALLATION_ORDER}");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match name {
        Some(name) => stmt.query(params![name])?,
        None => stmt.query([])?,
    };

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(installation_from_row(row)?);
    }
    Ok(result)
}

pub fn get_installation(conn: &Connection, id: i64) -> Result<Option<InstallationRecord>> {
    let sql = format!("{INSTALLATION_SELECT}WHERE i.id = ?1");
    conn.query_row(&sql, params![id], installation_from_row)
        .optional()
}

pub fn find_installation(
    conn: &Connection,
    machine: &str,
    tool: &str,
    installed_date: &str,
) -> Result<Option<InstallationRecord>> {
    let sql = format!(
        "{INSTALLATION_SELECT}WHERE m.name = ?1 AND t.name = ?2 AND i.installed_date = ?3"
    );
    conn.query_row(
        &sql,
        params![machine, tool, installed_date],
        installation_from_row,
    )
    .optional()
}

pub fn set_removal_date(conn: &Connection, id: i64, removal_date: &str) -> Result<usize> {
    conn.execute(
        "UPDATE installations SET removal_date = ?2 WHERE id = ?1 AND removal_date IS NULL",
        params![id, removal_date],
    )
}

pub fn count_rows(conn: &Connection, table: CountedTable) -> Result<i64> {
    let sql = match table {
        CountedTable::Installations => "SELECT COUNT(*) FROM installations",
        CountedTable::Machines => "SELECT COUNT(*) FROM machines",
        CountedTable::Tools => "SELECT COUNT(*) FROM tools",
    };
    conn.query_row(sql, [], |row| row.get(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountedTable {
    Installations,
    Machines,
    Tools,
}

pub fn installations_per_machine(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        r#"
SELECT m.name, COUNT(*) AS tool_count
FROM installations i
JOIN machines m ON i.machine_id = m.id
GROUP BY m.id
ORDER BY tool_count DESC, m.name ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push((row.get(0)?, row.get(1)?));
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRecord {
    pub name: String,
    pub installation_count: i64,
    pub created_at: Option<String>,
}

pub fn list_machines(conn: &Connection) -> Result<Vec<MachineRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT m.name, COUNT(i.id), m.created_at
FROM machines m
LEFT JOIN installations i ON i.machine_id = m.id
GROUP BY m.id
ORDER BY m.name ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(MachineRecord {
            name: row.get(0)?,
            installation_count: row.get(1)?,
            created_at: row.get(2)?,
        });
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRecord {
    pub name: String,
    pub tool_type: Option<String>,
    pub machine_count: i64,
    pub created_at: Option<String>,
}

pub fn list_tools(conn: &Connection) -> Result<Vec<ToolRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT t.name, t.type, COUNT(DISTINCT i.machine_id), t.created_at
FROM tools t
LEFT JOIN installations i ON i.tool_id = t.id
GROUP BY t.id
ORDER BY t.name ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(ToolRecord {
            name: row.get(0)?,
            tool_type: row.get(1)?,
            machine_count: row.get(2)?,
            created_at: row.get(3)?,
        });
    }
    Ok(result)
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
