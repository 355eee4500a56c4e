use std::fmt;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use thiserror::Error;

use crate::db::{self, CountedTable, InsertInstallation, InstallationRecord, InstallationScope};
use crate::listing;

pub const DEFAULT_DB_PATH: &str = "tool_tracker.db";

/// Handle over the tracker database. Holds one connection for its lifetime;
/// every write commits its own transaction.
pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallationView {
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

impl InstallationView {
    pub fn is_active(&self) -> bool {
        self.removal_date.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewInstallation {
    pub machine: String,
    pub tool: String,
    pub tool_type: Option<String>,
    pub installed_date: String,
    pub installation_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MachineCount {
    pub machine: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Statistics {
    pub total_records: i64,
    pub total_machines: i64,
    pub total_tools: i64,
    pub tools_per_machine: Vec<MachineCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MachineSummary {
    pub name: String,
    pub installation_count: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolSummary {
    pub name: String,
    pub tool_type: Option<String>,
    pub machine_count: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Machine,
    Tool,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Machine => f.write_str("Machine"),
            EntityKind::Tool => f.write_str("Tool"),
        }
    }
}

impl Store {
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        tracing::debug!(path = db_path, "opened tracker database");
        Ok(Self { conn })
    }

    pub fn create_machine(&self, name: &str) -> Result<i64, StoreError> {
        require_name(EntityKind::Machine, name)?;
        let id = db::insert_machine(&self.conn, name)
            .map_err(|err| duplicate_entity(err, EntityKind::Machine, name))?;
        tracing::info!(machine = name, id, "created machine");
        Ok(id)
    }

    pub fn create_tool(&self, name: &str, tool_type: Option<&str>) -> Result<i64, StoreError> {
        require_name(EntityKind::Tool, name)?;
        let id = db::insert_tool(&self.conn, name, tool_type)
            .map_err(|err| duplicate_entity(err, EntityKind::Tool, name))?;
        tracing::info!(tool = name, id, "created tool");
        Ok(id)
    }

    pub fn lookup_machine_id(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(db::find_machine_id(&self.conn, name)?)
    }

    pub fn lookup_tool_id(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(db::find_tool_id(&self.conn, name)?)
    }

    /// Records an installation, creating the machine and tool on first use.
    pub fn record_installation(&mut self, input: &NewInstallation) -> Result<i64, StoreError> {
        require_name(EntityKind::Machine, &input.machine)?;
        require_name(EntityKind::Tool, &input.tool)?;

        // Lookups and creates below run on self.conn inside this transaction.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let machine_id = match self.lookup_machine_id(&input.machine)? {
            Some(id) => id,
            None => self.create_machine(&input.machine)?,
        };
        let tool_id = match self.lookup_tool_id(&input.tool)? {
            Some(id) => id,
            None => self.create_tool(&input.tool, input.tool_type.as_deref())?,
        };

        let inserted = db::insert_installation(
            &tx,
            &InsertInstallation {
                machine_id,
                tool_id,
                installed_date: &input.installed_date,
                installation_time: input.installation_time.as_deref(),
                notes: input.notes.as_deref(),
            },
        );
        let id = match inserted {
            Ok(id) => id,
            Err(err) if db::is_unique_violation(&err) => {
                return Err(StoreError::DuplicateInstallation {
                    machine: input.machine.clone(),
                    tool: input.tool.clone(),
                    installed_date: input.installed_date.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit()?;

        tracing::info!(
            id,
            machine = %input.machine,
            tool = %input.tool,
            installed_date = %input.installed_date,
            "recorded installation"
        );
        Ok(id)
    }

    pub fn list_all(&self) -> Result<Vec<InstallationView>, StoreError> {
        self.list_scoped(InstallationScope::All)
    }

    pub fn list_by_machine(&self, name: &str) -> Result<Vec<InstallationView>, StoreError> {
        self.list_scoped(InstallationScope::Machine(name))
    }

    pub fn list_by_tool(&self, name: &str) -> Result<Vec<InstallationView>, StoreError> {
        self.list_scoped(InstallationScope::Tool(name))
    }

    pub fn search(&self, query: &str) -> Result<Vec<InstallationView>, StoreError> {
        let matches: Vec<InstallationView> = self
            .list_all()?
            .into_iter()
            .filter(|view| listing::matches_query(view, query))
            .collect();
        tracing::debug!(query, matches = matches.len(), "searched installations");
        Ok(matches)
    }

    pub fn statistics(&self) -> Result<Statistics, StoreError> {
        let tools_per_machine = db::installations_per_machine(&self.conn)?
            .into_iter()
            .map(|(machine, count)| MachineCount { machine, count })
            .collect();
        Ok(Statistics {
            total_records: db::count_rows(&self.conn, CountedTable::Installations)?,
            total_machines: db::count_rows(&self.conn, CountedTable::Machines)?,
            total_tools: db::count_rows(&self.conn, CountedTable::Tools)?,
            tools_per_machine,
        })
    }

    /// Sets the removal date on the installation identified by its unique triple.
    pub fn mark_removed(
        &mut self,
        machine: &str,
        tool: &str,
        installed_date: &str,
        removal_date: &str,
    ) -> Result<InstallationView, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = db::find_installation(&tx, machine, tool, installed_date)?.ok_or_else(
            || StoreError::NotFound(format!("{tool} on {machine} installed {installed_date}")),
        )?;
        if let Some(existing) = current.removal_date {
            return Err(StoreError::AlreadyRemoved {
                machine: machine.to_string(),
                tool: tool.to_string(),
                removal_date: existing,
            });
        }
        if removal_date < installed_date {
            return Err(StoreError::InvalidArgument(format!(
                "removal date {removal_date} is before installed date {installed_date}"
            )));
        }

        db::set_removal_date(&tx, current.id, removal_date)?;
        let updated = db::get_installation(&tx, current.id)?
            .ok_or_else(|| StoreError::NotFound(format!("installation {}", current.id)))?;
        tx.commit()?;

        tracing::info!(id = updated.id, machine, tool, removal_date, "marked removed");
        Ok(InstallationView::from(updated))
    }

    pub fn list_machines(&self) -> Result<Vec<MachineSummary>, StoreError> {
        Ok(db::list_machines(&self.conn)?
            .into_iter()
            .map(|record| MachineSummary {
                name: record.name,
                installation_count: record.installation_count,
                created_at: record.created_at,
            })
            .collect())
    }

    pub fn list_tools(&self) -> Result<Vec<ToolSummary>, StoreError> {
        Ok(db::list_tools(&self.conn)?
            .into_iter()
            .map(|record| ToolSummary {
                name: record.name,
                tool_type: record.tool_type,
                machine_count: record.machine_count,
                created_at: record.created_at,
            })
            .collect())
    }

    fn list_scoped(&self, scope: InstallationScope<'_>) -> Result<Vec<InstallationView>, StoreError> {
        let records = db::list_installations(&self.conn, scope)?;
        Ok(records.into_iter().map(InstallationView::from).collect())
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), StoreError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn require_name(kind: EntityKind, name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{} name cannot be empty",
            kind.to_string().to_ascii_lowercase()
        )));
    }
    Ok(())
}

fn duplicate_entity(err: rusqlite::Error, kind: EntityKind, name: &str) -> StoreError {
    if db::is_unique_violation(&err) {
        StoreError::DuplicateEntity {
            kind,
            name: name.to_string(),
        }
    } else {
        StoreError::Db(err)
    }
}

impl From<InstallationRecord> for InstallationView {
    fn from(value: InstallationRecord) -> Self {
        Self {
            id: value.id,
            machine: value.machine,
            tool: value.tool,
            tool_type: value.tool_type,
            installed_date: value.installed_date,
            installation_time: value.installation_time,
            removal_date: value.removal_date,
            notes: value.notes,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{name}' already exists")]
    DuplicateEntity { kind: EntityKind, name: String },
    #[error("Installation record already exists for {machine} and {tool} on {installed_date}")]
    DuplicateInstallation {
        machine: String,
        tool: String,
        installed_date: String,
    },
    #[error("{tool} on {machine} was already removed on {removal_date}")]
    AlreadyRemoved {
        machine: String,
        tool: String,
        removal_date: String,
    },
    #[error("installation not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}
