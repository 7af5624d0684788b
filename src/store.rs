// 🗄️ Record Store - corporations table (SQLite)

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::record::{CorporateRecord, RecordField, SearchScope};

/// Database path that opens a throwaway in-memory store
pub const IN_MEMORY: &str = ":memory:";

const SELECT_COLUMNS: &str =
    "SELECT corp_code, corp_name, corp_eng_name, stock_code, modify_date FROM corporations";

// ============================================================================
// STORE TRAIT
// ============================================================================

/// CorporationStore - everything the importer and the query service need
///
/// Implementations must be safe to share across request handlers; they
/// keep no state besides the underlying database handle.
pub trait CorporationStore: Send + Sync {
    /// Insert or overwrite by `code`
    fn save(&self, record: &CorporateRecord) -> Result<()>;

    /// Exact primary-key lookup
    fn find_by_id(&self, code: &str) -> Result<Option<CorporateRecord>>;

    /// Exact match on any column, ordered by name
    fn find_by_field(&self, field: RecordField, value: &str) -> Result<Vec<CorporateRecord>>;

    /// Case-sensitive substring match, ordered by name
    fn find_containing(&self, text: &str, scope: SearchScope) -> Result<Vec<CorporateRecord>>;

    /// Every record, ordered by name
    fn find_all(&self) -> Result<Vec<CorporateRecord>>;

    fn count(&self) -> Result<i64>;
}

// ============================================================================
// SQLITE IMPLEMENTATION
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `path`; `:memory:` gives an in-memory store
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str() == IN_MEMORY {
            return Self::open_in_memory();
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        // Enable WAL mode for crash recovery
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, creating the schema if needed
    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("corporation store lock poisoned"))
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<CorporateRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;

        let records = stmt
            .query_map(params, row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

pub fn setup_schema(conn: &Connection) -> Result<()> {
    // Column widths follow the registry export (corp_code 8, stock_code 6, modify_date 8)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS corporations (
            corp_code TEXT PRIMARY KEY NOT NULL CHECK (length(corp_code) <= 8),
            corp_name TEXT NOT NULL,
            corp_eng_name TEXT,
            stock_code TEXT CHECK (stock_code IS NULL OR length(stock_code) <= 6),
            modify_date TEXT NOT NULL CHECK (length(modify_date) <= 8)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_corp_name ON corporations(corp_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_stock_code ON corporations(stock_code)",
        [],
    )?;

    Ok(())
}

fn row_to_record(row: &Row) -> rusqlite::Result<CorporateRecord> {
    Ok(CorporateRecord {
        code: row.get(0)?,
        name: row.get(1)?,
        english_name: row.get(2)?,
        short_code: row.get(3)?,
        last_modified: row.get(4)?,
    })
}

impl CorporationStore for SqliteStore {
    fn save(&self, record: &CorporateRecord) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO corporations (corp_code, corp_name, corp_eng_name, stock_code, modify_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(corp_code) DO UPDATE SET
                corp_name = excluded.corp_name,
                corp_eng_name = excluded.corp_eng_name,
                stock_code = excluded.stock_code,
                modify_date = excluded.modify_date",
            params![
                record.code,
                record.name,
                record.english_name,
                record.short_code,
                record.last_modified,
            ],
        )
        .with_context(|| format!("Failed to save corporation {}", record.code))?;

        debug!(corp_code = %record.code, "saved corporation");
        Ok(())
    }

    fn find_by_id(&self, code: &str) -> Result<Option<CorporateRecord>> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE corp_code = ?1"),
                [code],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    fn find_by_field(&self, field: RecordField, value: &str) -> Result<Vec<CorporateRecord>> {
        // Column names come from a closed enum, never from input
        let sql = format!(
            "{SELECT_COLUMNS} WHERE {} = ?1 ORDER BY corp_name, corp_code",
            field.column()
        );
        self.query_records(&sql, [value])
    }

    fn find_containing(&self, text: &str, scope: SearchScope) -> Result<Vec<CorporateRecord>> {
        // instr() instead of LIKE: case-sensitive, and '%' / '_' stay literal
        let filter = match scope {
            SearchScope::Name => "instr(corp_name, ?1) > 0",
            SearchScope::NameOrEnglishName => {
                "instr(corp_name, ?1) > 0 OR instr(corp_eng_name, ?1) > 0"
            }
        };
        let sql = format!("{SELECT_COLUMNS} WHERE {filter} ORDER BY corp_name, corp_code");
        self.query_records(&sql, [text])
    }

    fn find_all(&self) -> Result<Vec<CorporateRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY corp_name, corp_code");
        self.query_records(&sql, [])
    }

    fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM corporations", [], |row| row.get(0))?;

        Ok(count)
    }
}
