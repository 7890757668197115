//! Read-only SQLite archive storage
//!
//! The archive is a single `messages` table produced by an offline import.
//! The viewer never writes to it, so the connection is opened read-only and
//! the schema is checked once on open instead of migrated.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params_from_iter};

use super::traits::{ArchiveScope, ArchiveStore, SearchRow};
use crate::models::{Counterparty, CounterpartySummary, DocumentId, Message, Timestamp};
use crate::search::SearchTerms;

/// Columns read for every message row
const MESSAGE_COLUMNS: &str =
    "from_address, to_address, subject, message_html, timestamp_iso, document_id";

/// Counterparty of a row relative to the owner (bound to one owner parameter)
const COUNTERPARTY_EXPR: &str = "CASE WHEN from_address = ? THEN to_address ELSE from_address END";

/// SQLite implementation of [`ArchiveStore`]
pub struct SqliteArchiveStore {
    conn: Mutex<Connection>,
}

impl SqliteArchiveStore {
    /// Open an archive database read-only
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open archive database {}", path.display()))?;

        let store = Self::from_connection(conn)?;
        info!("Opened archive database {}", path.display());
        Ok(store)
    }

    /// Wrap an existing connection, checking that it holds an archive
    pub fn from_connection(conn: Connection) -> Result<Self> {
        check_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Archive connection lock poisoned: {}", e))
    }

    fn query_messages(&self, sql: &SqlBuilder) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql.sql)?;
        let messages = stmt
            .query_map(params_from_iter(sql.params.iter()), |row| message_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

fn check_schema(conn: &Connection) -> Result<()> {
    conn.prepare(&format!("SELECT {} FROM messages LIMIT 0", MESSAGE_COLUMNS))
        .context("Archive database has no usable messages table")?;
    Ok(())
}

/// Read a message starting at column `offset`
fn message_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Message> {
    Ok(Message {
        from_address: text_column(row, offset)?.unwrap_or_default(),
        to_address: text_column(row, offset + 1)?.unwrap_or_default(),
        subject: text_column(row, offset + 2)?,
        message_html: text_column(row, offset + 3)?.unwrap_or_default(),
        timestamp: Timestamp::new(text_column(row, offset + 4)?.unwrap_or_default()),
        document_id: text_column(row, offset + 5)?.map(DocumentId::new),
    })
}

/// Read a column as text whatever its storage class
///
/// Imported archives are loosely typed: timestamps and document ids show up
/// as both INTEGER and TEXT.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    })
}

/// SQL text with positional parameters collected alongside
#[derive(Debug, Default)]
struct SqlBuilder {
    sql: String,
    params: Vec<String>,
}

impl SqlBuilder {
    fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn bind(&mut self, value: impl Into<String>) -> &mut Self {
        self.params.push(value.into());
        self
    }

    fn counterparty(&mut self, scope: &ArchiveScope) -> &mut Self {
        self.push(COUNTERPARTY_EXPR).bind(scope.owner.clone())
    }

    /// `column IN (?, ...)` or a constant false for an empty list
    fn in_list(&mut self, column: &str, values: &[String]) -> &mut Self {
        if values.is_empty() {
            return self.push("0");
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push(&format!("{} IN ({})", column, placeholders));
        for value in values {
            self.bind(value.clone());
        }
        self
    }

    /// One side of the scope: owner on `owner_col`, allowed name on `other_col`
    fn scope_side(&mut self, scope: &ArchiveScope, owner_col: &str, other_col: &str) -> &mut Self {
        self.push(&format!("({} = ? AND {} <> ?", owner_col, other_col))
            .bind(scope.owner.clone())
            .bind(scope.owner.clone());
        if let Some(contacts) = &scope.contacts {
            self.push(" AND ").in_list(other_col, contacts);
        }
        self.push(")")
    }

    /// Full scope predicate, without a leading `WHERE`
    fn scope(&mut self, scope: &ArchiveScope) -> &mut Self {
        self.push("(")
            .scope_side(scope, "from_address", "to_address")
            .push(" OR ")
            .scope_side(scope, "to_address", "from_address")
            .push(")");
        if !scope.excluded.is_empty() {
            self.push(" AND NOT ")
                .in_list("from_address", &scope.excluded)
                .push(" AND NOT ")
                .in_list("to_address", &scope.excluded);
        }
        self
    }

    /// Messages exchanged with one counterparty
    fn conversation(&mut self, scope: &ArchiveScope, counterparty: &Counterparty) -> &mut Self {
        self.scope(scope)
            .push(" AND ")
            .counterparty(scope)
            .push(" = ?")
            .bind(counterparty.as_str())
    }

    /// Any term in body, subject or counterparty name
    fn terms(&mut self, scope: &ArchiveScope, terms: &SearchTerms) -> &mut Self {
        self.push("(");
        for (i, pattern) in terms.like_patterns().into_iter().enumerate() {
            if i > 0 {
                self.push(" OR ");
            }
            self.push("LOWER(COALESCE(message_html, '')) LIKE ? ESCAPE '\\'")
                .bind(pattern.clone())
                .push(" OR LOWER(COALESCE(subject, '')) LIKE ? ESCAPE '\\'")
                .bind(pattern.clone())
                .push(" OR LOWER(")
                .counterparty(scope)
                .push(") LIKE ? ESCAPE '\\'")
                .bind(pattern);
        }
        self.push(")")
    }
}

impl ArchiveStore for SqliteArchiveStore {
    fn list_counterparties(&self, scope: &ArchiveScope) -> Result<Vec<CounterpartySummary>> {
        // SQLite takes bare columns from the row holding MAX(), which gives
        // the subject of the newest message
        let mut sql = SqlBuilder::default();
        sql.push("SELECT ")
            .counterparty(scope)
            .push(
                " AS contact_name, COUNT(*) AS message_count, \
                 MAX(timestamp_iso) AS last_message_at, subject \
                 FROM messages WHERE ",
            )
            .scope(scope)
            .push(" GROUP BY contact_name ORDER BY last_message_at DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql.sql)?;
        let summaries = stmt
            .query_map(params_from_iter(sql.params.iter()), |row| {
                let count: i64 = row.get(1)?;
                Ok(CounterpartySummary {
                    counterparty: Counterparty::new(text_column(row, 0)?.unwrap_or_default()),
                    message_count: count as usize,
                    last_message_at: Timestamp::new(text_column(row, 2)?.unwrap_or_default()),
                    last_subject: text_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Listed {} counterparties", summaries.len());
        Ok(summaries)
    }

    fn list_messages(
        &self,
        scope: &ArchiveScope,
        counterparty: &Counterparty,
    ) -> Result<Vec<Message>> {
        let mut sql = SqlBuilder::default();
        sql.push(&format!("SELECT {} FROM messages WHERE ", MESSAGE_COLUMNS))
            .conversation(scope, counterparty)
            .push(" ORDER BY timestamp_iso ASC");
        self.query_messages(&sql)
    }

    fn last_message(
        &self,
        scope: &ArchiveScope,
        counterparty: &Counterparty,
    ) -> Result<Option<Message>> {
        let mut sql = SqlBuilder::default();
        sql.push(&format!("SELECT {} FROM messages WHERE ", MESSAGE_COLUMNS))
            .conversation(scope, counterparty)
            .push(" ORDER BY timestamp_iso DESC LIMIT 1");

        let conn = self.conn()?;
        let message = conn
            .query_row(&sql.sql, params_from_iter(sql.params.iter()), |row| {
                message_from_row(row, 0)
            })
            .optional()?;
        Ok(message)
    }

    fn search_messages(
        &self,
        terms: &SearchTerms,
        scope: &ArchiveScope,
        limit: usize,
    ) -> Result<Vec<SearchRow>> {
        let mut sql = SqlBuilder::default();
        sql.push("SELECT ")
            .counterparty(scope)
            .push(&format!(" AS contact_name, {} FROM messages WHERE ", MESSAGE_COLUMNS))
            .scope(scope)
            .push(" AND ")
            .terms(scope, terms)
            .push(&format!(" ORDER BY timestamp_iso DESC LIMIT {}", limit));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql.sql)?;
        let rows = stmt
            .query_map(params_from_iter(sql.params.iter()), |row| {
                Ok(SearchRow {
                    counterparty: Counterparty::new(text_column(row, 0)?.unwrap_or_default()),
                    message: message_from_row(row, 1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Search {:?} matched {} rows", terms.query(), rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::REDACTED;

    const SCHEMA: &str = "CREATE TABLE messages (
        id INTEGER PRIMARY KEY,
        from_address TEXT,
        to_address TEXT,
        subject TEXT,
        message_html TEXT,
        timestamp_iso TEXT,
        document_id TEXT
    )";

    fn create_test_store(rows: &[(&str, &str, Option<&str>, &str, &str)]) -> SqliteArchiveStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(SCHEMA, []).unwrap();
        for (i, (from, to, subject, html, ts)) in rows.iter().enumerate() {
            conn.execute(
                "INSERT INTO messages (from_address, to_address, subject, message_html, timestamp_iso, document_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![from, to, subject, html, ts, format!("DOC-{}", i)],
            )
            .unwrap();
        }
        SqliteArchiveStore::from_connection(conn).unwrap()
    }

    fn fixture() -> SqliteArchiveStore {
        create_test_store(&[
            ("Owner", "Alice", Some("Lunch"), "Lunch at noon?", "20150101120000"),
            ("Alice", "Owner", Some("Re: Lunch"), "Sure, <b>noon</b>", "20150101123000"),
            ("Bob", "Owner", Some("Flight"), "Flight 100% booked", "20150301080000"),
            ("Owner", REDACTED, None, "hidden lunch", "20150401080000"),
            ("Carol", "Dave", None, "lunch elsewhere", "20150501080000"),
        ])
    }

    #[test]
    fn test_rejects_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteArchiveStore::from_connection(conn).is_err());
    }

    #[test]
    fn test_list_counterparties() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let list = store.list_counterparties(&scope).unwrap();

        let names: Vec<&str> = list.iter().map(|c| c.counterparty.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
        assert_eq!(list[1].message_count, 2);
        assert_eq!(list[1].last_message_at.as_str(), "20150101123000");
        assert_eq!(list[1].last_subject.as_deref(), Some("Re: Lunch"));
    }

    #[test]
    fn test_allowlist_restricts_counterparties() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner").with_contacts(vec!["Alice".to_string()]);
        let list = store.list_counterparties(&scope).unwrap();
        assert_eq!(list.len(), 1);

        let empty = ArchiveScope::new("Owner").with_contacts(Vec::new());
        assert!(store.list_counterparties(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_list_messages_ascending() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let messages = store
            .list_messages(&scope, &Counterparty::new("Alice"))
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].timestamp < messages[1].timestamp);
        assert_eq!(messages[0].document_id.as_ref().unwrap().as_str(), "DOC-0");
    }

    #[test]
    fn test_last_message() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let last = store
            .last_message(&scope, &Counterparty::new("Alice"))
            .unwrap()
            .unwrap();
        assert_eq!(last.message_html, "Sure, <b>noon</b>");

        let none = store
            .last_message(&scope, &Counterparty::new("Nobody"))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_search_any_term_newest_first() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let terms = SearchTerms::parse("LUNCH flight").unwrap();
        let rows = store.search_messages(&terms, &scope, 100).unwrap();

        // Redacted and out-of-scope rows never match
        let names: Vec<&str> = rows.iter().map(|r| r.counterparty.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Alice"]);
    }

    #[test]
    fn test_search_matches_counterparty_name() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let terms = SearchTerms::parse("bob").unwrap();
        let rows = store.search_messages(&terms, &scope, 100).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message.subject.as_deref(), Some("Flight"));
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");

        let rows = store
            .search_messages(&SearchTerms::parse("100%").unwrap(), &scope, 100)
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = store
            .search_messages(&SearchTerms::parse("_").unwrap(), &scope, 100)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_search_limit() {
        let store = fixture();
        let scope = ArchiveScope::new("Owner");
        let terms = SearchTerms::parse("lunch").unwrap();
        let rows = store.search_messages(&terms, &scope, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message.timestamp.as_str(), "20150101123000");
    }

    #[test]
    fn test_integer_columns_read_as_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(SCHEMA, []).unwrap();
        conn.execute(
            "INSERT INTO messages (from_address, to_address, subject, message_html, timestamp_iso, document_id)
             VALUES ('Owner', 'Alice', NULL, NULL, 20150101120000, 42)",
            [],
        )
        .unwrap();
        let store = SqliteArchiveStore::from_connection(conn).unwrap();

        let messages = store
            .list_messages(&ArchiveScope::new("Owner"), &Counterparty::new("Alice"))
            .unwrap();
        assert_eq!(messages[0].timestamp.as_str(), "20150101120000");
        assert_eq!(messages[0].document_id.as_ref().unwrap().as_str(), "42");
        assert_eq!(messages[0].message_html, "");
        assert!(messages[0].subject.is_none());
    }
}
