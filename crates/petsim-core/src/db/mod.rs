pub mod repository;
pub mod schema;

use rusqlite::{Connection, Transaction};

use crate::error::Result;

pub use repository::{Entity, Repository};

/// SQLite connection wrapper. Every write goes through [`Database::unit_of_work`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `work` inside one transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The transaction is released on every exit path, including panics inside
    /// `work`, because an uncommitted `Transaction` rolls back when dropped.
    pub fn unit_of_work<T, F>(&self, label: &str, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        match work(&tx) {
            Ok(value) => {
                if let Err(e) = tx.commit() {
                    log::warn!("{}: commit failed: {}", label, e);
                    return Err(e.into());
                }
                log::debug!("{}: committed", label);
                Ok(value)
            }
            Err(e) => {
                log::warn!("{}: rolled back: {}", label, e);
                let _ = tx.rollback();
                Err(e)
            }
        }
    }

    pub fn repository<T: Entity>(&self) -> Repository<'_, T> {
        Repository::new(self)
    }

    /// Number of stored owners, i.e. saved games.
    pub fn owner_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM owners", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of stored pets across all owners.
    pub fn pet_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))?;
        Ok(count)
    }
}
