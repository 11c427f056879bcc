use rusqlite::Connection;

use crate::error::Result;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS owners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS pets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER,
            name TEXT NOT NULL,
            species TEXT NOT NULL,
            hunger INTEGER NOT NULL DEFAULT 50,
            happiness INTEGER NOT NULL DEFAULT 50,
            adopted_at TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (owner_id) REFERENCES owners(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id);
        ",
    )?;
    Ok(())
}
