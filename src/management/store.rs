use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::{error::StoreError, types::ProviderKind};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS properties (
        name TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS song_cache (
        provider TEXT NOT NULL,
        query_key TEXT NOT NULL,
        track_id TEXT NOT NULL,
        UNIQUE (provider, query_key)
    );
";

/// The persisted state of radiosync: singleton properties (tokens, playlist
/// ids) and the search cache.
///
/// Opened once per run and borrowed by every component. All statements are
/// parameterized.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await.map_err(|source| {
                StoreError::CreateDirectoryFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn property(&self, name: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM properties WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Inserts or overwrites a property.
    pub fn set_property(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO properties (name, value) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    /// Deletes a property, returning whether it existed.
    pub fn remove_property(&self, name: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM properties WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }

    /// All properties whose name ends with `suffix`, ordered by name.
    pub fn properties_ending_with(&self, suffix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM properties ORDER BY name")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut properties = Vec::new();
        for row in rows {
            let (name, value): (String, String) = row?;
            if name.ends_with(suffix) {
                properties.push((name, value));
            }
        }
        Ok(properties)
    }

    pub fn cached_track(
        &self,
        provider: ProviderKind,
        query_key: &str,
    ) -> Result<Option<String>, StoreError> {
        let track_id = self
            .conn
            .query_row(
                "SELECT track_id FROM song_cache WHERE provider = ?1 AND query_key = ?2",
                params![provider.as_str(), query_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(track_id)
    }

    /// Caches a resolution. An existing key is left untouched; returns whether
    /// a row was inserted.
    pub fn cache_track(
        &self,
        provider: ProviderKind,
        query_key: &str,
        track_id: &str,
    ) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT INTO song_cache (provider, query_key, track_id) VALUES (?1, ?2, ?3)
             ON CONFLICT (provider, query_key) DO NOTHING",
            params![provider.as_str(), query_key, track_id],
        )?;
        Ok(inserted > 0)
    }

    pub fn cached_track_count(&self, provider: ProviderKind) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM song_cache WHERE provider = ?1",
            params![provider.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
