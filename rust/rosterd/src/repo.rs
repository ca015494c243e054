use crate::record::{Entity, RecordId};
use rusqlite::{Connection, OptionalExtension};
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{kind} record {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} record {id} already exists")]
    Duplicate { kind: &'static str, id: String },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("record encoding failure: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RepoError {
    /// Protocol error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::NotFound { .. } => "not_found",
            RepoError::Duplicate { .. } => "conflict",
            RepoError::Storage(_) => "db_write_failed",
            RepoError::Encode(_) => "db_write_failed",
        }
    }
}

/// Abstract data source behind a screen. Records arrive with their id assigned.
pub trait Repository<E: Entity> {
    fn list(&self) -> Result<Vec<E>, RepoError>;
    fn create(&mut self, record: &E) -> Result<(), RepoError>;
    fn update(&mut self, record: &E) -> Result<(), RepoError>;
    fn delete(&mut self, id: &RecordId) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct MemoryRepository<E> {
    rows: Vec<E>,
}

impl<E> Default for MemoryRepository<E> {
    fn default() -> Self {
        MemoryRepository { rows: Vec::new() }
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> MemoryRepository<E> {
        MemoryRepository::default()
    }

    #[cfg(test)]
    pub fn with_rows(rows: Vec<E>) -> MemoryRepository<E> {
        MemoryRepository { rows }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.rows.iter().position(|r| r.id().matches(id))
    }

    fn not_found(id: &RecordId) -> RepoError {
        RepoError::NotFound {
            kind: E::KIND,
            id: id.to_string(),
        }
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    fn list(&self) -> Result<Vec<E>, RepoError> {
        Ok(self.rows.clone())
    }

    fn create(&mut self, record: &E) -> Result<(), RepoError> {
        if self.position(record.id()).is_some() {
            return Err(RepoError::Duplicate {
                kind: E::KIND,
                id: record.id().to_string(),
            });
        }
        self.rows.push(record.clone());
        Ok(())
    }

    fn update(&mut self, record: &E) -> Result<(), RepoError> {
        let idx = self
            .position(record.id())
            .ok_or_else(|| Self::not_found(record.id()))?;
        self.rows[idx] = record.clone();
        Ok(())
    }

    fn delete(&mut self, id: &RecordId) -> Result<(), RepoError> {
        let idx = self.position(id).ok_or_else(|| Self::not_found(id))?;
        self.rows.remove(idx);
        Ok(())
    }
}

/// Stores each record as a JSON document in the workspace `records` table.
pub struct SqliteRepository<'c, E> {
    conn: &'c Connection,
    _kind: PhantomData<E>,
}

impl<'c, E: Entity> SqliteRepository<'c, E> {
    pub fn new(conn: &'c Connection) -> SqliteRepository<'c, E> {
        SqliteRepository {
            conn,
            _kind: PhantomData,
        }
    }

    fn exists(&self, id: &str) -> Result<bool, RepoError> {
        let hit: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM records WHERE kind = ? AND id = ?",
                (E::KIND, id),
                |r| r.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<'_, E> {
    fn list(&self) -> Result<Vec<E>, RepoError> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc FROM records WHERE kind = ? ORDER BY position")?;
        let docs = stmt
            .query_map([E::KIND], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            out.push(serde_json::from_str(&doc)?);
        }
        Ok(out)
    }

    fn create(&mut self, record: &E) -> Result<(), RepoError> {
        let id = record.id().to_string();
        if self.exists(&id)? {
            return Err(RepoError::Duplicate { kind: E::KIND, id });
        }
        let doc = serde_json::to_string(record)?;
        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE kind = ?",
            [E::KIND],
            |r| r.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO records(kind, id, position, doc, updated_at)
             VALUES(?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
            (E::KIND, &id, position, &doc),
        )?;
        Ok(())
    }

    fn update(&mut self, record: &E) -> Result<(), RepoError> {
        let id = record.id().to_string();
        let doc = serde_json::to_string(record)?;
        let changed = self.conn.execute(
            "UPDATE records
             SET doc = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
             WHERE kind = ? AND id = ?",
            (&doc, E::KIND, &id),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { kind: E::KIND, id });
        }
        Ok(())
    }

    fn delete(&mut self, id: &RecordId) -> Result<(), RepoError> {
        let id = id.to_string();
        let changed = self.conn.execute(
            "DELETE FROM records WHERE kind = ? AND id = ?",
            (E::KIND, &id),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { kind: E::KIND, id });
        }
        Ok(())
    }
}
