//! Local vector store backed by SQLite.
//!
//! Embeddings are stored as JSON arrays. When the `sqlite-vec` extension is
//! registered, queries rank with `vec_distance_cosine`; otherwise they fall
//! back to an exact cosine scan in Rust. Both paths return cosine similarity.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use shortlist_core::{CandidateId, IndexServiceError};
use tracing::debug;

use super::store::{IndexSpec, VectorMatch, VectorRecord, VectorStore, sort_matches};
use crate::semantic::{cosine_similarity, encode_embedding_json};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS vector_indexes (
        name TEXT PRIMARY KEY,
        dimension INTEGER NOT NULL,
        metric TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS vector_entries (
        index_name TEXT NOT NULL,
        candidate_id INTEGER NOT NULL,
        embedding_json TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        PRIMARY KEY (index_name, candidate_id)
    );
";

/// [`VectorStore`] over a single SQLite connection.
pub struct SqliteVecStore {
    conn: Mutex<Connection>,
    vec_search: bool,
}

impl std::fmt::Debug for SqliteVecStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVecStore")
            .field("vec_search", &self.vec_search)
            .finish_non_exhaustive()
    }
}

impl SqliteVecStore {
    /// Open (or create) a store at `path`, or in memory when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexServiceError::Unreachable`] when the database cannot be
    /// opened or its schema cannot be created.
    pub fn open(path: Option<&Path>) -> Result<Self, IndexServiceError> {
        if let Err(reason) = shortlist_sqlite_vec::register_auto_extension() {
            debug!("sqlite-vec not registered, using exact cosine scan: {reason}");
        }

        let conn = match path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| IndexServiceError::Unreachable(format!("open sqlite vector store: {e}")))?;

        Self::from_connection(conn)
    }

    /// Wrap an existing connection, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IndexServiceError::Unreachable`] when the schema cannot be
    /// created.
    pub fn from_connection(conn: Connection) -> Result<Self, IndexServiceError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| IndexServiceError::Unreachable(format!("create vector schema: {e}")))?;
        let vec_search = shortlist_sqlite_vec::vec_version(&conn).is_some();
        debug!(vec_search, "sqlite vector store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            vec_search,
        })
    }

    /// Whether queries go through `vec_distance_cosine`.
    #[must_use]
    pub const fn uses_vec_search(&self) -> bool {
        self.vec_search
    }

    /// Number of vectors stored in `index`.
    ///
    /// # Errors
    ///
    /// Returns an error when the count query fails.
    pub fn count(&self, index: &str) -> Result<usize, IndexServiceError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM vector_entries WHERE index_name = ?1",
                params![index],
                |row| row.get(0),
            )
            .map_err(|e| query_error(index, &e))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    #[cfg(test)]
    fn force_exact_scan(mut self) -> Self {
        self.vec_search = false;
        self
    }
}

fn index_dimension(conn: &Connection, index: &str) -> Result<Option<usize>, rusqlite::Error> {
    let dimension: Option<i64> = conn
        .query_row(
            "SELECT dimension FROM vector_indexes WHERE name = ?1",
            params![index],
            |row| row.get(0),
        )
        .optional()?;
    Ok(dimension.and_then(|d| usize::try_from(d).ok()))
}

fn rebuild_error(index: &str, detail: impl std::fmt::Display) -> IndexServiceError {
    IndexServiceError::Rebuild {
        index: index.to_string(),
        detail: detail.to_string(),
    }
}

fn query_error(index: &str, detail: impl std::fmt::Display) -> IndexServiceError {
    IndexServiceError::Query {
        index: index.to_string(),
        detail: detail.to_string(),
    }
}

fn candidate_id(raw: i64) -> Option<CandidateId> {
    u64::try_from(raw).ok().map(CandidateId::new)
}

impl VectorStore for SqliteVecStore {
    fn list_indexes(&self) -> Result<Vec<String>, IndexServiceError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT name FROM vector_indexes ORDER BY name")
            .map_err(|e| IndexServiceError::Unreachable(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| IndexServiceError::Unreachable(e.to_string()))?;
        Ok(names)
    }

    fn delete_index(&self, name: &str) -> Result<(), IndexServiceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| rebuild_error(name, e))?;
        let removed = tx
            .execute("DELETE FROM vector_indexes WHERE name = ?1", params![name])
            .map_err(|e| rebuild_error(name, e))?;
        if removed == 0 {
            return Err(rebuild_error(name, "index not found"));
        }
        tx.execute(
            "DELETE FROM vector_entries WHERE index_name = ?1",
            params![name],
        )
        .map_err(|e| rebuild_error(name, e))?;
        tx.commit().map_err(|e| rebuild_error(name, e))?;
        debug!(index = name, "sqlite vector index deleted");
        Ok(())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<(), IndexServiceError> {
        let conn = self.conn.lock();
        if index_dimension(&conn, &spec.name)
            .map_err(|e| rebuild_error(&spec.name, e))?
            .is_some()
        {
            return Err(rebuild_error(&spec.name, "index already exists"));
        }
        let dimension =
            i64::try_from(spec.dimension).map_err(|e| rebuild_error(&spec.name, e))?;
        conn.execute(
            "INSERT INTO vector_indexes (name, dimension, metric) VALUES (?1, ?2, ?3)",
            params![spec.name, dimension, spec.metric.as_str()],
        )
        .map_err(|e| rebuild_error(&spec.name, e))?;
        debug!(index = %spec.name, dimension = spec.dimension, "sqlite vector index created");
        Ok(())
    }

    fn upsert(&self, index: &str, vectors: &[VectorRecord]) -> Result<(), IndexServiceError> {
        let mut conn = self.conn.lock();
        let Some(dimension) = index_dimension(&conn, index).map_err(|e| rebuild_error(index, e))?
        else {
            return Err(rebuild_error(index, "index not found"));
        };

        let tx = conn.transaction().map_err(|e| rebuild_error(index, e))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO vector_entries
                        (index_name, candidate_id, embedding_json, metadata_json)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| rebuild_error(index, e))?;

            for vector in vectors {
                if vector.values.len() != dimension {
                    return Err(IndexServiceError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.values.len(),
                    });
                }
                let id = i64::try_from(vector.id.get()).map_err(|e| rebuild_error(index, e))?;
                let metadata =
                    serde_json::to_string(&vector.metadata).map_err(|e| rebuild_error(index, e))?;
                stmt.execute(params![
                    index,
                    id,
                    encode_embedding_json(&vector.values),
                    metadata
                ])
                .map_err(|e| rebuild_error(index, e))?;
            }
        }
        tx.commit().map_err(|e| rebuild_error(index, e))?;
        debug!(index, count = vectors.len(), "sqlite vectors upserted");
        Ok(())
    }

    fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, IndexServiceError> {
        let conn = self.conn.lock();
        let Some(dimension) = index_dimension(&conn, index).map_err(|e| query_error(index, e))?
        else {
            return Err(query_error(index, "index not found"));
        };
        if vector.len() != dimension {
            return Err(IndexServiceError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        if self.vec_search {
            if let Some(matches) = query_vec_extension(&conn, index, vector, top_k)? {
                return Ok(matches);
            }
        }

        query_exact(&conn, index, vector, top_k)
    }
}

fn query_vec_extension(
    conn: &Connection,
    index: &str,
    vector: &[f32],
    top_k: usize,
) -> Result<Option<Vec<VectorMatch>>, IndexServiceError> {
    let mut stmt = match conn.prepare(
        "SELECT candidate_id,
                vec_distance_cosine(vec_f32(embedding_json), vec_f32(?2)) AS distance
         FROM vector_entries
         WHERE index_name = ?1
         ORDER BY distance ASC, candidate_id ASC
         LIMIT ?3",
    ) {
        Ok(stmt) => stmt,
        Err(err) => {
            debug!("sqlite-vec query unavailable, falling back to exact scan: {err}");
            return Ok(None);
        }
    };

    let limit = i64::try_from(top_k).unwrap_or(i64::MAX);
    let rows = match stmt.query_map(
        params![index, encode_embedding_json(vector), limit],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<f64>>(1)?)),
    ) {
        Ok(rows) => rows,
        Err(err) => {
            debug!("sqlite-vec query failed, falling back to exact scan: {err}");
            return Ok(None);
        }
    };

    let mut out = Vec::new();
    for row in rows {
        let (raw_id, distance) = match row {
            Ok(row) => row,
            Err(err) => {
                debug!("sqlite-vec row failed, falling back to exact scan: {err}");
                return Ok(None);
            }
        };
        let (Some(id), Some(distance)) = (candidate_id(raw_id), distance) else {
            continue;
        };
        if !distance.is_finite() {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let score = (1.0 - distance) as f32;
        out.push(VectorMatch { id, score });
    }

    sort_matches(&mut out);
    Ok(Some(out))
}

fn query_exact(
    conn: &Connection,
    index: &str,
    vector: &[f32],
    top_k: usize,
) -> Result<Vec<VectorMatch>, IndexServiceError> {
    let mut stmt = conn
        .prepare("SELECT candidate_id, embedding_json FROM vector_entries WHERE index_name = ?1")
        .map_err(|e| query_error(index, e))?;
    let rows = stmt
        .query_map(params![index], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| query_error(index, e))?;

    let mut scored = Vec::new();
    for row in rows {
        let (raw_id, embedding_json) = row.map_err(|e| query_error(index, e))?;
        let Some(id) = candidate_id(raw_id) else {
            continue;
        };
        let embedding: Vec<f32> = match serde_json::from_str(&embedding_json) {
            Ok(value) => value,
            Err(err) => {
                debug!(%id, "skipping malformed embedding row: {err}");
                continue;
            }
        };
        let Some(score) = cosine_similarity(vector, &embedding) else {
            continue;
        };
        scored.push(VectorMatch { id, score });
    }

    sort_matches(&mut scored);
    scored.truncate(top_k);
    Ok(scored)
}
