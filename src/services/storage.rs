use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::PersistenceError,
    models::{Direction, Entry, EntryPredicate, NewEntry},
};

/// Write-once, delete-only collection of entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Stores the candidate under a fresh id and returns the stored entry.
    async fn insert(&self, candidate: NewEntry) -> Result<Entry, PersistenceError>;

    /// All entries matching the predicate, ordered by time then id.
    async fn find(&self, predicate: &EntryPredicate) -> Result<Vec<Entry>, PersistenceError>;

    /// Removes every entry whose time is strictly before `cutoff`.
    async fn delete_where(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError>;

    async fn count(&self) -> Result<u64, PersistenceError>;
}

#[derive(Clone)]
pub struct SqliteEntryStore {
    pool: DbPool,
}

impl SqliteEntryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: String,
    name: String,
    phone: String,
    time_ms: i64,
    location: String,
    direction: String,
    city: String,
}

impl TryFrom<EntryRow> for Entry {
    type Error = PersistenceError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let time = DateTime::from_timestamp_millis(row.time_ms).ok_or_else(|| {
            PersistenceError::InvalidRecord(format!("entry {} has time {}", row.id, row.time_ms))
        })?;
        let direction: Direction = row.direction.parse().map_err(|_| {
            PersistenceError::InvalidRecord(format!(
                "entry {} has direction {:?}",
                row.id, row.direction
            ))
        })?;
        Ok(Entry {
            id: row.id,
            name: row.name,
            phone: row.phone,
            time,
            location: row.location,
            direction,
            city: row.city,
        })
    }
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    async fn insert(&self, candidate: NewEntry) -> Result<Entry, PersistenceError> {
        let entry = candidate.with_id(Uuid::new_v4().to_string());
        sqlx::query(
            "INSERT INTO entries (id, name, phone, time_ms, location, direction, city) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.phone)
        .bind(entry.time.timestamp_millis())
        .bind(&entry.location)
        .bind(entry.direction.as_str())
        .bind(&entry.city)
        .execute(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn find(&self, predicate: &EntryPredicate) -> Result<Vec<Entry>, PersistenceError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, phone, time_ms, location, direction, city FROM entries WHERE 1 = 1",
        );
        if let Some(window) = predicate.window {
            query
                .push(" AND time_ms >= ")
                .push_bind(window.start.timestamp_millis())
                .push(" AND time_ms <= ")
                .push_bind(window.end.timestamp_millis());
        }
        if let Some(direction) = predicate.direction {
            query.push(" AND direction = ").push_bind(direction.as_str());
        }
        if let Some(city) = &predicate.city {
            query.push(" AND city = ").push_bind(city.clone());
        }
        query.push(" ORDER BY time_ms, id");

        let rows = query.build_query_as::<EntryRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn delete_where(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM entries WHERE time_ms < ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
