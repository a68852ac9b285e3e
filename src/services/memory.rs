//! In-memory entry store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::PersistenceError,
    models::{Entry, EntryPredicate, NewEntry},
};

use super::storage::EntryStore;

/// Entry store backed by a `HashMap` behind an async lock.
///
/// Nothing is persisted; data is lost when the last clone is dropped. Used by
/// tests and by `DATABASE_URL=memory` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn insert(&self, candidate: NewEntry) -> Result<Entry, PersistenceError> {
        let entry = candidate.with_id(Uuid::new_v4().to_string());
        let mut entries = self.entries.write().await;
        entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn find(&self, predicate: &EntryPredicate) -> Result<Vec<Entry>, PersistenceError> {
        let mut matched: Vec<Entry> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|entry| predicate.matches(entry))
                .cloned()
                .collect()
        };
        matched.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn delete_where(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.time >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        Ok(self.entries.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::Direction;

    fn candidate(time: DateTime<Utc>) -> NewEntry {
        NewEntry {
            name: "Meera".into(),
            phone: "90080".into(),
            time,
            location: "Terminal 1".into(),
            direction: Direction::FromAirport,
            city: "Delhi".into(),
        }
    }

    #[tokio::test]
    async fn find_orders_by_time() {
        let store = MemoryEntryStore::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let late = store.insert(candidate(t + Duration::hours(3))).await.unwrap();
        let early = store.insert(candidate(t)).await.unwrap();

        let found = store.find(&EntryPredicate::any()).await.unwrap();
        assert_eq!(found, vec![early, late]);
    }

    #[tokio::test]
    async fn delete_where_keeps_entries_at_cutoff() {
        let store = MemoryEntryStore::new();
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        store.insert(candidate(cutoff)).await.unwrap();
        store
            .insert(candidate(cutoff - Duration::seconds(1)))
            .await
            .unwrap();
        store
            .insert(candidate(cutoff + Duration::days(3)))
            .await
            .unwrap();

        assert_eq!(store.delete_where(cutoff).await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.delete_where(cutoff).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_inserts_are_all_kept() {
        let store = MemoryEntryStore::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(candidate(t)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 16);
    }
}
