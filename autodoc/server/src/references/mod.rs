use std::sync::Arc;
use std::time::Duration;

use autodoc_core::References;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::store::{ExternalStore, StoreError};

struct Snapshot {
    references: Arc<References>,
    fetched_at: Instant,
}

/// Lazily populated snapshot of the reference collections.
///
/// The first caller fetches every collection while holding the write lock,
/// so concurrent first callers wait for that single population instead of
/// hitting the store themselves. Mutations never invalidate the snapshot;
/// only the optional `ttl` does.
pub struct ReferenceCache {
    store: Arc<dyn ExternalStore>,
    ttl: Option<Duration>,
    snapshot: RwLock<Option<Snapshot>>,
}

impl ReferenceCache {
    pub fn new(store: Arc<dyn ExternalStore>, ttl: Option<Duration>) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_references(&self) -> Arc<References> {
        {
            let snapshot = self.snapshot.read().await;
            if let Some(references) = self.fresh(snapshot.as_ref()) {
                return references;
            }
        }

        let mut snapshot = self.snapshot.write().await;
        if let Some(references) = self.fresh(snapshot.as_ref()) {
            return references;
        }

        let references = Arc::new(self.fetch_all().await);
        *snapshot = Some(Snapshot {
            references: references.clone(),
            fetched_at: Instant::now(),
        });
        references
    }

    fn fresh(&self, snapshot: Option<&Snapshot>) -> Option<Arc<References>> {
        let snapshot = snapshot?;
        match self.ttl {
            Some(ttl) if snapshot.fetched_at.elapsed() >= ttl => None,
            _ => Some(snapshot.references.clone()),
        }
    }

    async fn fetch_all(&self) -> References {
        let cars = or_empty("cars", self.store.list_cars().await);
        let colors = or_empty("colors", self.store.list_colors().await);
        let works = or_empty("works", self.store.list_works().await);
        let persons = or_empty("persons", self.store.list_persons().await);
        let roles = or_empty("roles", self.store.list_roles().await);
        tracing::info!(
            cars = cars.len(),
            colors = colors.len(),
            works = works.len(),
            persons = persons.len(),
            roles = roles.len(),
            "Loaded reference collections"
        );
        References::new(cars, colors, works, persons, roles)
    }
}

fn or_empty<T>(collection: &str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        tracing::warn!(collection, error = %err, "Failed to fetch reference collection, using an empty list");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockExternalStore;
    use autodoc_core::{CatalogEntry, Person};

    fn mock_store(times: usize) -> MockExternalStore {
        let mut store = MockExternalStore::new();
        store
            .expect_list_cars()
            .times(times)
            .returning(|| Ok(vec![CatalogEntry::new(1, "Golf")]));
        store
            .expect_list_colors()
            .times(times)
            .returning(|| Ok(vec![CatalogEntry::new(1, "Red")]));
        store
            .expect_list_works()
            .times(times)
            .returning(|| Ok(vec![CatalogEntry::new(1, "Wash")]));
        store.expect_list_persons().times(times).returning(|| {
            let mut retired = Person::new(2, "Boris");
            retired.is_active = false;
            Ok(vec![Person::new(1, "Anna"), retired])
        });
        store
            .expect_list_roles()
            .times(times)
            .returning(|| Ok(vec![]));
        store
    }

    #[tokio::test]
    async fn can_fetch_references_once() {
        let cache = ReferenceCache::new(Arc::new(mock_store(1)), None);

        let first = cache.get_references().await;
        let second = cache.get_references().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.cars[0].name, "Golf");
        assert_eq!(first.persons.len(), 2);
        assert_eq!(first.active_persons.len(), 1);
    }

    #[tokio::test]
    async fn can_populate_once_under_concurrent_first_use() {
        let cache = Arc::new(ReferenceCache::new(Arc::new(mock_store(1)), None));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_references().await })
            })
            .collect();
        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap());
        }

        assert!(snapshots.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[tokio::test]
    async fn can_degrade_failed_collection_to_empty() {
        let mut store = MockExternalStore::new();
        store
            .expect_list_cars()
            .times(1)
            .returning(|| Err(StoreError::Transport("connection refused".to_string())));
        store
            .expect_list_colors()
            .times(1)
            .returning(|| Ok(vec![CatalogEntry::new(1, "Red")]));
        store.expect_list_works().times(1).returning(|| {
            Err(StoreError::Rejected {
                status: 500,
                detail: "boom".to_string(),
            })
        });
        store
            .expect_list_persons()
            .times(1)
            .returning(|| Ok(vec![Person::new(1, "Anna")]));
        store.expect_list_roles().times(1).returning(|| Ok(vec![]));
        let cache = ReferenceCache::new(Arc::new(store), None);

        let references = cache.get_references().await;

        assert!(references.cars.is_empty());
        assert!(references.works.is_empty());
        assert_eq!(references.colors.len(), 1);
        assert_eq!(references.persons.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn can_refresh_after_ttl() {
        let cache = ReferenceCache::new(Arc::new(mock_store(2)), Some(Duration::from_secs(60)));

        let first = cache.get_references().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let still_cached = cache.get_references().await;
        tokio::time::advance(Duration::from_secs(31)).await;
        let refreshed = cache.get_references().await;

        assert!(Arc::ptr_eq(&first, &still_cached));
        assert!(!Arc::ptr_eq(&first, &refreshed));
    }
}
