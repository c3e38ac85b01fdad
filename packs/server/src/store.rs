use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use moka::future::Cache;
use pack_resolver::PackPlan;
use tokio::sync::{Mutex, MutexGuard};

/// Cache key: the configuration signature and the ordered quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub signature: Arc<str>,
    pub order: u32,
}

impl PlanKey {
    pub fn new(signature: &Arc<str>, order: u32) -> PlanKey {
        PlanKey {
            signature: signature.clone(),
            order,
        }
    }
}

/// Previously computed plans.
///
/// A plan is a pure function of its key so entries never go stale; the cache
/// only evicts to stay within `capacity` entries.
pub struct PlanStore {
    write_slots: Vec<Mutex<()>>,
    cache: Cache<PlanKey, Arc<PackPlan>>,
}

impl PlanStore {
    pub fn new(capacity: u64) -> PlanStore {
        let cache = Cache::builder().max_capacity(capacity).build();
        // Use the number of logical cores as the number of write lock slots.
        let write_slots = (0..num_cpus::get()).map(|_| Mutex::new(())).collect();

        PlanStore { write_slots, cache }
    }

    /// Serialises work on keys that hash to the same slot, so concurrent
    /// requests for one key compute it once.
    pub async fn lock(&self, key: &PlanKey) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        let slot = (hash % self.write_slots.len() as u64) as usize;
        self.write_slots[slot].lock().await
    }

    pub async fn get(&self, key: &PlanKey) -> Option<Arc<PackPlan>> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: PlanKey, plan: Arc<PackPlan>) {
        self.cache.insert(key, plan).await
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
