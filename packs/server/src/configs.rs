use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use pack_resolver::{signature, PackSizes};
use tokio::sync::RwLock;

/// A stored set of pack sizes and its content signature.
#[derive(Debug, PartialEq, Eq)]
pub struct PackConfiguration {
    pub id: u64,
    pub pack_sizes: PackSizes,
    pub signature: Arc<str>,
}

#[derive(Default)]
struct Registry {
    configs: Vec<Arc<PackConfiguration>>,
    by_signature: HashMap<Arc<str>, usize>,
    active: Option<usize>,
}

/// Holds every pack configuration seen so far and which one is active.
///
/// Configurations are deduplicated by signature: submitting a set that was
/// stored before re-activates the existing entry, which keeps its id and with
/// it every cached result computed under that signature. Nothing is ever
/// evicted, so growth is bounded only by the distinct sets submitted.
#[derive(Default)]
pub struct ConfigRegistry {
    inner: RwLock<Registry>,
}

impl ConfigRegistry {
    pub fn new() -> ConfigRegistry {
        ConfigRegistry::default()
    }

    /// Stores `pack_sizes` unless already known, then makes it the active one.
    pub async fn create(&self, pack_sizes: PackSizes) -> Arc<PackConfiguration> {
        let signature: Arc<str> = signature(&pack_sizes).into();
        let mut inner = self.inner.write().await;

        let idx = match inner.by_signature.get(&signature) {
            Some(&idx) => idx,
            None => {
                let idx = inner.configs.len();
                let config = PackConfiguration {
                    id: idx as u64 + 1,
                    pack_sizes,
                    signature: signature.clone(),
                };
                info!("stored pack configuration {} ({})", config.id, signature);
                inner.configs.push(Arc::new(config));
                inner.by_signature.insert(signature, idx);
                idx
            }
        };
        inner.active = Some(idx);
        inner.configs[idx].clone()
    }

    /// The active configuration, `None` until one has been created.
    pub async fn active(&self) -> Option<Arc<PackConfiguration>> {
        let inner = self.inner.read().await;
        inner.active.map(|idx| inner.configs[idx].clone())
    }

    pub async fn by_signature(&self, signature: &str) -> Option<Arc<PackConfiguration>> {
        let inner = self.inner.read().await;
        inner
            .by_signature
            .get(signature)
            .map(|&idx| inner.configs[idx].clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.configs.len()
    }
}
