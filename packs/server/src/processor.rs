use std::sync::Arc;

use log::{debug, info};
use pack_resolver::{PackPlan, ResolveError};
use thiserror::Error;
use tokio::task::JoinError;

use crate::configs::{ConfigRegistry, PackConfiguration};
use crate::store::{PlanKey, PlanStore};
use crate::validate;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0}")]
    Validation(String),

    #[error("no pack configuration is active")]
    NotConfigured,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("calculation task failed: {0}")]
    Join(#[from] JoinError),
}

impl ProcessError {
    /// Errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        match self {
            ProcessError::Validation(_) | ProcessError::NotConfigured => true,
            ProcessError::Resolve(err) => !err.is_defect(),
            ProcessError::Join(_) => false,
        }
    }
}

/// The answer to one order.
#[derive(Debug, Clone)]
pub struct Calculation {
    pub order_quantity: u32,
    pub plan: Arc<PackPlan>,
    pub signature: Arc<str>,
    /// Served from the store rather than computed for this request.
    pub cached: bool,
}

/// Validates requests and runs them against the active configuration,
/// consulting the plan store before computing.
pub struct OrderProcessor {
    registry: ConfigRegistry,
    store: PlanStore,
    max_order_quantity: u32,
}

impl OrderProcessor {
    pub fn new(max_order_quantity: u32, cache_capacity: u64) -> OrderProcessor {
        OrderProcessor {
            registry: ConfigRegistry::new(),
            store: PlanStore::new(cache_capacity),
            max_order_quantity,
        }
    }

    pub async fn set_packs(&self, raw: &[i64]) -> Result<Arc<PackConfiguration>, ProcessError> {
        let sizes = validate::pack_sizes(raw)?;
        let config = self.registry.create(sizes).await;
        info!(
            "pack configuration {} active: {:?}",
            config.id,
            config.pack_sizes.as_slice()
        );
        Ok(config)
    }

    pub async fn active_packs(&self) -> Option<Arc<PackConfiguration>> {
        self.registry.active().await
    }

    pub async fn calculate(&self, raw_order: i64) -> Result<Calculation, ProcessError> {
        let order = validate::order_quantity(raw_order, self.max_order_quantity)?;
        let config = self
            .registry
            .active()
            .await
            .ok_or(ProcessError::NotConfigured)?;
        let key = PlanKey::new(&config.signature, order);

        if let Some(plan) = self.lookup(&key).await {
            return Ok(Calculation::new(order, plan, &config, true));
        }

        let _lock = self.store.lock(&key).await;
        // another request may have filled the entry while we waited
        if let Some(plan) = self.lookup(&key).await {
            return Ok(Calculation::new(order, plan, &config, true));
        }

        let sizes = config.pack_sizes.clone();
        let plan = tokio::task::spawn_blocking(move || pack_resolver::resolve_sizes(order, &sizes))
            .await??;
        let plan = Arc::new(plan);
        self.store.insert(key, plan.clone()).await;
        debug!(
            "stored plan for order {} under configuration {}",
            order, config.id
        );

        Ok(Calculation::new(order, plan, &config, false))
    }

    async fn lookup(&self, key: &PlanKey) -> Option<Arc<PackPlan>> {
        let plan = self.store.get(key).await?;
        info!("found existing calculation for order {}", key.order);
        Some(plan)
    }
}

impl Calculation {
    fn new(order: u32, plan: Arc<PackPlan>, config: &PackConfiguration, cached: bool) -> Calculation {
        Calculation {
            order_quantity: order,
            plan,
            signature: config.signature.clone(),
            cached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_configured() {
        let processor = OrderProcessor::new(1_000_000, 100);
        assert!(processor.active_packs().await.is_none());

        let err = processor.calculate(10).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotConfigured));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_calculate_then_cached() -> Result<(), ProcessError> {
        let processor = OrderProcessor::new(1_000_000, 100);
        let config = processor.set_packs(&[5, 3]).await?;

        let first = processor.calculate(8).await?;
        assert!(!first.cached);
        assert_eq!(config.signature, first.signature);
        assert_eq!(8, first.plan.total_items());
        assert_eq!(2, first.plan.total_packs());
        assert_eq!(1, first.plan.count_of(3));
        assert_eq!(1, first.plan.count_of(5));

        let second = processor.calculate(8).await?;
        assert!(second.cached);
        assert_eq!(first.plan, second.plan);
        Ok(())
    }

    #[tokio::test]
    async fn test_results_follow_active_configuration() -> Result<(), ProcessError> {
        let processor = OrderProcessor::new(1_000_000, 100);

        processor.set_packs(&[250, 500, 1000, 2000, 5000]).await?;
        let calc = processor.calculate(12001).await?;
        assert_eq!(12250, calc.plan.total_items());
        assert_eq!(4, calc.plan.total_packs());

        processor.set_packs(&[5, 3]).await?;
        let calc = processor.calculate(12001).await?;
        assert!(!calc.cached);
        assert_eq!(12001, calc.plan.total_items());

        // switching back re-uses the stored entry for the first configuration
        processor.set_packs(&[5000, 2000, 1000, 500, 250]).await?;
        let calc = processor.calculate(12001).await?;
        assert!(calc.cached);
        assert_eq!(12250, calc.plan.total_items());
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let processor = OrderProcessor::new(100, 100);
        assert!(processor.set_packs(&[]).await.unwrap_err().is_client_error());
        assert!(processor.active_packs().await.is_none());

        processor.set_packs(&[3]).await.unwrap();
        for order in [0, -1, 101] {
            let err = processor.calculate(order).await.unwrap_err();
            assert!(matches!(err, ProcessError::Validation(_)), "order {}", order);
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_agree() {
        let processor = Arc::new(OrderProcessor::new(1_000_000, 100));
        processor.set_packs(&[23, 31, 53]).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let processor = processor.clone();
                tokio::spawn(async move { processor.calculate(500_000).await })
            })
            .collect();

        let mut computed = 0;
        for task in tasks {
            let calc = task.await.unwrap().unwrap();
            assert_eq!(500_000, calc.plan.total_items());
            assert_eq!(9438, calc.plan.total_packs());
            if !calc.cached {
                computed += 1;
            }
        }
        assert_eq!(1, computed);
    }
}
