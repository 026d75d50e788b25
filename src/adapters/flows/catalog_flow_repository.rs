//! Catalog-backed Flow Repository Adapter
//!
//! Holds the compiled flows of a [`FlowCatalog`] behind a lock. Replacing
//! the catalog compiles the new one first and swaps the whole map, so a
//! turn in progress keeps the `Arc` it already holds and new turns see the
//! new configuration.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::flow::{BusinessUnitFlow, FlowCatalog};
use crate::domain::foundation::BusinessUnitId;
use crate::ports::{FlowRepository, FlowRepositoryError};

use super::YamlFlowSource;

type FlowMap = HashMap<BusinessUnitId, Arc<BusinessUnitFlow>>;

/// In-memory flow repository compiled from a catalog
#[derive(Debug, Clone)]
pub struct CatalogFlowRepository {
    flows: Arc<RwLock<Arc<FlowMap>>>,
}

impl CatalogFlowRepository {
    /// Compiles `catalog`; fails on invalid configuration.
    pub fn from_catalog(catalog: &FlowCatalog) -> Result<Self, FlowRepositoryError> {
        let flows = catalog.compile()?;
        Ok(Self {
            flows: Arc::new(RwLock::new(Arc::new(flows))),
        })
    }

    /// Loads and compiles the catalog at `source`.
    pub async fn from_source(source: &YamlFlowSource) -> Result<Self, FlowRepositoryError> {
        let catalog = source.load().await?;
        Self::from_catalog(&catalog)
    }

    /// Swaps in a new catalog. On error the current flows stay in place.
    pub async fn replace(&self, catalog: &FlowCatalog) -> Result<usize, FlowRepositoryError> {
        let compiled = Arc::new(catalog.compile()?);
        let count = compiled.len();
        *self.flows.write().await = compiled;
        tracing::info!(business_units = count, "Flow catalog replaced");
        Ok(count)
    }

    /// Re-reads `source` and swaps it in.
    pub async fn reload(&self, source: &YamlFlowSource) -> Result<usize, FlowRepositoryError> {
        let catalog = source.load().await?;
        self.replace(&catalog).await
    }

    async fn snapshot(&self) -> Arc<FlowMap> {
        Arc::clone(&*self.flows.read().await)
    }
}

#[async_trait]
impl FlowRepository for CatalogFlowRepository {
    async fn flow_for(
        &self,
        business_unit: &BusinessUnitId,
    ) -> Result<Option<Arc<BusinessUnitFlow>>, FlowRepositoryError> {
        Ok(self.snapshot().await.get(business_unit).cloned())
    }

    async fn business_units(&self) -> Result<Vec<BusinessUnitId>, FlowRepositoryError> {
        let mut units: Vec<BusinessUnitId> = self.snapshot().await.keys().cloned().collect();
        units.sort();
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::IntentPattern;

    fn unit(code: &str) -> BusinessUnitId {
        BusinessUnitId::new(code).unwrap()
    }

    fn catalog_with(units: &[&str]) -> FlowCatalog {
        let mut catalog = FlowCatalog::default();
        for code in units {
            catalog.intents.push(
                IntentPattern::new(format!("greeting_{}", code), ["hola"])
                    .for_business_unit(unit(code)),
            );
        }
        catalog
    }

    #[tokio::test]
    async fn serves_compiled_flows() {
        let repo = CatalogFlowRepository::from_catalog(&catalog_with(&["huntred"])).unwrap();
        assert!(repo.flow_for(&unit("huntred")).await.unwrap().is_some());
        assert!(repo.flow_for(&unit("sexsi")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_swaps_whole_set() {
        let repo = CatalogFlowRepository::from_catalog(&catalog_with(&["huntred"])).unwrap();
        let held = repo.flow_for(&unit("huntred")).await.unwrap().unwrap();

        let count = repo
            .replace(&catalog_with(&["amigro", "sexsi"]))
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            repo.business_units().await.unwrap(),
            vec![unit("amigro"), unit("sexsi")]
        );
        // A flow obtained before the swap is still usable.
        assert!(held.match_intent("hola").is_some());
    }

    #[tokio::test]
    async fn invalid_replacement_keeps_current_flows() {
        let repo = CatalogFlowRepository::from_catalog(&catalog_with(&["huntred"])).unwrap();

        let mut broken = FlowCatalog::default();
        broken.intents.push(IntentPattern::new("orphan", ["x"]));
        assert!(repo.replace(&broken).await.is_err());

        assert_eq!(repo.business_units().await.unwrap(), vec![unit("huntred")]);
    }
}
