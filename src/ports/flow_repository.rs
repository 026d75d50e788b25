//! Flow Repository Port - Interface for business unit flow configuration.
//!
//! Administrators maintain intents and transitions outside this service.
//! Implementations hand out compiled, immutable flows; a reload swaps the
//! whole set at once so a turn never sees half-updated configuration.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::flow::{BusinessUnitFlow, CatalogError};
use crate::domain::foundation::BusinessUnitId;

/// Errors that can occur while reading flow configuration.
#[derive(Debug, thiserror::Error)]
pub enum FlowRepositoryError {
    #[error("Flow source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Port for reading the compiled flow of a business unit.
#[async_trait]
pub trait FlowRepository: Send + Sync {
    /// Returns the flow for `business_unit`, or `None` if the unit is not
    /// configured.
    async fn flow_for(
        &self,
        business_unit: &BusinessUnitId,
    ) -> Result<Option<Arc<BusinessUnitFlow>>, FlowRepositoryError>;

    /// Every configured business unit.
    async fn business_units(&self) -> Result<Vec<BusinessUnitId>, FlowRepositoryError>;
}
