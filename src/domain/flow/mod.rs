//! Business unit flows.
//!
//! A [`FlowCatalog`] holds the administrator-maintained rows for every
//! business unit. Compiling it yields one immutable [`BusinessUnitFlow`]
//! per unit, which is what the flow manager consults on each turn.

mod catalog;
mod definition;

pub use catalog::{CatalogError, FlowCatalog};
pub use definition::{BusinessUnitFlow, BusinessUnitSettings};
