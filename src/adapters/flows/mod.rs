//! Flow Adapters
//!
//! Implementations of the FlowRepository port.
//!
//! - **CatalogFlowRepository** - Compiled flows held in memory, hot swappable
//! - **YamlFlowSource** - Reads catalogs from a YAML file or directory

mod catalog_flow_repository;
mod yaml_flow_source;

pub use catalog_flow_repository::CatalogFlowRepository;
pub use yaml_flow_source::YamlFlowSource;
