//! Query validation and aggregation pipeline.

pub mod aggregator;
pub mod audit_service;
pub mod date_range;
pub mod normalizer;
pub mod pagination;
