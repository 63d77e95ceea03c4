// Application layer - The normalization and chart assembly engine
pub mod assembler;
pub mod chart_service;
pub mod combination;
pub mod meter_session;
pub mod metric_catalog;
pub mod normalizer;
pub mod palette;
pub mod telemetry_source;

#[cfg(test)]
pub mod fixtures;
