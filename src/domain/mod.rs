// Domain layer - Plain data types shared by the engine
pub mod chart;
pub mod error;
pub mod field;
pub mod metric;
pub mod selection;
pub mod telemetry;
pub mod view;
