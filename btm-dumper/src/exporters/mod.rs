pub mod exporter;
pub mod json;
