pub mod catalog;
pub mod chunking;
pub mod config;
pub mod database;
pub mod error;
pub mod loader;
pub mod model;
pub mod outliers;
pub mod pipeline;
pub mod sampling;
pub mod transformer;
pub mod writer;

pub use config::{OutlierConfig, PipelineConfig};
pub use error::{Error, Result};
