pub mod app;
pub mod args;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod utils;

pub use app::run;
pub use args::Args;
pub use dataset::Dataset;
pub use domain::{Attribute, Metric, Record};
pub use error::GradboardError;
pub use pipeline::FilterSelection;
pub use stats::{PercentageTable, PivotTable, YearCount, YearDistribution};
