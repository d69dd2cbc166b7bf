//! Per-class feature extraction from JProfiler call trees and recorded-object
//! snapshots, producing datasets for class-role classification.

pub mod config;
pub mod dataset;
pub mod export;
pub mod features;
pub mod graph;
pub mod labels;
pub mod model;
pub mod objects;
pub mod parsers;
pub mod preprocess;

pub use config::ExtractorConfig;
pub use dataset::Dataset;
pub use features::{Accumulation, CallTreeExtractor, ClassFeatures, FeatureTable};
pub use graph::ClassGraph;
pub use model::{CallNode, CallTree};
