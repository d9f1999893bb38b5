//! Extraction engine: catalog walking, identifier-window planning, chunked
//! fetching, and artifact reconciliation.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod gateway;
pub mod layer;
pub mod naming;
pub mod orchestrator;
pub mod planner;
pub mod reconcile;
pub mod result;
pub mod sink;
pub mod style;

pub use gateway::{Gateway, HttpGateway};
pub use orchestrator::run_extraction;
pub use result::{LeafOutcome, LeafReport, RunReport};
pub use sink::{FeatureSink, JsonDirSink};
