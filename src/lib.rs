pub mod cli;
pub mod config;
pub mod materializer;
pub mod model;
pub mod result;

mod api;

#[cfg(test)]
mod fixtures;

pub use api::{Resolvegraph, ResolvegraphBuilder};
pub use materializer::{materialize, materialize_into, MaterializeError, Materializer};
pub use result::{ResolutionResult, ResultSink, UnresolvedDependency};
