//! gretel-core: Shared types and configuration for the Gretel graph proxy.
//!
//! This crate provides the canonical vertex/edge model that both backend
//! dialects are normalized into, the per-request context, and configuration
//! loading. The fetch-and-expansion pipeline itself lives in `gretel-graph`.

pub mod config;
pub mod types;

pub use config::ServerConfig;
pub use types::{Dialect, Edge, GraphId, PropertyMap, RequestContext, Vertex};
