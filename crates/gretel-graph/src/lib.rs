//! gretel-graph: the fetch-and-expansion pipeline for the Gretel graph proxy.
//!
//! Takes a caller-supplied traversal fragment, executes it against a Gremlin
//! Server or Neptune backend, and returns a bounded, self-contained subgraph:
//! vertices with their fully resolved incident edges, normalized into one
//! canonical shape regardless of which backend answered.

pub mod connection;
pub mod expand;
pub mod mapper;
pub mod query;
pub mod sample;

pub use connection::{BackendConnection, GraphError};
pub use expand::{Expander, ExpansionResult};
pub use mapper::ResultMapper;
