//! Gremlin query construction per backend dialect.
//!
//! The caller's traversal fragment is opaque backend-native text naming a
//! starting point and filters; these builders append the limit/projection
//! clauses and, for Neptune, inject the DFE optimizer hint. All builders are
//! pure: same inputs, same text.

use gretel_core::{Dialect, GraphId};

/// Traversal source rewritten in for Neptune queries to enable the DFE query
/// engine. See the Neptune `Neptune#useDFE` query-hint documentation.
const NEPTUNE_DFE_SOURCE: &str = "g.withSideEffect('Neptune#useDFE', true)";

/// Rewrite the leading traversal-source token of a fragment for the given
/// dialect. Only the first dot-delimited segment is ever touched; the rest of
/// the fragment passes through verbatim.
fn with_optimizer_hint(fragment: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::Gremlin => fragment.to_string(),
        Dialect::Neptune => match fragment.split_once('.') {
            Some((_, rest)) => format!("{NEPTUNE_DFE_SOURCE}.{rest}"),
            None => NEPTUNE_DFE_SOURCE.to_string(),
        },
    }
}

/// The main vertex-listing query: deduplicates the fragment's results and
/// projects `(id, label, properties)` for each vertex.
pub fn vertex_listing(fragment: &str, dialect: Dialect) -> String {
    format!(
        "{}.dedup().project('id', 'label', 'properties')\
         .by(__.id()).by(__.label()).by(__.valueMap().by(__.unfold()))",
        with_optimizer_hint(fragment, dialect)
    )
}

/// List the ids of all edges incident to a vertex, in either direction.
pub fn incident_edge_ids(vertex_id: &GraphId, dialect: Dialect) -> String {
    format!(
        "{}.V({}).bothE().id()",
        with_optimizer_hint("g", dialect),
        vertex_id.query_literal()
    )
}

/// Fetch one edge's full detail: id, endpoint vertex ids, label, properties.
pub fn edge_detail(edge_id: &GraphId, dialect: Dialect) -> String {
    format!(
        "{}.E({}).project('id', 'from', 'to', 'label', 'properties')\
         .by(__.id()).by(__.outV().id()).by(__.inV().id()).by(__.label()).by(__.valueMap())",
        with_optimizer_hint("g", dialect),
        edge_id.query_literal()
    )
}
