//! Core domain types for the Gretel graph proxy.
//!
//! These types are the canonical vertex/edge model every backend response is
//! normalized into, plus the per-request context that owns everything a
//! single expansion needs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Default vertex limit applied when the caller omits `nodeLimit` or supplies
/// something non-positive or non-numeric.
pub const DEFAULT_VERTEX_LIMIT: usize = 100;

/// Hostname suffix that selects the Neptune dialect.
pub const NEPTUNE_HOST_SUFFIX: &str = "neptune.amazonaws.com";

// ── Identifiers ───────────────────────────────────────────────────

/// A backend-native graph element id.
///
/// Gremlin servers hand out ids of whatever type the underlying store uses
/// (numeric for TinkerGraph/JanusGraph, string for Neptune). The native value
/// is preserved so generated queries can embed it with its original type, and
/// the canonical form keeps numeric and string ids distinguishable: a string
/// id passes through unchanged, anything else is JSON-encoded (`42` → `"42"`).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphId(Value);

impl GraphId {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The canonical string form used in responses.
    pub fn canonical(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// A literal safe to embed in generated query text: always the JSON
    /// encoding, so string ids come out quoted and escaped while numeric ids
    /// keep their unquoted native form.
    pub fn query_literal(&self) -> String {
        self.0.to_string()
    }

    /// The backend-native value.
    pub fn raw(&self) -> &Value {
        &self.0
    }
}

impl Serialize for GraphId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<i64> for GraphId {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}

// ── Canonical entities ────────────────────────────────────────────

/// Property bag shared by vertices and edges: every property key maps to a
/// list of values. Backends that report scalar properties get them wrapped in
/// one-element lists during mapping, so both dialects serialize identically.
pub type PropertyMap = BTreeMap<String, Vec<Value>>;

/// A vertex with its fully resolved incident edges.
///
/// Created with empty `edges` by the result mapper; the expansion
/// orchestrator appends resolved edges and nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Vertex {
    pub id: GraphId,
    pub label: String,
    pub properties: PropertyMap,
    pub edges: Vec<Edge>,
}

/// A fully resolved edge incident to some vertex.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub id: GraphId,
    pub from: GraphId,
    pub to: GraphId,
    pub label: String,
    pub properties: PropertyMap,
}

// ── Dialect ───────────────────────────────────────────────────────

/// Which backend wire protocol and optimizer conventions are in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// A stock Gremlin Server reached over plain HTTP, GraphSON v3 responses.
    Gremlin,
    /// AWS Neptune: TLS, untyped JSON responses, useDFE optimizer hints,
    /// reconnect-fault suppression.
    Neptune,
}

impl Dialect {
    /// Selected once per request from the backend host string.
    pub fn from_host(host: &str) -> Self {
        if host.ends_with(NEPTUNE_HOST_SUFFIX) {
            Self::Neptune
        } else {
            Self::Gremlin
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gremlin => f.write_str("gremlin"),
            Self::Neptune => f.write_str("neptune"),
        }
    }
}

// ── Request context ───────────────────────────────────────────────

/// Everything one inbound call needs, owned exclusively by that call.
///
/// The dialect is fixed at construction and never changes during the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub host: String,
    pub port: u16,
    pub dialect: Dialect,
    /// The caller-supplied traversal fragment, opaque backend-native text.
    pub query: String,
    pub vertex_limit: usize,
}

impl RequestContext {
    pub fn new(
        request_id: Uuid,
        host: String,
        port: u16,
        query: String,
        node_limit: Option<&Value>,
    ) -> Self {
        let dialect = Dialect::from_host(&host);
        let vertex_limit = effective_vertex_limit(node_limit);
        Self {
            request_id,
            host,
            port,
            dialect,
            query,
            vertex_limit,
        }
    }
}

/// Coerce the caller's `nodeLimit` into a usable vertex limit: any
/// non-numeric or non-positive value falls back to the default.
pub fn effective_vertex_limit(node_limit: Option<&Value>) -> usize {
    node_limit
        .and_then(Value::as_i64)
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_VERTEX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_id_is_json_encoded() {
        let id = GraphId::new(json!(42));
        assert_eq!(id.canonical(), "42");
        assert_eq!(id.query_literal(), "42");
    }

    #[test]
    fn test_string_id_passes_through() {
        let id = GraphId::new(json!("abc"));
        assert_eq!(id.canonical(), "abc");
        assert_eq!(id.query_literal(), "\"abc\"");
    }

    #[test]
    fn test_id_with_special_characters_is_escaped_in_query_literal() {
        let id = GraphId::new(json!("a\"b).V()"));
        assert_eq!(id.canonical(), "a\"b).V()");
        assert_eq!(id.query_literal(), r#""a\"b).V()""#);
    }

    #[test]
    fn test_graph_id_serializes_as_canonical_string() {
        let numeric = GraphId::new(json!(7));
        let string = GraphId::new(json!("v1"));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"7\"");
        assert_eq!(serde_json::to_string(&string).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_dialect_from_host() {
        assert_eq!(
            Dialect::from_host("my-cluster.cluster-abc123.us-east-1.neptune.amazonaws.com"),
            Dialect::Neptune
        );
        assert_eq!(Dialect::from_host("localhost"), Dialect::Gremlin);
        assert_eq!(Dialect::from_host("gremlin.internal"), Dialect::Gremlin);
    }

    #[test]
    fn test_vertex_limit_coercion() {
        assert_eq!(effective_vertex_limit(None), 100);
        assert_eq!(effective_vertex_limit(Some(&json!(25))), 25);
        assert_eq!(effective_vertex_limit(Some(&json!(0))), 100);
        assert_eq!(effective_vertex_limit(Some(&json!(-5))), 100);
        assert_eq!(effective_vertex_limit(Some(&json!("lots"))), 100);
        assert_eq!(effective_vertex_limit(Some(&json!(null))), 100);
    }

    #[test]
    fn test_request_context_selects_dialect_once() {
        let ctx = RequestContext::new(
            Uuid::new_v4(),
            "db.neptune.amazonaws.com".to_string(),
            8182,
            "g.V()".to_string(),
            None,
        );
        assert_eq!(ctx.dialect, Dialect::Neptune);
        assert_eq!(ctx.vertex_limit, 100);
    }
}
