//! Normalization of raw backend records into the canonical vertex/edge model.
//!
//! The two dialects return structurally different records for the same
//! projection: Neptune answers with plain JSON objects, while Gremlin Server
//! answers in GraphSON v3, where every map is a `g:Map` ordered association
//! list (`"@value": [key1, val1, key2, val2, ...]`) and scalars carry
//! `@type`/`@value` wrappers. Both shapes converge on identical canonical
//! output.

use serde_json::Value;

use gretel_core::{Dialect, Edge, GraphId, PropertyMap, Vertex};

use crate::connection::GraphError;

/// Maps one raw backend record into a canonical `Vertex` or `Edge`.
/// Selected by dialect at construction; no network or mutation side effects.
#[derive(Debug, Clone, Copy)]
pub enum ResultMapper {
    Gremlin,
    Neptune,
}

impl ResultMapper {
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Gremlin => Self::Gremlin,
            Dialect::Neptune => Self::Neptune,
        }
    }

    /// Look up a projected field in a raw record. Fails only when the field
    /// is absent.
    fn field(&self, raw: &Value, entity: &'static str, key: &'static str) -> Result<Value, GraphError> {
        let found = match self {
            Self::Neptune => raw.get(key).cloned(),
            Self::Gremlin => assoc_lookup(raw, key),
        };
        found.ok_or(GraphError::Mapping { entity, field: key })
    }

    /// Map one raw vertex record. Edges start empty; the orchestrator fills
    /// them in.
    pub fn map_vertex(&self, raw: &Value) -> Result<Vertex, GraphError> {
        Ok(Vertex {
            id: GraphId::new(self.field(raw, "vertex", "id")?),
            label: label_text(self.field(raw, "vertex", "label")?),
            properties: property_lists(self.field(raw, "vertex", "properties")?),
            edges: Vec::new(),
        })
    }

    /// Map one raw edge record.
    pub fn map_edge(&self, raw: &Value) -> Result<Edge, GraphError> {
        Ok(Edge {
            id: GraphId::new(self.field(raw, "edge", "id")?),
            from: GraphId::new(self.field(raw, "edge", "from")?),
            to: GraphId::new(self.field(raw, "edge", "to")?),
            label: label_text(self.field(raw, "edge", "label")?),
            properties: property_lists(self.field(raw, "edge", "properties")?),
        })
    }

    pub fn map_vertices(&self, raws: &[Value]) -> Result<Vec<Vertex>, GraphError> {
        raws.iter().map(|raw| self.map_vertex(raw)).collect()
    }

    pub fn map_edges(&self, raws: &[Value]) -> Result<Vec<Edge>, GraphError> {
        raws.iter().map(|raw| self.map_edge(raw)).collect()
    }

    /// Map one raw scalar id record, as returned by an edge-id listing.
    pub fn map_id(&self, raw: &Value) -> GraphId {
        match self {
            Self::Neptune => GraphId::new(raw.clone()),
            Self::Gremlin => GraphId::new(untype(raw)),
        }
    }
}

/// Scan a GraphSON `g:Map` association list for a key, stripping type
/// wrappers from the value on the way out.
fn assoc_lookup(raw: &Value, key: &str) -> Option<Value> {
    let entries = raw.get("@value")?.as_array()?;
    for pair in entries.chunks(2) {
        if let [k, v] = pair {
            if untype(k).as_str() == Some(key) {
                return Some(untype(v));
            }
        }
    }
    None
}

/// Strip GraphSON v3 `@type`/`@value` wrappers recursively, turning `g:Map`
/// association lists into plain objects.
fn untype(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            match (obj.get("@type").and_then(Value::as_str), obj.get("@value")) {
                (Some("g:Map"), Some(wrapped)) => {
                    let mut map = serde_json::Map::new();
                    if let Some(entries) = wrapped.as_array() {
                        for pair in entries.chunks(2) {
                            if let [k, v] = pair {
                                if let Some(key) = untype(k).as_str() {
                                    map.insert(key.to_string(), untype(v));
                                }
                            }
                        }
                    }
                    Value::Object(map)
                }
                (Some(_), Some(wrapped)) => untype(wrapped),
                _ => Value::Object(obj.iter().map(|(k, v)| (k.clone(), untype(v))).collect()),
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(untype).collect()),
        other => other.clone(),
    }
}

fn label_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Normalize a property map so every key holds a list of values, regardless
/// of whether the backend reported scalars or lists.
fn property_lists(value: Value) -> PropertyMap {
    let mut properties = PropertyMap::new();
    if let Value::Object(entries) = value {
        for (key, val) in entries {
            let list = match val {
                Value::Array(items) => items,
                scalar => vec![scalar],
            };
            properties.insert(key, list);
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A Neptune-shaped vertex record: plain JSON object.
    fn neptune_vertex() -> Value {
        json!({
            "id": 7,
            "label": "person",
            "properties": { "name": ["alice"], "age": [33] }
        })
    }

    /// The same logical vertex as Gremlin Server reports it: a GraphSON v3
    /// `g:Map` association list with typed scalars.
    fn gremlin_vertex() -> Value {
        json!({
            "@type": "g:Map",
            "@value": [
                "id", { "@type": "g:Int64", "@value": 7 },
                "label", "person",
                "properties", {
                    "@type": "g:Map",
                    "@value": [
                        "name", { "@type": "g:List", "@value": ["alice"] },
                        "age", { "@type": "g:List", "@value": [ { "@type": "g:Int32", "@value": 33 } ] }
                    ]
                }
            ]
        })
    }

    fn neptune_edge() -> Value {
        json!({
            "id": 42,
            "from": 7,
            "to": "v-8",
            "label": "knows",
            "properties": { "weight": [0.5] }
        })
    }

    fn gremlin_edge() -> Value {
        json!({
            "@type": "g:Map",
            "@value": [
                "id", { "@type": "g:Int64", "@value": 42 },
                "from", { "@type": "g:Int64", "@value": 7 },
                "to", "v-8",
                "label", "knows",
                "properties", {
                    "@type": "g:Map",
                    "@value": [ "weight", { "@type": "g:Double", "@value": 0.5 } ]
                }
            ]
        })
    }

    #[test]
    fn test_vertex_mapping_is_identical_across_dialects() {
        let from_neptune = ResultMapper::Neptune.map_vertex(&neptune_vertex()).unwrap();
        let from_gremlin = ResultMapper::Gremlin.map_vertex(&gremlin_vertex()).unwrap();
        assert_eq!(
            serde_json::to_string(&from_neptune).unwrap(),
            serde_json::to_string(&from_gremlin).unwrap()
        );
    }

    #[test]
    fn test_edge_mapping_is_identical_across_dialects() {
        let from_neptune = ResultMapper::Neptune.map_edge(&neptune_edge()).unwrap();
        let from_gremlin = ResultMapper::Gremlin.map_edge(&gremlin_edge()).unwrap();
        assert_eq!(
            serde_json::to_string(&from_neptune).unwrap(),
            serde_json::to_string(&from_gremlin).unwrap()
        );
    }

    #[test]
    fn test_numeric_edge_id_is_stringified() {
        let edge = ResultMapper::Neptune.map_edge(&neptune_edge()).unwrap();
        assert_eq!(edge.id.canonical(), "42");
        let serialized: Value = serde_json::to_value(&edge).unwrap();
        assert_eq!(serialized["id"], json!("42"));
    }

    #[test]
    fn test_string_edge_id_passes_through() {
        let mut raw = neptune_edge();
        raw["id"] = json!("abc");
        let edge = ResultMapper::Neptune.map_edge(&raw).unwrap();
        assert_eq!(edge.id.canonical(), "abc");
    }

    #[test]
    fn test_mapped_vertex_starts_with_no_edges() {
        let vertex = ResultMapper::Neptune.map_vertex(&neptune_vertex()).unwrap();
        assert!(vertex.edges.is_empty());
    }

    #[test]
    fn test_scalar_properties_are_wrapped_in_lists() {
        let raw = json!({
            "id": 1,
            "label": "person",
            "properties": { "name": "alice" }
        });
        let vertex = ResultMapper::Neptune.map_vertex(&raw).unwrap();
        assert_eq!(vertex.properties["name"], vec![json!("alice")]);
    }

    #[test]
    fn test_missing_field_is_a_mapping_error() {
        let raw = json!({ "id": 1, "label": "person" });
        let err = ResultMapper::Neptune.map_vertex(&raw).unwrap_err();
        match err {
            GraphError::Mapping { entity, field } => {
                assert_eq!(entity, "vertex");
                assert_eq!(field, "properties");
            }
            other => panic!("expected mapping error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_in_assoc_record_is_a_mapping_error() {
        let raw = json!({
            "@type": "g:Map",
            "@value": [ "id", 1, "label", "person" ]
        });
        assert!(ResultMapper::Gremlin.map_vertex(&raw).is_err());
    }

    #[test]
    fn test_map_id_untypes_gremlin_scalars() {
        let raw = json!({ "@type": "g:Int64", "@value": 42 });
        let id = ResultMapper::Gremlin.map_id(&raw);
        assert_eq!(id.canonical(), "42");
        assert_eq!(id.query_literal(), "42");
    }

    #[test]
    fn test_map_id_keeps_neptune_strings() {
        let id = ResultMapper::Neptune.map_id(&json!("e-1"));
        assert_eq!(id.canonical(), "e-1");
    }

    #[test]
    fn test_map_vertices_is_element_wise() {
        let raws = vec![neptune_vertex(), neptune_vertex()];
        let vertices = ResultMapper::Neptune.map_vertices(&raws).unwrap();
        assert_eq!(vertices.len(), 2);
    }
}
