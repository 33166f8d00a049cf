//! The expansion orchestrator: drives one request's full pipeline.
//!
//! Stages, per request: fetch vertices, sample them, then for each surviving
//! vertex concurrently fetch its incident edge ids, sample those, and
//! concurrently resolve each surviving edge's detail. All fan-out within a
//! tier is awaited jointly and fails fast: the first transport or mapping
//! error aborts the whole request and partial work is discarded.

use futures::future::try_join_all;

use gretel_core::{Edge, GraphId, RequestContext, Vertex};

use crate::connection::{self, BackendConnection, GraphError};
use crate::mapper::ResultMapper;
use crate::{query, sample};

/// The outcome of one expansion: edge-complete vertices plus any truncation
/// warnings recorded along the way.
#[derive(Debug)]
pub struct ExpansionResult {
    pub vertices: Vec<Vertex>,
    pub warnings: Vec<String>,
}

/// Orchestrates the fetch-and-expansion pipeline over a dialect-selected
/// connection/mapper pair. One instance per request; owns that request's
/// single backend connection.
pub struct Expander {
    connection: Box<dyn BackendConnection>,
    mapper: ResultMapper,
    ctx: RequestContext,
}

impl Expander {
    /// Open the backend connection for the request and assemble the pipeline.
    pub async fn connect(ctx: RequestContext) -> Result<Self, GraphError> {
        let connection = connection::connect(ctx.dialect, &ctx.host, ctx.port).await?;
        Ok(Self::with_connection(ctx, connection))
    }

    /// Assemble the pipeline over an already-open connection.
    pub fn with_connection(ctx: RequestContext, connection: Box<dyn BackendConnection>) -> Self {
        Self {
            connection,
            mapper: ResultMapper::for_dialect(ctx.dialect),
            ctx,
        }
    }

    /// Run the full pipeline for this request's traversal fragment.
    pub async fn run(&self) -> Result<ExpansionResult, GraphError> {
        let request_id = self.ctx.request_id;
        let limit = self.ctx.vertex_limit;
        let mut warnings = Vec::new();

        tracing::info!(%request_id, query = %self.ctx.query, "performing vertex query");
        let raw = self
            .connection
            .submit(&query::vertex_listing(&self.ctx.query, self.ctx.dialect))
            .await?;
        let vertices = self.mapper.map_vertices(&raw)?;

        let matched = vertices.len();
        let (vertices, truncated) = sample::cap(vertices, limit);
        if truncated {
            let warning = format!(
                "query matched {matched} vertices, above the limit of {limit}; \
                 returning a uniform random sample of {limit} vertices"
            );
            tracing::warn!(%request_id, "{warning}");
            warnings.push(warning);
        }

        if vertices.is_empty() {
            tracing::info!(%request_id, "no vertices found for this query");
            return Ok(ExpansionResult {
                vertices,
                warnings,
            });
        }

        tracing::info!(%request_id, count = vertices.len(), "fetching edges for vertices");
        let expanded = try_join_all(
            vertices
                .into_iter()
                .map(|vertex| self.expand_vertex(vertex)),
        )
        .await?;

        let mut result = Vec::with_capacity(expanded.len());
        for (vertex, vertex_warnings) in expanded {
            warnings.extend(vertex_warnings);
            result.push(vertex);
        }

        tracing::info!(%request_id, "all vertex expansions resolved");
        Ok(ExpansionResult {
            vertices: result,
            warnings,
        })
    }

    /// Resolve one vertex's incident edges: list ids, sample, fetch details
    /// concurrently, append. Sampling is per vertex, against the same numeric
    /// limit as the vertex tier.
    async fn expand_vertex(&self, mut vertex: Vertex) -> Result<(Vertex, Vec<String>), GraphError> {
        let limit = self.ctx.vertex_limit;
        let raw = self
            .connection
            .submit(&query::incident_edge_ids(&vertex.id, self.ctx.dialect))
            .await?;
        let edge_ids: Vec<GraphId> = raw.iter().map(|r| self.mapper.map_id(r)).collect();

        let mut warnings = Vec::new();
        let incident = edge_ids.len();
        let (edge_ids, truncated) = sample::cap(edge_ids, limit);
        if truncated {
            let warning = format!(
                "vertex {}: {incident} incident edges, above the limit of {limit}; \
                 returning a uniform random sample of {limit} edges",
                vertex.id
            );
            tracing::warn!(request_id = %self.ctx.request_id, "{warning}");
            warnings.push(warning);
        }

        if edge_ids.is_empty() {
            return Ok((vertex, warnings));
        }

        tracing::debug!(
            request_id = %self.ctx.request_id,
            vertex = %vertex.id,
            count = edge_ids.len(),
            "fetching edge details"
        );
        let fetched = try_join_all(edge_ids.iter().map(|edge_id| self.fetch_edge(edge_id))).await?;
        for edges in fetched {
            vertex.edges.extend(edges);
        }
        Ok((vertex, warnings))
    }

    async fn fetch_edge(&self, edge_id: &GraphId) -> Result<Vec<Edge>, GraphError> {
        let raw = self
            .connection
            .submit(&query::edge_detail(edge_id, self.ctx.dialect))
            .await?;
        self.mapper.map_edges(&raw)
    }
}
