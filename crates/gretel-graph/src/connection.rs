//! Backend connections for both dialects over the Gremlin HTTP endpoint.
//!
//! Each request owns exactly one connection; there is no pooling, no retries,
//! and no timeouts at this layer. A Gremlin Server connection is ready the
//! moment it is constructed; a Neptune connection performs a handshake
//! against the cluster's status endpoint before any query may be submitted.

use async_trait::async_trait;
use serde_json::{json, Value};

use gretel_core::Dialect;

/// Errors from backend graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Connection or submit failure against either backend. Fails the whole
    /// request; never retried here.
    #[error("backend transport error: {0}")]
    Transport(String),

    /// A raw record was missing a projected field. Fatal to the request: a
    /// partially-shaped entity cannot be returned safely.
    #[error("malformed {entity} record from backend: missing field '{field}'")]
    Mapping {
        entity: &'static str,
        field: &'static str,
    },
}

/// Classification of faults raised by a backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultClass {
    /// Raised by connect or submit; propagates and fails the request.
    Transport,
    /// Raised from within the connection's own error-recovery path while a
    /// prior fault was being handled. Swallowed and logged, never propagated,
    /// never escalated to `Transport`.
    InternalDouble,
}

/// Apply the fault-classification rule, returning the fault only if it is
/// allowed to propagate.
fn filter_fault(fault: GraphError, class: FaultClass) -> Option<GraphError> {
    match class {
        FaultClass::Transport => Some(fault),
        FaultClass::InternalDouble => {
            tracing::warn!(error = %fault, "suppressed internal double fault from backend driver");
            None
        }
    }
}

/// Polymorphic transport capability: submit query text, get raw records.
#[async_trait]
pub trait BackendConnection: Send + Sync {
    async fn submit(&self, gremlin: &str) -> Result<Vec<Value>, GraphError>;
}

/// Open the single connection a request will use. Resolves only once the
/// backend is ready to accept queries.
pub async fn connect(
    dialect: Dialect,
    host: &str,
    port: u16,
) -> Result<Box<dyn BackendConnection>, GraphError> {
    match dialect {
        Dialect::Gremlin => Ok(Box::new(GremlinConnection::new(host, port))),
        Dialect::Neptune => {
            let connection = NeptuneConnection::new(host, port);
            connection.handshake().await?;
            Ok(Box::new(connection))
        }
    }
}

/// POST a query to a Gremlin HTTP endpoint and return the response envelope.
async fn execute(
    http: &reqwest::Client,
    url: &str,
    accept: &str,
    gremlin: &str,
) -> Result<Value, GraphError> {
    tracing::debug!(%url, query = %gremlin, "submitting query");

    let response = http
        .post(url)
        .header(reqwest::header::ACCEPT, accept)
        .json(&json!({
            "gremlin": gremlin,
            "language": "gremlin-groovy",
            "aliases": { "g": "g" },
        }))
        .send()
        .await
        .map_err(|e| GraphError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GraphError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/status/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(GraphError::Transport(format!(
            "backend answered {status}: {message}"
        )));
    }

    let envelope: Value =
        serde_json::from_str(&body).map_err(|e| GraphError::Transport(e.to_string()))?;

    envelope
        .pointer("/result/data")
        .cloned()
        .ok_or_else(|| GraphError::Transport("response envelope has no result data".to_string()))
}

// ── Gremlin Server ────────────────────────────────────────────────

/// Connection to a stock Gremlin Server: plain HTTP, fixed traversal source
/// `g`, fixed GraphSON v3 response encoding. Ready immediately after
/// construction.
pub struct GremlinConnection {
    http: reqwest::Client,
    query_url: String,
}

impl GremlinConnection {
    const ACCEPT: &'static str = "application/vnd.gremlin-v3.0+json";

    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(&format!("http://{host}:{port}"))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            query_url: format!("{base_url}/gremlin"),
        }
    }
}

#[async_trait]
impl BackendConnection for GremlinConnection {
    async fn submit(&self, gremlin: &str) -> Result<Vec<Value>, GraphError> {
        let data = execute(&self.http, &self.query_url, Self::ACCEPT, gremlin).await?;
        // GraphSON v3 wraps the result list in g:List.
        data.pointer("/@value")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                GraphError::Transport("expected a GraphSON g:List result".to_string())
            })
    }
}

// ── Neptune ───────────────────────────────────────────────────────

/// Connection to an AWS Neptune cluster: TLS, untyped JSON responses.
///
/// After a failed submit the connection re-probes the cluster status endpoint
/// so a later submit does not trip over a stale session. A fault raised from
/// inside that recovery path is a double fault and is swallowed rather than
/// surfaced, so it can never abort submissions that do not depend on it.
pub struct NeptuneConnection {
    http: reqwest::Client,
    query_url: String,
    status_url: String,
}

impl NeptuneConnection {
    const ACCEPT: &'static str = "application/json";

    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(&format!("https://{host}:{port}"))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            query_url: format!("{base_url}/gremlin"),
            status_url: format!("{base_url}/status"),
        }
    }

    /// The connect-time handshake: no query may be submitted until this has
    /// completed once.
    pub async fn handshake(&self) -> Result<(), GraphError> {
        let response = self
            .http
            .get(&self.status_url)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GraphError::Transport(format!(
                "cluster status endpoint answered {}",
                response.status()
            )));
        }
        tracing::debug!(url = %self.status_url, "neptune handshake complete");
        Ok(())
    }
}

#[async_trait]
impl BackendConnection for NeptuneConnection {
    async fn submit(&self, gremlin: &str) -> Result<Vec<Value>, GraphError> {
        match execute(&self.http, &self.query_url, Self::ACCEPT, gremlin).await {
            Ok(data) => data.as_array().cloned().ok_or_else(|| {
                GraphError::Transport("expected a JSON array result".to_string())
            }),
            Err(primary) => {
                // Recovery: re-probe the cluster while handling the failure.
                // Whatever the probe raises is a double fault and must not
                // escape.
                if let Err(secondary) = self.handshake().await {
                    let _ = filter_fault(secondary, FaultClass::InternalDouble);
                }
                match filter_fault(primary, FaultClass::Transport) {
                    Some(fault) => Err(fault),
                    None => Ok(Vec::new()),
                }
            }
        }
    }
}
