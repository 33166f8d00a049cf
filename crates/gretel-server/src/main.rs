//! HTTP entry point for the Gretel graph proxy.
//!
//! Accepts a JSON body naming a backend, a traversal fragment, and a vertex
//! limit; runs the fetch-and-expansion pipeline against that backend; answers
//! with a JSON array of edge-complete vertices. Truncation warnings ride in a
//! response header.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use gretel_core::{RequestContext, ServerConfig};
use gretel_graph::Expander;

mod auth;
mod error;

use auth::{Authenticator, GoogleIdentity, OpenAccess};
use error::ApiError;

/// Response header carrying truncation warnings as a JSON array.
const WARNINGS_HEADER: &str = "x-gretel-warnings";

#[derive(Parser)]
#[command(name = "gretel-server")]
#[command(about = "Subgraph expansion proxy for Gremlin Server and Neptune backends")]
struct Cli {
    /// Config file prefix (default: gretel).
    #[arg(short, long, default_value = "gretel")]
    config: String,

    /// Override the listen address from config.
    #[arg(long)]
    listen: Option<String>,
}

struct AppState {
    authenticator: Box<dyn Authenticator>,
}

/// One inbound query call. `nodeLimit` is accepted as any JSON value and
/// coerced: non-positive or non-numeric falls back to the default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    host: String,
    port: u16,
    query: String,
    #[serde(default)]
    node_limit: Option<Value>,
    #[serde(default)]
    auth: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(&cli.config);
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    let authenticator: Box<dyn Authenticator> = match config.google_client_id.clone() {
        Some(client_id) => {
            tracing::info!("verifying Google id tokens against the configured client id");
            Box::new(GoogleIdentity::new(client_id))
        }
        None => {
            tracing::info!("no Google client id configured; accepting all callers");
            Box::new(OpenAccess)
        }
    };

    let state = Arc::new(AppState { authenticator });

    let app = Router::new()
        .route("/query", post(handle_query))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "gretel proxy listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    if !state
        .authenticator
        .is_authenticated(request.auth.as_deref())
        .await
    {
        tracing::warn!(%request_id, "rejecting unauthenticated request");
        return Err(ApiError::Unauthorized);
    }

    let ctx = RequestContext::new(
        request_id,
        request.host,
        request.port,
        request.query,
        request.node_limit.as_ref(),
    );
    tracing::info!(
        %request_id,
        host = %ctx.host,
        port = ctx.port,
        dialect = %ctx.dialect,
        limit = ctx.vertex_limit,
        "expanding subgraph"
    );

    let expansion = Expander::connect(ctx).await?.run().await?;

    let mut headers = HeaderMap::new();
    if let Some(value) = warnings_header(&expansion.warnings) {
        headers.insert(WARNINGS_HEADER, value);
    }
    Ok((headers, Json(expansion.vertices)).into_response())
}

/// Encode warnings for the side-channel header. Warnings whose text cannot be
/// carried in a header (control characters) drop the header rather than the
/// response.
fn warnings_header(warnings: &[String]) -> Option<HeaderValue> {
    if warnings.is_empty() {
        return None;
    }
    let encoded = serde_json::to_string(warnings).ok()?;
    HeaderValue::from_str(&encoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_accepts_camel_case_limit() {
        let request: QueryRequest = serde_json::from_value(json!({
            "host": "localhost",
            "port": 8182,
            "query": "g.V()",
            "nodeLimit": 50
        }))
        .unwrap();
        assert_eq!(request.node_limit, Some(json!(50)));
        assert!(request.auth.is_none());
    }

    #[test]
    fn test_query_request_tolerates_non_numeric_limit() {
        let request: QueryRequest = serde_json::from_value(json!({
            "host": "localhost",
            "port": 8182,
            "query": "g.V()",
            "nodeLimit": "many"
        }))
        .unwrap();
        // Coercion happens at context construction, not at parse time.
        let ctx = RequestContext::new(
            Uuid::new_v4(),
            request.host,
            request.port,
            request.query,
            request.node_limit.as_ref(),
        );
        assert_eq!(ctx.vertex_limit, 100);
    }

    #[test]
    fn test_warnings_header_is_a_json_array() {
        let warnings = vec!["one".to_string(), "two".to_string()];
        let value = warnings_header(&warnings).unwrap();
        assert_eq!(value.to_str().unwrap(), r#"["one","two"]"#);
    }

    #[test]
    fn test_no_warnings_means_no_header() {
        assert!(warnings_header(&[]).is_none());
    }
}
