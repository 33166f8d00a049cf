//! HTTP error surface for the proxy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use gretel_graph::GraphError;

/// How a failed request is answered. The pipeline never produces a partial
/// body; the error collaborator picks the status code.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Graph(GraphError),
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Graph(err) => {
                let status = match &err {
                    GraphError::Transport(_) => StatusCode::BAD_GATEWAY,
                    GraphError::Mapping { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string()).into_response()
            }
        }
    }
}
