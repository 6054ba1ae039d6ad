//! Echo endpoint for checking forwarded header behavior.
//!
//! # Endpoints
//!
//! - `ANY /e/{*url}` - Returns the request as the application perceives it
//!
//! # Example
//!
//! ```bash
//! curl -H "X-Forwarded-For: 203.0.113.5" http://localhost:3000/e/anything?x=1
//! ```

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Extension, Path, Query};
use axum::http::{HeaderMap, Method, Uri, header};
use tracing::instrument;

use crate::middleware::ResolvedConnection;
use crate::models::{ConnectionDetails, EchoResponse};

/// Echo the resolved request back as JSON.
///
/// Without the overrides layer (no [`ResolvedConnection`] extension) the
/// connection fields are empty.
#[instrument(skip_all, fields(url = %url))]
pub async fn echo(
    Path(url): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    connection: Option<Extension<ResolvedConnection>>,
    body: String,
) -> Json<EchoResponse> {
    let connection = connection.map(|Extension(c)| c);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(EchoResponse {
        url,
        method: method.to_string(),
        scheme: connection
            .as_ref()
            .map_or_else(|| "http".to_string(), |c| c.scheme.clone()),
        host: connection.as_ref().and_then(|c| c.host.clone()),
        path: uri.path().to_string(),
        query_string: uri.query().map(|q| format!("?{q}")),
        body: content_type.as_ref().map(|_| body),
        content_type,
        connection: ConnectionDetails {
            remote_ip: connection
                .as_ref()
                .and_then(|c| c.remote)
                .map(|r| r.ip().to_string()),
            remote_port: connection.as_ref().and_then(|c| c.remote).map(|r| r.port()),
            local_port: connection.as_ref().map_or(0, |c| c.local_port),
            forwarded_hops: connection.as_ref().map_or(0, |c| c.resolution.hops),
        },
        headers,
        query,
    })
}
