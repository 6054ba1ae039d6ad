use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request as the application sees it after forwarded headers were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoResponse {
    /// Path captured after `/e/`
    pub url: String,
    pub method: String,
    pub scheme: String,
    pub host: Option<String>,
    pub path: String,
    pub query_string: Option<String>,
    pub content_type: Option<String>,
    pub connection: ConnectionDetails,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Connection facts after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub remote_ip: Option<String>,
    pub remote_port: Option<u16>,
    pub local_port: u16,
    /// Hops unwound from the forwarded chain
    pub forwarded_hops: usize,
}
