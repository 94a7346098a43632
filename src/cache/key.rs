//! Cache key composition.

use std::fmt;

use crate::http::request::InboundRequest;

/// Identity of a cached response: method, host, path and query, plus the
/// `Accept` and `Accept-Encoding` headers. Both are forwarded to the origin,
/// so the stored body depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: String,
    host: String,
    path_and_query: String,
    accept: Option<String>,
    accept_encoding: Option<String>,
}

impl CacheKey {
    pub fn from_request(request: &InboundRequest) -> Self {
        Self {
            method: request.method.to_string(),
            host: request.host.clone().unwrap_or_default(),
            path_and_query: request
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
            accept: request.accept().map(str::to_string),
            accept_encoding: request.accept_encoding().map(str::to_string),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.method, self.host, self.path_and_query)?;
        if let Some(accept) = &self.accept {
            write!(f, " [accept={}]", accept)?;
        }
        if let Some(encoding) = &self.accept_encoding {
            write!(f, " [accept-encoding={}]", encoding)?;
        }
        Ok(())
    }
}
