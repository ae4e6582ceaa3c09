//! Redirect chain resolution
//!
//! Project pages and file ids are turned into content URLs purely by following
//! the server's redirects hop by hop; no lookup API is involved.

use tracing::debug;
use url::Url;

use crate::downloader::core::{HttpClient, PackError, Result};

/// Follows `Location` headers until a hop answers without one
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    http: HttpClient,
    max_redirects: usize,
}

impl RedirectResolver {
    pub fn new(http: HttpClient, max_redirects: usize) -> Self {
        Self { http, max_redirects }
    }

    /// Resolve `url` to the first URL whose response carries no `Location`.
    pub async fn resolve(&self, url: &str) -> Result<Url> {
        let original = Url::parse(url).map_err(|e| PackError::malformed_url(url, e))?;
        let mut current = original.clone();
        let mut hops = 0;

        loop {
            let Some(location) = self.http.location_of(&current).await? else {
                debug!("Resolved {} after {} hop(s): {}", url, hops, current);
                return Ok(current);
            };

            if hops == self.max_redirects {
                return Err(PackError::TooManyRedirects {
                    url: url.to_string(),
                    limit: self.max_redirects,
                });
            }
            hops += 1;
            current = next_hop(&original, &location)?;
        }
    }
}

/// Build the next request target from a raw `Location` value.
///
/// Host-relative targets keep the scheme, host and port of the first request
/// in the chain rather than those of the previous hop.
pub fn next_hop(original: &Url, location: &str) -> Result<Url> {
    let escaped = escape_brackets(location);

    if escaped.starts_with('/') {
        let host = original
            .host_str()
            .ok_or_else(|| PackError::malformed_url(original.as_str(), url::ParseError::EmptyHost))?;
        let authority = match original.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let rebuilt = format!("{}://{}{}", original.scheme(), authority, escaped);
        Url::parse(&rebuilt).map_err(|e| PackError::malformed_url(rebuilt, e))
    } else {
        Url::parse(&escaped).map_err(|e| PackError::malformed_url(escaped, e))
    }
}

/// Servers emit raw brackets in redirect targets; encode them before parsing
pub fn escape_brackets(location: &str) -> String {
    location.replace('[', "%5B").replace(']', "%5D")
}
