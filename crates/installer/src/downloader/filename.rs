//! Filename extraction from resolved URLs

use crate::downloader::core::{PackError, Result};

/// Raw text after the last `/` of `url`, without decoding.
///
/// The whole string is considered, query included, because the server's
/// "missing file" marker arrives as a query on the final hop.
pub fn trailing_segment(url: &str) -> Result<&str> {
    match url.rsplit_once('/') {
        Some((_, segment)) if !segment.is_empty() => Ok(segment),
        Some(_) => Err(PackError::FilenamePatternMismatch {
            url: url.to_string(),
            reason: "URL ends with '/'".to_string(),
        }),
        None => Err(PackError::FilenamePatternMismatch {
            url: url.to_string(),
            reason: "URL contains no '/'".to_string(),
        }),
    }
}

/// Human filename for `url`: its trailing segment, percent-decoded as UTF-8
pub fn extract_filename(url: &str) -> Result<String> {
    let segment = trailing_segment(url)?;
    decode(url, segment)
}

/// Percent-decode a segment taken from `url`
pub(crate) fn decode(url: &str, segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| PackError::FilenamePatternMismatch {
            url: url.to_string(),
            reason: format!("trailing segment is not valid UTF-8: {}", e),
        })
}
