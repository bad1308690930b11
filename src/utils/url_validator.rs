//! Validation for URLs submitted for shortening.
//!
//! Only absolute `http`/`https` URLs with a host are accepted. The submitted
//! string is stored exactly as given; deduplication is keyed on that raw form.

use url::Url;

/// Reasons a URL is rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL is empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,
}

/// Checks that `input` parses as an absolute http(s) URL with a non-empty host.
///
/// Relative references such as `not-a-url` fail to parse without a base and
/// are reported as [`UrlValidationError::InvalidFormat`].
///
/// # Examples
///
/// ```ignore
/// assert!(validate_url("https://example.com").is_ok());
/// assert!(validate_url("ftp://example.com").is_err());
/// assert!(validate_url("not-a-url").is_err());
/// ```
pub fn validate_url(input: &str) -> Result<Url, UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
