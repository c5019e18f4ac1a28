use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the authority (`host[:port]`) from a URL
///
/// The host is lowercased by the URL parser. The port is only included when
/// it is explicit and differs from the scheme's default.
///
/// # Examples
///
/// ```
/// use spider::url::authority;
///
/// assert_eq!(authority("https://Example.com/path").unwrap(), "example.com");
/// assert_eq!(authority("http://127.0.0.1:8080/").unwrap(), "127.0.0.1:8080");
/// ```
pub fn authority(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Extracts the base domain used to scope a crawl
///
/// The base domain is the last two dot-separated labels of the authority.
/// This does not consult a public-suffix list, so multi-label suffixes reduce
/// incorrectly (`example.co.uk` becomes `co.uk`).
///
/// # Examples
///
/// ```
/// use spider::url::base_domain;
///
/// assert_eq!(base_domain("https://up.example.com").unwrap(), "example.com");
/// assert_eq!(base_domain("https://example.com/some/path/?key=value#frag").unwrap(), "example.com");
/// ```
pub fn base_domain(url: &str) -> UrlResult<String> {
    let authority = authority(url)?;

    let labels: Vec<&str> = authority.rsplitn(3, '.').collect();
    if labels.len() < 3 {
        return Ok(authority);
    }

    Ok(format!("{}.{}", labels[1], labels[0]))
}
