use crate::url::domain::authority;
use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the identity used for deduplication
///
/// # Normalization Steps
///
/// 1. Drop everything from the first `#` onward
/// 2. Strip leading and trailing `/` characters
///
/// No other canonicalization is applied: scheme, host case, query order and
/// `www.` prefixes are all left untouched.
///
/// # Examples
///
/// ```
/// use spider::url::normalize;
///
/// assert_eq!(normalize("https://example.com#frag"), "https://example.com");
/// assert_eq!(normalize("https://example.com/"), "https://example.com");
/// assert_eq!(normalize("https://example.com/#frag"), "https://example.com");
/// ```
pub fn normalize(url: &str) -> String {
    let without_fragment = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };

    without_fragment.trim_matches('/').to_string()
}

/// Resolves a root-relative path against the origin of the page it was found on
///
/// Only the scheme and authority of `page_url` are used; its path, query and
/// fragment are ignored.
///
/// # Arguments
///
/// * `path` - The relative path (typically starting with `/`)
/// * `page_url` - The URL of the page containing the link
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError)` - `page_url` could not be parsed or the join failed
///
/// # Examples
///
/// ```
/// use spider::url::resolve;
///
/// let url = resolve("/some/path", "https://example.com/another/path/?key=value#frag").unwrap();
/// assert_eq!(url, "https://example.com/some/path");
/// ```
pub fn resolve(path: &str, page_url: &str) -> UrlResult<String> {
    let page = Url::parse(page_url).map_err(|e| UrlError::Parse(format!("{}: {}", page_url, e)))?;
    let origin = format!("{}://{}", page.scheme(), authority(page_url)?);

    let base = Url::parse(&origin).map_err(|e| UrlError::Parse(format!("{}: {}", origin, e)))?;
    let joined = base
        .join(path)
        .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))?;

    Ok(joined.to_string())
}
