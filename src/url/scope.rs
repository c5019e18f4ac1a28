use crate::url::domain::authority;

/// Checks whether a URL belongs to the base domain or one of its subdomains
///
/// The match is on a dot boundary: `sub.example.com` is in scope of
/// `example.com`, `notexample.com` is not. URLs that cannot be parsed (or
/// have no host) are never in scope.
///
/// # Examples
///
/// ```
/// use spider::url::is_in_scope;
///
/// assert!(is_in_scope("https://example.com/page", "example.com"));
/// assert!(is_in_scope("https://blog.example.com/post", "example.com"));
/// assert!(!is_in_scope("https://notexample.com/", "example.com"));
/// assert!(!is_in_scope("https://other-domain.com/", "example.com"));
/// ```
pub fn is_in_scope(url: &str, base_domain: &str) -> bool {
    match authority(url) {
        Ok(candidate) => {
            candidate == base_domain || candidate.ends_with(&format!(".{}", base_domain))
        }
        Err(_) => false,
    }
}
