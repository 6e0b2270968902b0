use crate::UrlError;
use url::Url;

/// Validates a submitted base URL
///
/// The base URL must be absolute, use the `http` or `https` scheme, and name a
/// host. The returned string is the input trimmed of surrounding whitespace and
/// otherwise left as given: the same-origin filter is a plain prefix match
/// against it, so rewriting it (e.g. appending a trailing slash) would change
/// which links a job follows.
///
/// # Examples
///
/// ```
/// use site_indexer::url::parse_base_url;
///
/// assert_eq!(parse_base_url(" http://example.com ").unwrap(), "http://example.com");
/// assert!(parse_base_url("ftp://example.com").is_err());
/// ```
pub fn parse_base_url(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(trimmed.to_string())
}

/// Removes the fragment from an absolute URL
///
/// `/page#intro` and `/page#usage` name the same document, so they must map to
/// one visited-set entry.
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(parse_base_url("http://example.com").is_ok());
        assert!(parse_base_url("https://example.com/docs/").is_ok());
    }

    #[test]
    fn test_keeps_base_verbatim() {
        assert_eq!(
            parse_base_url("https://example.com/docs").unwrap(),
            "https://example.com/docs"
        );
    }

    #[test]
    fn test_rejects_relative() {
        assert!(matches!(parse_base_url("/docs"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("mailto:someone@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            parse_base_url("file:///etc/passwd"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_strip_fragment() {
        let url = Url::parse("https://example.com/page#section").unwrap();
        assert_eq!(strip_fragment(url).as_str(), "https://example.com/page");
    }
}
