//! URL utilities for consistent endpoint construction.

/// Normalize a base URL by removing trailing slashes, so appending an
/// endpoint path never produces double slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between.
///
/// ```
/// use studiochat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://127.0.0.1:8000/", "/api/ai/chat"),
///     "http://127.0.0.1:8000/api/ai/chat"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_removed() {
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8000///"),
            "http://127.0.0.1:8000"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8000"),
            "http://127.0.0.1:8000"
        );
    }

    #[test]
    fn join_tolerates_slashes_on_either_side() {
        for (base, endpoint) in [
            ("http://127.0.0.1:8000", "api/ai/chat"),
            ("http://127.0.0.1:8000/", "api/ai/chat"),
            ("http://127.0.0.1:8000", "/api/ai/chat"),
            ("http://127.0.0.1:8000/", "/api/ai/chat"),
        ] {
            assert_eq!(
                construct_api_url(base, endpoint),
                "http://127.0.0.1:8000/api/ai/chat"
            );
        }
    }
}
