use http::HeaderMap;

/// Combined request authentication, first stage: read
/// `Authorization: Bearer <token>`; if absent, read `x-api-key: <token>`.
/// The `Bearer` scheme match is case-insensitive, comparing the lowercased
/// scheme token rather than matching two literal casings.
pub fn extract_bearer_or_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_str(headers, "authorization") {
        let value = value.trim();
        if let Some((scheme, token)) = value.split_once(' ') {
            if scheme.eq_ignore_ascii_case("bearer") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    header_str(headers, "x-api-key").map(|v| v.trim().to_string())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
