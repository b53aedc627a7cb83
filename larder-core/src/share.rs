//! Incoming shared links.

/// Pull the `url` parameter out of a launch URL (`app://open?url=...`) or a
/// bare query string (`?url=...`). Only absolute http(s) URLs are returned.
pub fn shared_url(launch: &str) -> Option<String> {
    let launch = launch.trim();
    let query = match launch.find('?') {
        Some(idx) => &launch[idx + 1..],
        None => launch,
    };
    let query = query.split('#').next().unwrap_or_default();

    let candidate = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.trim().to_string())?;

    let parsed = url::Url::parse(&candidate).ok()?;
    if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() {
        Some(candidate)
    } else {
        None
    }
}
