//! Decode relay response bodies to UTF-8.

use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;

static HEADER_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([\w.:-]+)"#).expect("Invalid charset header regex")
});

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?([\w.:-]+)"#).expect("Invalid meta charset regex")
});

/// Decode a response body using, in order: the Content-Type charset, a
/// `<meta>` charset in the first 1024 bytes, then UTF-8 (lossy).
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(|ct| label_encoding(&HEADER_CHARSET, ct))
        .or_else(|| {
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
            label_encoding(&META_CHARSET, &head)
        });

    match declared {
        Some(encoding) if encoding != encoding_rs::UTF_8 => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn label_encoding(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str();
    Encoding::for_label(label.as_bytes())
}
