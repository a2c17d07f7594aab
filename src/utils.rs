use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;
use sha2::{Digest, Sha256};

/// Characters provider search endpoints mishandle.
pub const NOISE_CHARS: [char; 3] = ['!', '?', '&'];

/// Substrings that are dropped when building a cache key.
pub const NOISE_SUBSTRINGS: [&str; 1] = [" feat. "];

pub const QUERY_KEY_SEPARATOR: &str = " | ";

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Removes the noise characters without substituting anything for them.
///
/// `"Rock & Roll!?"` becomes `"Rock  Roll"`.
pub fn sanitize(value: &str) -> String {
    value.chars().filter(|c| !NOISE_CHARS.contains(c)).collect()
}

/// Builds the search cache key for an already sanitized (title, artist) pair.
pub fn query_key(title: &str, artist: &str) -> String {
    let mut key = format!("{title}{QUERY_KEY_SEPARATOR}{artist}");
    for noise in NOISE_SUBSTRINGS {
        key = key.replace(noise, " ");
    }
    key
}

/// Trims a scraped cell and collapses inner runs of whitespace.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts an authorization code from operator input.
///
/// Accepts either the bare code or the full redirect URL the provider sent the
/// browser to, in which case the `code` query parameter is used.
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty()),
        Err(_) => Some(input.to_string()),
    }
}

/// Returns `base` with `segments` appended to its path.
pub fn endpoint(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Some(url)
}
