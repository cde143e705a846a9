//! String normalization for slugs, categories and team names.

/// Lowercase and keep only `[a-z0-9_-]`.
#[must_use]
pub fn sanitize_slug(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
        .collect()
}

/// Lowercase, collapse runs of non-alphanumerics to `-`, trim dashes.
#[must_use]
pub fn normalize_category(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Canonical team name for fuzzy matching: `&` becomes `and`, `st.`/`saint`
/// become `st`, punctuation is dropped and whitespace collapsed.
#[must_use]
pub fn normalize_team_name(value: &str) -> String {
    let lowered = value
        .to_lowercase()
        .replace('&', "and")
        .replace("st.", "st")
        .replace("saint", "st");
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep ASCII digits only.
#[must_use]
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Decode `%XX` escapes in a URL path segment. Malformed escapes are kept
/// verbatim.
#[must_use]
pub fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = value.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
