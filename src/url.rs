use ::url::Url;

// Schemes we are willing to encode. General URL grammar would also accept
// things like javascript: or data: payloads, which make no sense behind a
// scannable code.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlInputError {
    #[error("no URL was provided")]
    Empty,

    #[error("the input is not a valid URL")]
    Invalid,
}

/// Turn user input into the absolute URL that gets encoded. The input is
/// accepted either as-is or with an assumed https:// prefix, so a bare
/// host like "example.com" works without typing a scheme.
pub fn canonicalize(raw: &str) -> Result<String, UrlInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlInputError::Empty);
    }

    if let Ok(url) = Url::parse(trimmed)
        && ALLOWED_SCHEMES.contains(&url.scheme())
    {
        return Ok(trimmed.to_string());
    }

    // Only scheme-less input gets the assumed prefix. Anything already
    // carrying a scheme separator either passed above or must not be
    // rewritten into a hostname, like "ftp://example.com" would be.
    // Note that "host:port" also reads as "scheme:path" under the URL
    // grammar, so the separator check cannot be a parse attempt.
    if !trimmed.contains("://") {
        let prefixed = format!("https://{trimmed}");
        if Url::parse(&prefixed).is_ok() {
            return Ok(prefixed);
        }
    }

    Err(UrlInputError::Invalid)
}
