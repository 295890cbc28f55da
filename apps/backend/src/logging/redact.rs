use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Generator credentials as they appear in error bodies and URLs.
fn api_key_pattern() -> &'static Regex {
    static API_KEY: LazyLock<Regex> = LazyLock::new(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"\b(sk|rk)-[A-Za-z0-9_-]{12,}").unwrap()
    });
    &API_KEY
}

fn bearer_pattern() -> &'static Regex {
    static BEARER: LazyLock<Regex> = LazyLock::new(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").unwrap()
    });
    &BEARER
}

fn password_in_url_pattern() -> &'static Regex {
    static URL_PASSWORD: LazyLock<Regex> = LazyLock::new(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(postgres(?:ql)?://[^:/@\s]+):[^@\s]+@").unwrap()
    });
    &URL_PASSWORD
}

/// Masks credentials before a string reaches the log pipeline.
///
/// Order: connection-string passwords, bearer headers, then bare API keys.
pub fn redact(input: &str) -> String {
    let url_redacted = password_in_url_pattern().replace_all(input, "$1:[REDACTED]@");
    let bearer_redacted = bearer_pattern().replace_all(&url_redacted, "Bearer [REDACTED]");
    api_key_pattern()
        .replace_all(&bearer_redacted, "[REDACTED_KEY]")
        .to_string()
}

/// Wrapper that redacts when formatted, for use as a tracing field.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}

/// Logs at most `EXCERPT_CHARS` characters of participant statements.
pub struct Excerpt<'a>(pub &'a str);

const EXCERPT_CHARS: usize = 48;

impl fmt::Display for Excerpt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.0.chars();
        let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            write!(f, "{head}…")
        } else {
            f.write_str(&head)
        }
    }
}
