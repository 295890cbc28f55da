//! ETag helpers for session snapshots.
//!
//! The snapshot body carries the coordination record plus roster, submissions
//! and judgment. Only the record bumps `version`, so the tag also folds in the
//! sizes of the insert-only collections.

use crate::repos::session_store::SessionSnapshot;

/// Weak ETag for a snapshot.
///
/// Format: `W/"session-{id}-v{version}-r{roster}-s{submissions}-j{0|1}"`
///
/// # Example
/// ```
/// # use backend::http::etag::snapshot_tag;
/// assert_eq!(snapshot_tag("abc", 3, 4, 5, true), r#"W/"session-abc-v3-r4-s5-j1""#);
/// ```
pub fn snapshot_tag(
    session_id: &str,
    version: i32,
    roster: usize,
    submissions: usize,
    judged: bool,
) -> String {
    format!(
        r#"W/"session-{session_id}-v{version}-r{roster}-s{submissions}-j{}""#,
        u8::from(judged)
    )
}

pub fn snapshot_etag(snapshot: &SessionSnapshot) -> String {
    snapshot_tag(
        snapshot.session.id.as_str(),
        snapshot.state.version,
        snapshot.roster.len(),
        snapshot.submissions.len(),
        snapshot.judgment.is_some(),
    )
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Uses weak comparison: `W/` prefixes are ignored on both sides, and `*`
/// matches any current representation.
pub fn if_none_match_hits(header: &str, etag: &str) -> bool {
    let wanted = opaque(etag);
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == wanted)
}

fn opaque(tag: &str) -> &str {
    tag.trim().strip_prefix("W/").unwrap_or(tag.trim())
}
