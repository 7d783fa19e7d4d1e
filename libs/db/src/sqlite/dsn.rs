//! SQLite DSN parsing and cleaning.

use std::collections::HashMap;

/// Query keys consumed by this crate instead of sqlx.
const SQLITE_PRAGMA_PARAMS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

/// Split whitelisted PRAGMA parameters out of the DSN.
///
/// Returns the DSN without those parameters plus the extracted pairs with
/// lowercase keys. A DSN that does not parse as a URL is returned unchanged
/// with no pairs.
pub(crate) fn extract_sqlite_pragmas(dsn: &str) -> (String, HashMap<String, String>) {
    let Ok(mut url) = url::Url::parse(dsn) else {
        return (dsn.to_string(), HashMap::new());
    };
    if url.query().is_none() {
        return (dsn.to_string(), HashMap::new());
    }

    let mut extracted = HashMap::new();
    let mut remaining = Vec::new();
    for (key, value) in url.query_pairs() {
        let key_lower = key.to_lowercase();
        if SQLITE_PRAGMA_PARAMS.contains(&key_lower.as_str()) {
            extracted.insert(key_lower, value.into_owned());
        } else {
            remaining.push((key.into_owned(), value.into_owned()));
        }
    }

    if remaining.is_empty() {
        url.set_query(None);
    } else {
        // re-encode what sqlx still has to see
        url.query_pairs_mut().clear().extend_pairs(&remaining);
    }

    (url.to_string(), extracted)
}

/// True for `sqlite::memory:`, `sqlite://:memory:` and any DSN with `mode=memory`.
pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    let base = dsn.split('?').next().unwrap_or(dsn);
    if matches!(base, "sqlite::memory:" | "sqlite://:memory:" | "sqlite://memory:") {
        return true;
    }

    url::Url::parse(dsn)
        .map(|url| {
            url.query_pairs()
                .any(|(k, v)| k.eq_ignore_ascii_case("mode") && v.eq_ignore_ascii_case("memory"))
        })
        .unwrap_or(false)
}
