//! SQLite file path handling.

use std::io;
use std::path::{Path, PathBuf};

/// Create the parent directory of a file DSN's database path.
pub(crate) fn prepare_sqlite_path(dsn: &str) -> io::Result<()> {
    if let Some(parent) = file_path_from_dsn(dsn).as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Database file path of a `sqlite:` DSN, without the query string.
/// `None` for in-memory and URI-style (`sqlite:file:...`) DSNs.
fn file_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path.starts_with("file:") || path.contains(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Rewrite a relative SQLite file DSN so its path is anchored at `base_dir`.
///
/// In-memory DSNs are normalised to `sqlite::memory:`; absolute paths and
/// URI-style DSNs are returned as-is. Backslashes become forward slashes.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> io::Result<String> {
    let trimmed = dsn.trim();
    if trimmed.eq_ignore_ascii_case("sqlite::memory:")
        || trimmed.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }

    let Some(path) = file_path_from_dsn(trimmed) else {
        return Ok(trimmed.to_string());
    };
    if path.is_absolute() {
        return Ok(trimmed.to_string());
    }

    let query = trimmed.split_once('?').map(|(_, q)| q);
    let absolute = base_dir.join(path);

    let mut out = String::from("sqlite://");
    out.push_str(&absolute.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}
