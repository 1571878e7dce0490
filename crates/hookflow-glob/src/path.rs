//! Absolute-to-relative path normalization.

/// Convert separators to `/`.
fn slashes(p: &str) -> String {
    p.replace('\\', "/")
}

/// Whether prefix matching may ignore ASCII case. Case-insensitive
/// filesystems are the norm on Windows and macOS.
fn case_insensitive_fs() -> bool {
    cfg!(any(windows, target_os = "macos"))
}

fn starts_with_ci(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Normalize `path` against the base directory `base`.
///
/// Separators are converted to `/`. When `path` sits under `base`, the
/// `base/` prefix is stripped and a relative path is returned; otherwise
/// the slash-normalized path comes back untouched. A trailing separator on
/// `base` is ignored. `path == base` is returned as-is rather than as an
/// empty string.
///
/// Idempotent: normalizing an already-relative path is a no-op.
pub fn normalize_path(path: &str, base: &str) -> String {
    let path = slashes(path);
    let base = slashes(base);
    let base = base.trim_end_matches('/');

    if base.is_empty() || path == base {
        return path;
    }
    if case_insensitive_fs() && path.eq_ignore_ascii_case(base) {
        return path;
    }

    let prefix = format!("{base}/");
    if let Some(rest) = path.strip_prefix(&prefix) {
        return rest.to_string();
    }
    if case_insensitive_fs() && starts_with_ci(&path, &prefix) {
        return path[prefix.len()..].to_string();
    }

    path
}
