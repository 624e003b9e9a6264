use sha2::{Digest, Sha256};

// Paths in build logs are Windows paths, but buildlens also runs on unix
// hosts (tests, CI), so every operation here is lexical. Stored paths always
// use forward slashes.

/// Stable 64-bit hash: first 8 bytes of SHA-256, little-endian. Stable
/// across runs and platforms, so it can double as a database primary key.
pub fn stable_hash64(s: &str) -> u64 {
    let digest = Sha256::digest(s.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Case-folded form used for path identity. Windows filesystems are
/// case-insensitive, so `C:/Inc/A.h` and `c:/inc/a.h` are the same file.
pub fn case_fold(s: &str) -> String {
    s.to_lowercase()
}

/// Identity key of a normalized path: hash of its case-folded form.
pub fn path_key(path: &str) -> u64 {
    stable_hash64(&case_fold(path))
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn ensure_trailing_slash(mut dir: String) -> String {
    if !dir.is_empty() && !dir.ends_with('/') && !dir.ends_with('\\') {
        dir.push('/');
    }
    dir
}

/// A path is absolute if it carries a drive letter (`C:...`), is rooted
/// (`/...`), or is a UNC path (`//server/...`).
pub fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return true;
    }
    path.starts_with('/') || path.starts_with('\\')
}

/// Resolve `path` against `root`, normalize separators to forward slashes,
/// collapse repeated separators, and resolve `.` / `..` components lexically.
/// `root` must be absolute; relative `..` beyond the root is clamped there.
pub fn absolutize(path: &str, root: &str) -> String {
    let path = normalize_separators(path);
    let joined = if is_absolute(&path) {
        path
    } else {
        format!("{}{}", ensure_trailing_slash(normalize_separators(root)), path)
    };

    // Keep the prefix ("C:", "//server", or "") out of component resolution.
    let (prefix, rest) = split_prefix(&joined);
    let mut out: Vec<&str> = Vec::new();
    for comp in rest.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            c => out.push(c),
        }
    }
    format!("{}/{}", prefix, out.join("/"))
}

fn split_prefix(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return (&path[..2], &path[2..]);
    }
    if let Some(rest) = path.strip_prefix("//") {
        // UNC: the server name belongs to the prefix
        if let Some(i) = rest.find('/') {
            return (&path[..2 + i], &path[2 + i..]);
        }
        return (path, "");
    }
    ("", path)
}

/// Split into (folder, file name). The folder keeps its trailing slash so it
/// can be used directly as a search directory. A path with no separator
/// yields an empty folder.
pub fn split_folder_file(path: &str) -> (String, String) {
    match path.rfind(['/', '\\']) {
        Some(i) => (path[..=i].to_string(), path[i + 1..].to_string()),
        None => (String::new(), path.to_string()),
    }
}
