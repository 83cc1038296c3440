use crate::errors::{AppError, AppResult, IoKind, PathOp};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Punctuation accepted in editor file names besides alphanumerics and
/// whitespace. `/` is included so files in subdirectories stay reachable;
/// traversal is blocked by the `..` check below and by containment.
const ALLOWED_PUNCT: &[char] = &[
    '.', '-', '_', '(', ')', '[', ']', '+', ',', '#', '@', '=', '~', '/',
];

/// File-name safety predicate. Rejects empty and whitespace-only names,
/// anything with a character outside the allow-list, and any name containing
/// the parent-directory token — even where later normalization would
/// neutralize it.
pub fn is_safe_file_name(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    if name.contains("..") {
        return false;
    }
    name.chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCT.contains(&c))
}

/// Resolves `requested` against `current` inside `root`, lexically.
///
/// - empty or `.` is a query: `current` comes back unchanged
/// - `..` is the lexical parent of `current`
/// - an absolute-looking path is reinterpreted as rooted at `root`
/// - anything else joins onto `current`, with `.`/`..` segments normalized
///
/// The candidate must still sit under `root` component-wise or the call fails
/// with a containment error. No filesystem access happens here; callers that
/// go on to touch the disk must pass the result through [`canonical_check`].
pub fn resolve(root: &Path, current: &Path, requested: &str, op: PathOp) -> AppResult<PathBuf> {
    let requested = requested.trim();
    if requested.is_empty() || requested == "." {
        return Ok(current.to_path_buf());
    }

    let candidate = if requested == ".." {
        current
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| current.to_path_buf())
    } else if looks_absolute(requested) {
        let rel: PathBuf = Path::new(requested.trim_start_matches(['/', '\\']))
            .components()
            .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
            .collect();
        normalize(&root.join(rel))
    } else {
        normalize(&current.join(requested))
    };

    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(AppError::Containment(op))
    }
}

/// Canonicalizes `candidate` (resolving symlinks) and re-applies the
/// containment check against the canonical root. A missing leaf — or a
/// missing trailing run of components — is tolerated by canonicalizing the
/// deepest existing ancestor and re-appending the remainder, so a
/// not-yet-created file still validates. Components that do not exist cannot
/// be symlinks, which is what makes the re-append sound.
pub fn canonical_check(root: &Path, candidate: &Path, op: PathOp) -> AppResult<PathBuf> {
    let mut existing = candidate.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    loop {
        match dunce::canonicalize(&existing) {
            Ok(canon) => {
                let mut full = canon;
                for name in tail.iter().rev() {
                    full.push(name);
                }
                return if full.starts_with(root) {
                    Ok(full)
                } else {
                    Err(AppError::Containment(op))
                };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (name, parent) = match (existing.file_name(), existing.parent()) {
                    (Some(n), Some(p)) => (n.to_os_string(), p.to_path_buf()),
                    // ran out of components without finding anything on disk
                    _ => return Err(AppError::Containment(op)),
                };
                tail.push(name);
                existing = parent;
            }
            Err(e) => {
                return Err(AppError::Io {
                    name: candidate.display().to_string(),
                    kind: IoKind::Stat,
                    source: e,
                })
            }
        }
    }
}

/// The original service treated any leading separator as absolute, including
/// backslashes that Unix would consider ordinary name characters.
fn looks_absolute(requested: &str) -> bool {
    Path::new(requested).is_absolute() || requested.starts_with(['/', '\\'])
}

/// Lexical normalization: drops `.`, applies `..` by popping. Popping at the
/// filesystem root saturates rather than underflowing.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
