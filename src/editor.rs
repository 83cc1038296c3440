use crate::errors::{AppError, AppResult, IoKind, PathOp};
use crate::jail;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Validates `file` for use from `current_dir` and returns the jailed,
/// canonicalized path. The name must pass the safety predicate before any
/// path arithmetic happens.
fn file_path(root: &Path, current_dir: &Path, file: &str, op: PathOp) -> AppResult<PathBuf> {
    if !jail::is_safe_file_name(file) {
        return Err(AppError::Containment(op));
    }
    let candidate = jail::resolve(root, current_dir, file, op)?;
    jail::canonical_check(root, &candidate, op)
}

/// Editor-open request: validate only, no filesystem access. The client is
/// told to open its editor UI and will follow up with a load.
pub fn open(root: &Path, current_dir: &Path, file: &str) -> AppResult<()> {
    file_path(root, current_dir, file, PathOp::Access).map(|_| ())
}

/// Full contents of `file` under the session's current directory. A missing
/// file reads as empty so the editor can be used to create new files.
pub async fn load(root: &Path, current_dir: &Path, file: &str) -> AppResult<String> {
    let path = file_path(root, current_dir, file, PathOp::Access)?;
    match fs::read_to_string(&path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(AppError::Io {
            name: file.to_string(),
            kind: IoKind::Read,
            source: e,
        }),
    }
}

/// Replaces `file` with `content` in full. No atomic-replace guarantee; the
/// parent directory must exist (it is the session's current directory, which
/// the purge job may have removed in the meantime).
pub async fn save(root: &Path, current_dir: &Path, file: &str, content: &str) -> AppResult<()> {
    let path = file_path(root, current_dir, file, PathOp::Save)?;
    fs::write(&path, content).await.map_err(|e| AppError::Io {
        name: file.to_string(),
        kind: IoKind::Write,
        source: e,
    })
}
