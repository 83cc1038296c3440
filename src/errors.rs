use std::io;
use thiserror::Error;

/// The jailed operation a path was resolved for. Selects the diagnostic
/// wording when the path escapes containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    Navigate,
    Access,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    Read,
    Write,
    Stat,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("path escapes sandbox")]
    Containment(PathOp),
    #[error("no such directory: {0}")]
    NotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o failure on {name}: {source}")]
    Io {
        name: String,
        kind: IoKind,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Containment(_) => "Containment",
            AppError::NotFound(_) => "NotFound",
            AppError::NotADirectory(_) => "NotADirectory",
            AppError::Spawn { .. } => "Spawn",
            AppError::Io { .. } => "Io",
        }
    }

    /// One plain text line for the session that caused the error. Diagnostics
    /// travel the same output channel as command output, so they carry no
    /// structure beyond the message itself.
    pub fn diagnostic(&self) -> String {
        match self {
            AppError::Containment(PathOp::Navigate) => {
                "Error: Cannot navigate outside the storage directory.".to_string()
            }
            AppError::Containment(PathOp::Access) => {
                "Error: Cannot access files outside storage.".to_string()
            }
            AppError::Containment(PathOp::Save) => {
                "Error: Cannot save file outside storage.".to_string()
            }
            AppError::NotFound(target) => {
                format!("Error: Directory '{target}' does not exist.")
            }
            AppError::NotADirectory(target) => {
                format!("Error: '{target}' is not a directory.")
            }
            AppError::Spawn { program, source } => {
                format!("Error: Cannot run '{program}': {source}")
            }
            AppError::Io { name, kind: IoKind::Read, .. } => {
                format!("Error: Unable to read file {name}")
            }
            AppError::Io { name, kind: IoKind::Write, .. } => {
                format!("Error: Failed to save file {name}")
            }
            AppError::Io { name, kind: IoKind::Stat, .. } => {
                format!("Error: Unable to access {name}")
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
