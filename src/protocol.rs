use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inbound frames. Each WebSocket text frame is one JSON object of the form
/// `{"type": <name>, "data": <payload>}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Command(String),
    NanoLoad { file: String },
    NanoSave { file: String, content: String },
}

/// Outbound frames, same envelope. Pushed only to the originating session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Output(String),
    CurrentPath(String),
    NanoOpen { file: String },
    NanoContent { content: String },
}

/// Renders a jailed directory the way the bundled client presents it: a faux
/// Windows drive rooted at the sandbox. Presentation only; never used for
/// containment decisions.
pub fn display_path(root: &Path, dir: &Path) -> String {
    let Ok(rel) = dir.strip_prefix(root) else {
        return dir.display().to_string();
    };
    let mut out = String::from("C:\\Storage");
    for comp in rel.components() {
        out.push('\\');
        out.push_str(&comp.as_os_str().to_string_lossy());
    }
    out
}
