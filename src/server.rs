use crate::{
    config::Config,
    editor, exec,
    errors::{AppError, AppResult, IoKind, PathOp},
    housekeeping, jail,
    protocol::{display_path, ClientMessage, ServerEvent},
    router::{self, Action},
    session::{SessionId, SessionStore},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub sandbox_root: Arc<PathBuf>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(cfg: Config, sandbox_root: PathBuf) -> Self {
        Self {
            cfg: Arc::new(cfg),
            sandbox_root: Arc::new(sandbox_root),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

pub async fn serve(cfg: Config, sandbox_root: PathBuf) -> anyhow::Result<()> {
    let shared = AppState::new(cfg, sandbox_root);
    housekeeping::spawn(&shared);

    let app = build_router(shared.clone());
    let addr: std::net::SocketAddr =
        format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, root = %shared.sandbox_root.display(), "warden listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/ws", get(ws_upgrade))
        .fallback_service(tower_http::services::ServeDir::new("public"))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "sessions": state.sessions.len()}))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

/// The session loop is over: the peer vanished mid-send, or the store entry
/// is gone (a lifecycle bug we refuse to paper over).
struct SessionOver;

/// One connection, one session. The store entry lives exactly as long as
/// this function. Outbound traffic flows through a bounded channel drained
/// by a writer task, so anything producing output — including a process
/// streaming task — blocks when the peer cannot keep up.
async fn handle_session(socket: WebSocket, state: AppState) {
    let id = SessionId::new();
    state
        .sessions
        .create(id, state.sandbox_root.as_ref().clone());
    info!(session = %id, "session connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.cfg.limits.output_channel_capacity);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "unserializable event dropped");
                    continue;
                }
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(session = %id, error = %e, "websocket receive error");
                break;
            }
        };
        let msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                warn!(session = %id, error = %e, "malformed frame skipped");
                continue;
            }
        };
        if dispatch(&state, id, &tx, msg).await.is_err() {
            break;
        }
    }

    state.sessions.destroy(id);
    // tearing down the writer drops the channel receiver, which is what
    // signals any still-streaming child processes to die
    writer.abort();
    info!(session = %id, "session disconnected");
}

async fn dispatch(
    state: &AppState,
    id: SessionId,
    tx: &mpsc::Sender<ServerEvent>,
    msg: ClientMessage,
) -> Result<(), SessionOver> {
    let Some(current) = state.sessions.current_dir(id) else {
        error!(session = %id, "session entry missing, closing connection");
        return Err(SessionOver);
    };

    match msg {
        ClientMessage::Command(line) => match router::route(&line) {
            Action::NoOp => Ok(()),
            Action::ReportVersion => {
                send(
                    tx,
                    ServerEvent::Output(format!("warden {}", env!("CARGO_PKG_VERSION"))),
                )
                .await
            }
            Action::ChangeDirectory { target } => {
                change_directory(state, id, tx, &current, &target).await
            }
            Action::OpenEditor { filename } => {
                match editor::open(&state.sandbox_root, &current, &filename) {
                    Ok(()) => send(tx, ServerEvent::NanoOpen { file: filename }).await,
                    Err(e) => report(tx, id, e).await,
                }
            }
            Action::RunShell { command_line } => {
                let display = display_path(&state.sandbox_root, &current);
                // independent task per command so the reader loop stays
                // responsive; overlapping commands are the caller's problem
                tokio::spawn(exec::run(command_line, current, tx.clone(), display));
                Ok(())
            }
        },
        ClientMessage::NanoLoad { file } => {
            match editor::load(&state.sandbox_root, &current, &file).await {
                Ok(content) => send(tx, ServerEvent::NanoContent { content }).await,
                Err(e) => report(tx, id, e).await,
            }
        }
        ClientMessage::NanoSave { file, content } => {
            match editor::save(&state.sandbox_root, &current, &file, &content).await {
                Ok(()) => {
                    send(
                        tx,
                        ServerEvent::Output(format!("File {file} saved successfully.")),
                    )
                    .await
                }
                Err(e) => report(tx, id, e).await,
            }
        }
    }
}

async fn change_directory(
    state: &AppState,
    id: SessionId,
    tx: &mpsc::Sender<ServerEvent>,
    current: &Path,
    target: &str,
) -> Result<(), SessionOver> {
    let root = state.sandbox_root.as_ref();
    if target.is_empty() || target == "." {
        send(
            tx,
            ServerEvent::Output(format!("Current directory: {}", current.display())),
        )
        .await?;
        return send(tx, ServerEvent::CurrentPath(display_path(root, current))).await;
    }
    match resolve_directory(root, current, target).await {
        Ok(dir) => {
            state.sessions.set_current_dir(id, dir.clone());
            send(
                tx,
                ServerEvent::Output(format!("Changed directory to: {}", dir.display())),
            )
            .await?;
            send(tx, ServerEvent::CurrentPath(display_path(root, &dir))).await
        }
        Err(e) => report(tx, id, e).await,
    }
}

/// Jail arithmetic plus the existence/type check a directory change needs.
async fn resolve_directory(root: &Path, current: &Path, target: &str) -> AppResult<PathBuf> {
    let candidate = jail::resolve(root, current, target, PathOp::Navigate)?;
    let dir = jail::canonical_check(root, &candidate, PathOp::Navigate)?;
    let meta = tokio::fs::metadata(&dir).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(target.to_string())
        } else {
            AppError::Io {
                name: target.to_string(),
                kind: IoKind::Stat,
                source: e,
            }
        }
    })?;
    if !meta.is_dir() {
        return Err(AppError::NotADirectory(target.to_string()));
    }
    Ok(dir)
}

/// Boundary conversion: every operation error becomes one diagnostic line on
/// the originating session's output channel, never a dead connection.
async fn report(
    tx: &mpsc::Sender<ServerEvent>,
    id: SessionId,
    err: AppError,
) -> Result<(), SessionOver> {
    warn!(session = %id, code = err.code(), error = %err, "command failed");
    send(tx, ServerEvent::Output(err.diagnostic())).await
}

async fn send(tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) -> Result<(), SessionOver> {
    tx.send(event).await.map_err(|_| SessionOver)
}
