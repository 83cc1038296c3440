use crate::errors::AppError;
use crate::protocol::ServerEvent;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::{io::AsyncReadExt, process::Command, sync::mpsc};
use tracing::debug;

/// Rewrites a bare listing command to the platform's native equivalent. A
/// portability shim, not a security control.
fn platform_command(line: &str) -> &str {
    if cfg!(windows) && line.trim() == "ls" {
        "dir"
    } else {
        line
    }
}

/// Spawns `command_line` with `working_dir` as its current directory and
/// streams stdout/stderr chunks into the session's outbound channel as they
/// arrive, ending with one terminal exit event and a `current_path` frame.
///
/// The command line is split on whitespace; no shell is involved, so quoting
/// and expansion are literal. Stream interleaving between stdout and stderr
/// is best-effort; within one stream, chunk order is preserved.
///
/// A closed channel means the owning connection is gone: the child is killed
/// rather than left running, and `kill_on_drop` backstops the cases where
/// this task itself is torn down first.
pub async fn run(
    command_line: String,
    working_dir: PathBuf,
    events: mpsc::Sender<ServerEvent>,
    display: String,
) {
    let line = platform_command(&command_line);
    let mut parts = line.split_whitespace();
    let Some(program) = parts.next() else { return };
    let args: Vec<&str> = parts.collect();

    let mut command = Command::new(program);
    command.args(&args);
    command.current_dir(&working_dir);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            let err = AppError::Spawn {
                program: program.to_string(),
                source: e,
            };
            let _ = events.send(ServerEvent::Output(err.diagnostic())).await;
            let _ = events
                .send(ServerEvent::Output(exit_line(-1)))
                .await;
            let _ = events.send(ServerEvent::CurrentPath(display)).await;
            return;
        }
    };

    let mut stdout = child.stdout.take().unwrap();
    let mut stderr = child.stderr.take().unwrap();
    let mut buf_out = [0u8; 4096];
    let mut buf_err = [0u8; 4096];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            r = stdout.read(&mut buf_out), if out_open => {
                let n = r.unwrap_or(0);
                if n == 0 { out_open = false; continue; }
                let chunk = String::from_utf8_lossy(&buf_out[..n]).into_owned();
                if events.send(ServerEvent::Output(chunk)).await.is_err() {
                    debug!(program, "session gone, killing child");
                    let _ = child.kill().await;
                    return;
                }
            }
            r = stderr.read(&mut buf_err), if err_open => {
                let n = r.unwrap_or(0);
                if n == 0 { err_open = false; continue; }
                let chunk = String::from_utf8_lossy(&buf_err[..n]).into_owned();
                if events.send(ServerEvent::Output(chunk)).await.is_err() {
                    debug!(program, "session gone, killing child");
                    let _ = child.kill().await;
                    return;
                }
            }
        }
    }

    // -1 stands in for death by signal, which carries no exit code
    let code = match child.wait().await {
        Ok(status) => status.code().unwrap_or(-1),
        Err(_) => -1,
    };
    let _ = events.send(ServerEvent::Output(exit_line(code))).await;
    let _ = events.send(ServerEvent::CurrentPath(display)).await;
}

fn exit_line(code: i32) -> String {
    format!("[Process exited with code {code}]")
}
