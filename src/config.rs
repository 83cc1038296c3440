use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub sandbox: Sandbox,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub housekeeping: Housekeeping,
    #[serde(default)]
    pub keepalive: Keepalive,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}
impl Default for Server {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr(), port: default_port() }
    }
}
fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

#[derive(Debug, Deserialize, Clone)]
pub struct Sandbox {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}
impl Default for Sandbox {
    fn default() -> Self {
        Self { root_dir: default_root_dir() }
    }
}
fn default_root_dir() -> PathBuf { PathBuf::from("storage") }

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    /// Bound on in-flight outbound frames per session; a slow client
    /// throttles its own processes through this.
    #[serde(default = "default_channel_capacity")]
    pub output_channel_capacity: usize,
}
impl Default for Limits {
    fn default() -> Self {
        Self { output_channel_capacity: default_channel_capacity() }
    }
}
fn default_channel_capacity() -> usize { 64 }

#[derive(Debug, Deserialize, Clone)]
pub struct Housekeeping {
    /// Seconds between full sandbox purges; 0 disables the job.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_s: u64,
}
impl Default for Housekeeping {
    fn default() -> Self {
        Self { purge_interval_s: default_purge_interval() }
    }
}
fn default_purge_interval() -> u64 { 86_400 }

#[derive(Debug, Deserialize, Clone)]
pub struct Keepalive {
    /// Absent disables the self-ping.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_keepalive_interval")]
    pub interval_s: u64,
}
impl Default for Keepalive {
    fn default() -> Self {
        Self { url: None, interval_s: default_keepalive_interval() }
    }
}
fn default_keepalive_interval() -> u64 { 60 }

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// `PORT` in the environment overrides the configured port.
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sandbox.root_dir.as_os_str().is_empty() {
            anyhow::bail!("sandbox root_dir must not be empty");
        }
        if self.limits.output_channel_capacity == 0 {
            anyhow::bail!("output_channel_capacity must be > 0");
        }
        if self.keepalive.url.is_some() && self.keepalive.interval_s == 0 {
            anyhow::bail!("keepalive interval_s must be > 0");
        }
        Ok(())
    }
}

/// Creates the sandbox root if absent and canonicalizes it. Containment
/// checks compare against this canonical form, so it must be computed after
/// creation.
pub fn prepare_root(root: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let c = dunce::canonicalize(root)?;
    Ok(c)
}
