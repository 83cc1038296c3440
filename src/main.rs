mod config;
mod editor;
mod errors;
mod exec;
mod housekeeping;
mod jail;
mod logging;
mod protocol;
mod router;
mod server;
mod session;

use crate::config::Config;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("warden.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
            }
            _ => {}
        }
        i += 1;
    }

    // the service runs with all defaults when no config file is present
    let mut cfg = if config_path.exists() {
        Config::load(&config_path).context("loading config")?
    } else {
        Config::default()
    };
    cfg.apply_env();
    cfg.validate().context("validating config")?;

    let root = config::prepare_root(&cfg.sandbox.root_dir).context("preparing sandbox root")?;

    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    info!(addr = %addr, root = %root.display(), "warden ready");
    println!("warden ready addr={} root={}", addr, root.display());

    server::serve(cfg, root).await
}
