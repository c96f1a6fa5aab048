use anyhow::Context;
use std::path::PathBuf;
use tether::{config::Config, logging, mcp, server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("tether.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
            }
            other => { eprintln!("unknown argument: {other}"); std::process::exit(2); }
        }
        i += 1;
    }

    let cfg = Config::load(&config_path).with_context(|| format!("loading config {}", config_path.display()))?;
    cfg.validate().context("validating config")?;

    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    let registry = mcp::registry::ToolRegistry::new(&cfg)?;

    info!(
        addr = %addr,
        base_path = %cfg.server.base_path,
        root = %cfg.root.root_dir.display(),
        tools = ?registry.list_names(),
        "tether ready"
    );

    server::serve(cfg, registry).await
}
