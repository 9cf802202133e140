mod api;
mod app;
mod commands;
mod config;
mod event;
mod export;
mod links;
mod query;
mod redirect;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "l9s")]
#[command(about = "A terminal UI for managing short links, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/l9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL (overrides config file and L9S_SERVER_URL)
  #[arg(short, long)]
  server: Option<String>,

  /// Short link slug to follow on startup
  slug: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(server) = args.server {
    config.server.url = server;
  }

  let _log_guard = init_logging()?;

  let mut app = app::App::new(config, args.slug)?;
  app.run().await?;

  Ok(())
}

/// Route logs to a file - the terminal belongs to the UI.
///
/// The returned guard must stay alive for the duration of the program so
/// buffered log lines are flushed.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .unwrap_or_else(std::env::temp_dir)
    .join("l9s");
  std::fs::create_dir_all(&dir)?;

  let appender = tracing_appender::rolling::never(&dir, "l9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
