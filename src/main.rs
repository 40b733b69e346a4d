use clap::Parser;
use wtf_cli::app;
use wtf_cli::cli::Cli;
use wtf_cli::config;
use wtf_cli::logging;
use wtf_cli::pty::PtyHost;
use wtf_cli::tui;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("wtf {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = config::load()?;
    let _log_guard = logging::init(&config)?;

    let session_id = uuid::Uuid::new_v4();
    tracing::info!(%session_id, "starting wtf-cli");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(config));

    // Always attempt to leave the terminal in a sane state, even on error.
    let _ = tui::restore();

    result
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let terminal = tui::init()?;
    let size = terminal.size()?;
    let tui = tui::Tui::new(terminal);

    let (pty, pty_rx) = PtyHost::spawn(size.height.saturating_sub(1), size.width)?;

    app::run(tui, config, pty, pty_rx).await?;
    Ok(())
}
