use anyhow::{Context, Result};
use handmouse_core::{Client, Config, LiveView};
use tokio::sync::mpsc;

use crate::tui::{self, TerminalFrontend};

pub async fn run(config: &Config) -> Result<()> {
    // each tick is its own retry, so polls do not wait for the engine
    let client = Client::new(config.socket_path(), config.poll_policy())
        .with_io_timeout(config.io_timeout());

    let mut frontend = TerminalFrontend::enter().context("Failed to set up terminal")?;
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let reader = tui::input::spawn_reader(input_tx).context("Failed to start input reader")?;

    let mut view = LiveView::new(client, config.tick_interval());
    let result = view.run(&mut frontend, input_rx).await;

    // restore the terminal before anything else is printed
    drop(frontend);
    if reader.join().is_err() {
        tracing::warn!("Input reader panicked");
    }

    result.context("Dashboard rendering failed")
}
