use anyhow::{Context, Result};
use handmouse_core::{Client, Config};

use super::engine_context;
use crate::ProcessingAction;

pub async fn run(config: &Config, action: ProcessingAction) -> Result<()> {
    let client = Client::from_config(config);

    let (response, fallback) = match action {
        ProcessingAction::Start => (client.start_processing().await, "Processing started"),
        ProcessingAction::Stop => (client.stop_processing().await, "Processing stopped"),
    };
    let response = response.with_context(|| engine_context(&client))?;

    println!("{}", response.message.as_deref().unwrap_or(fallback));
    Ok(())
}
