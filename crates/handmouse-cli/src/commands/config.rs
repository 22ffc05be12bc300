use anyhow::{bail, Context, Result};
use handmouse_core::{Client, Config};

use super::{engine_context, on_off};
use crate::{GetKey, SetKey, ToggleKey};

pub async fn get(config: &Config, key: GetKey) -> Result<()> {
    let client = Client::from_config(config);
    let report = client
        .get_status()
        .await
        .with_context(|| engine_context(&client))?;

    let value = match key {
        GetKey::Asl => report.asl_enabled.map(|b| on_off(b).to_string()),
        GetKey::Status => report.is_processing.map(|b| b.to_string()),
        GetKey::Fps => report.fps_whole().map(|f| f.to_string()),
    };
    let label = match key {
        GetKey::Asl => "ASL",
        GetKey::Status => "Processing",
        GetKey::Fps => "FPS",
    };
    println!("{}: {}", label, value.as_deref().unwrap_or("unknown"));

    Ok(())
}

pub async fn set(config: &Config, key: SetKey, value: &str) -> Result<()> {
    let client = Client::from_config(config);

    match key {
        SetKey::Asl => {
            let enabled = parse_switch(value)?;
            let state = client
                .set_asl(enabled)
                .await
                .with_context(|| engine_context(&client))?;
            println!("ASL: {}", on_off(state.enabled.unwrap_or(enabled)));
        }
        SetKey::Camera => {
            let index: i64 = value
                .parse()
                .with_context(|| format!("Camera index must be an integer, got {:?}", value))?;
            client
                .set_camera(index)
                .await
                .with_context(|| engine_context(&client))?;
            println!("Camera: {}", index);
        }
    }

    Ok(())
}

pub async fn toggle(config: &Config, key: ToggleKey) -> Result<()> {
    let client = Client::from_config(config);

    match key {
        ToggleKey::Asl => {
            let state = client
                .toggle_asl()
                .await
                .with_context(|| engine_context(&client))?;
            match state.enabled {
                Some(enabled) => println!("ASL: {}", on_off(enabled)),
                None => println!("ASL toggled"),
            }
        }
    }

    Ok(())
}

/// Parse an on/off style value
fn parse_switch(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => bail!("Expected on/off, true/false, yes/no or 1/0, got {:?}", other),
    }
}
