use anyhow::{Context, Result};
use handmouse_core::{Client, Config, StatusReport};

use super::{engine_context, on_off};
use crate::OutputFormat;

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let client = Client::from_config(config);
    let report = client
        .get_status()
        .await
        .with_context(|| engine_context(&client))?;

    let output = match format {
        OutputFormat::Text => format_text(&report),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&report)?),
    };
    print!("{}", output);

    Ok(())
}

fn format_text(report: &StatusReport) -> String {
    let processing = match report.is_processing {
        Some(true) => "running",
        Some(false) => "paused",
        None => "unknown",
    };
    let asl = report.asl_enabled.map(on_off).unwrap_or("unknown");
    let fps = report
        .fps_whole()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut output = String::new();
    output.push_str("Hand Mouse OS status\n");
    output.push_str("====================\n\n");
    output.push_str(&format!("Processing: {}\n", processing));
    output.push_str(&format!("ASL: {}\n", asl));
    output.push_str(&format!("FPS: {}\n", fps));
    for (key, value) in &report.extra {
        output.push_str(&format!("{}: {}\n", key, value));
    }
    output
}
