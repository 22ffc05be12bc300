pub mod config;
pub mod dash;
pub mod processing;
pub mod status;

use handmouse_core::Client;

/// Context line shared by every one-shot command
fn engine_context(client: &Client) -> String {
    format!("Request to engine at {} failed", client.socket_path().display())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
