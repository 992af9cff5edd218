use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod media;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::app::{GalleryApp, StartupConfig};

/// Desktop client for a media vault server.
#[derive(Debug, Parser)]
#[command(name = "media-vault-desktop")]
struct Args {
    /// Base URL of the vault server.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    /// Content path to open at startup.
    #[arg(default_value = "")]
    start_path: String,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(args.server_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Media Vault Desktop")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    let startup = StartupConfig {
        server_url: args.server_url,
        start_path: args.start_path,
    };
    eframe::run_native(
        "Media Vault Desktop",
        options,
        Box::new(move |cc| Ok(Box::new(GalleryApp::new(cc, startup, cmd_tx, ui_rx)))),
    )
}
