mod app;
mod classify;
mod data_registry;
mod diagnose;
mod event;
mod host;
mod images;
mod interpret;
mod llm;
mod preview;
mod prompt;
mod session;
mod system_apps;
mod theme;

use app::StudioApp;
use eframe::egui;
use llm::{HttpLlmClient, LlmConfig, StudioLlm};
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = LlmConfig::from_env();
    if !config.is_configured() {
        tracing::warn!("APPSTUDIO_API_KEY is not set; generation requests will be rejected");
    }
    let llm_configured = config.is_configured();

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("appstudio-runtime")
        .build()?;

    let client = HttpLlmClient::new(config);
    let llm = runtime.block_on(async { StudioLlm::new(tx, client, tokio::runtime::Handle::current()) });
    let app = StudioApp::new(rx, llm, llm_configured);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "App Development Studio",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
