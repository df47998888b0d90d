mod api;
mod app;
mod chat;
mod config;
mod event;
mod notify;
mod project;
mod theme;
mod validation;

use api::ApiClient;
use app::DashboardApp;
use config::AppConfig;
use eframe::egui;
use event::Dispatcher;
use std::sync::{mpsc, Arc};
use theme::Theme;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(base_url = %config.api_base_url, "starting docchat");
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("docchat-runtime")
        .build()?;

    let api = ApiClient::new(&config)?;
    let dispatcher = Dispatcher::new(Arc::new(api), runtime.handle().clone(), tx);

    let app = DashboardApp::new(
        rx,
        dispatcher,
        config.reveal_tick,
        config.api_base_url.to_string(),
    );
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DocChat",
        native_options,
        Box::new(move |creation_context| {
            Theme::default().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
