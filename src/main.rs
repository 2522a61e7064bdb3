mod app;
mod auth;
mod config;
mod controller;
mod dashboard;
mod event;
mod export;
mod markup;
mod notice;
mod service;
mod session;
mod theme;
mod ui;

use app::DocsumApp;
use config::Config;
use eframe::egui;
use service::{Dispatcher, HttpSummaryService};
use std::sync::mpsc;
use std::sync::Arc;
use theme::Theme;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env()?;
    info!(
        server = %config.server_url,
        user = config.session.display_name(),
        export_dir = %config.export_dir.display(),
        "starting docsum"
    );
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("docsum-runtime")
        .build()?;

    let service = Arc::new(HttpSummaryService::from_config(&config)?);
    let dispatcher = Dispatcher::new(service, runtime.handle().clone(), tx);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Legal Document Summarizer")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([480.0, 560.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "docsum",
        native_options,
        Box::new(move |creation_context| {
            let theme = Theme::default();
            theme.apply_visuals(&creation_context.egui_ctx);
            dispatcher.attach_repaint(creation_context.egui_ctx.clone());
            Ok(Box::new(DocsumApp::new(rx, dispatcher, &config, theme)))
        }),
    )?;

    Ok(())
}
