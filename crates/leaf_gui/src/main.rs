mod app;

use anyhow::{Context, Result, anyhow};
use app::LeafApp;
use eframe::{NativeOptions, egui};
use leaf_core::{ClientConfig, HttpPredictionClient};
use tracing_subscriber::EnvFilter;

/// Endpoint baked in at build time; `LEAF_API_URL` at runtime wins.
const BUILD_ENDPOINT: Option<&str> = option_env!("LEAF_API_URL");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env(BUILD_ENDPOINT)
        .context("prediction endpoint is not configured (set LEAF_API_URL)")?;
    tracing::info!(
        endpoint = %config.endpoint,
        timeout = ?config.timeout,
        scale = ?config.confidence_scale,
        "starting Leaf Lens {}",
        env!("LEAF_LENS_VERSION")
    );
    let client = HttpPredictionClient::new(config).context("failed to set up HTTP client")?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Leaf Lens {}", env!("LEAF_LENS_VERSION")))
            .with_inner_size([720.0, 680.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Leaf Lens",
        options,
        Box::new(move |cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(LeafApp::new(
                cc.egui_ctx.clone(),
                client,
            )))
        }),
    )
    .map_err(|e| anyhow!("Leaf Lens stopped with an error: {e}"))
}
