//! LutCam - live camera LUT preview
//!
//! Drives one capture session with a synthetic camera and a logging
//! renderer, replaying the gestures a user would make in the picker.

mod logging_renderer;
mod luts;
mod synthetic;

use anyhow::{bail, Context, Result};
use logging_renderer::LoggingRenderer;
use lutcam_core::SurfaceHandle;
use lutcam_pipeline::{CaptureSession, SessionConfig, SessionEvent};
use luts::AssetLutProvider;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use synthetic::{SyntheticCamera, SyntheticConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Picker geometry of the demo layout.
const STRIP_WIDTH: i32 = 1080;
const THUMB_WIDTH: i32 = 120;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("LutCam starting...");

    let camera = SyntheticCamera::new(SyntheticConfig {
        max_preview: config.max_preview,
        ..SyntheticConfig::default()
    });
    let camera_counters = camera.counters();
    let renderer = LoggingRenderer::new();
    let draws = renderer.draws();

    let (session, events) = CaptureSession::new(
        &config,
        Box::new(renderer),
        Box::new(camera),
        Arc::new(AssetLutProvider::new(&config.asset_root)),
    )?;

    session.on_surface_available(SurfaceHandle(1), 1080, 2340)?;
    session.on_permission_result(true)?;

    if config.sample.uses_lut_strip() {
        // Thumbnails are sized from the preview aspect, so lay out after negotiation
        let negotiated = {
            let events = events.clone();
            tokio::task::spawn_blocking(move || loop {
                match events.recv_timeout(Duration::from_secs(5)) {
                    Ok(SessionEvent::PreviewNegotiated(size)) => return Some(size),
                    Ok(_) => continue,
                    Err(_) => return None,
                }
            })
            .await?
        };
        let Some(size) = negotiated else {
            bail!("camera never reported a preview size");
        };
        info!(size = %size, "Laying out LUT strip");
        session.on_layout_stable(STRIP_WIDTH, THUMB_WIDTH)?;
    }

    tokio::time::timeout(Duration::from_secs(5), session.wait_active())
        .await
        .context("session did not become active")??;

    if config.sample.uses_lut_strip() {
        for offset in (0..=THUMB_WIDTH * 5).step_by(THUMB_WIDTH as usize / 2) {
            let window = session.on_scroll(offset)?;
            info!(
                offset,
                start = window.start_index,
                count = window.draw_count,
                "Scrolled"
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
    if config.sample.uses_luts() {
        session.on_select(3)?;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let stats = session.stop().unwrap_or_default();
    for event in events.try_iter() {
        if let SessionEvent::RendererFailed(message)
        | SessionEvent::CaptureFailed(message)
        | SessionEvent::LutLoadFailed(message) = &event
        {
            warn!(%message, "Session failure");
        }
    }
    info!(
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        draws = draws.load(Ordering::Relaxed),
        camera_frames = camera_counters.produced.load(Ordering::SeqCst),
        outstanding = camera_counters.outstanding(),
        "LutCam finished"
    );
    Ok(())
}
