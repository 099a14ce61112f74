use anyhow::{Context, Result};
use lifepad_app::{
    TerminalRenderer,
    renderer::{Renderer, RendererContext},
};
use lifepad_core::{SandboxConfig, Session};
use tracing::info;

/// Rows taken by the header block plus the canvas border.
const CHROME_ROWS: u16 = 5;
/// Columns taken by the canvas border.
const CHROME_COLS: u16 = 2;
const FALLBACK_SIZE: (u16, u16) = (80, 24);

fn main() -> Result<()> {
    init_tracing();

    let (width, height) = canvas_dimensions();
    let config = SandboxConfig {
        width: u32::from(width),
        height: u32::from(height),
        ..SandboxConfig::default()
    };
    let session = Session::new(config).context("failed to build sandbox session")?;
    info!(width, height, "Starting lifepad session");

    let renderer = TerminalRenderer::default();
    renderer.run(RendererContext { session })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Canvas dimensions derived from the active terminal once at startup and
/// fixed for the process lifetime. Falls back to 80×24 when no terminal is
/// attached (headless runs).
fn canvas_dimensions() -> (u16, u16) {
    let (cols, rows) = crossterm::terminal::size().unwrap_or(FALLBACK_SIZE);
    (
        cols.saturating_sub(CHROME_COLS).max(1),
        rows.saturating_sub(CHROME_ROWS).max(1),
    )
}
