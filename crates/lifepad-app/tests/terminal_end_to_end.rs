use std::sync::{Mutex, OnceLock};

use anyhow::Result;
use lifepad_app::{
    TerminalRenderer,
    renderer::{Renderer, RendererContext},
};
use lifepad_core::{SandboxConfig, Session};
use serde::Deserialize;
use tempfile::tempdir;

static ENV_GUARD: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvCleanup {
    keys: Vec<String>,
}

impl EnvCleanup {
    fn new() -> Self {
        Self { keys: Vec::new() }
    }

    fn set(&mut self, key: &str, value: &str) {
        unsafe {
            std::env::set_var(key, value);
        }
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvCleanup {
    fn drop(&mut self) {
        for key in &self.keys {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct FrameStatsDto {
    generation: u64,
    alive: usize,
    born: usize,
    died: usize,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct ReportSummaryDto {
    frame_count: usize,
    generations_simulated: u64,
    final_generation: u64,
    final_alive: usize,
    total_born: usize,
    total_died: usize,
    alive_min: usize,
    alive_max: usize,
    alive_mean: f32,
}

#[derive(Debug, Deserialize)]
struct HeadlessReportDto {
    initial: FrameStatsDto,
    frames: Vec<FrameStatsDto>,
    summary: ReportSummaryDto,
}

#[test]
fn terminal_headless_generates_report() -> Result<()> {
    let _guard = ENV_GUARD
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env guard");
    let dir = tempdir()?;
    let report_path = dir.path().join("headless.json");

    let mut env = EnvCleanup::new();
    env.set("LIFEPAD_TERMINAL_HEADLESS", "1");
    env.set("LIFEPAD_TERMINAL_HEADLESS_FRAMES", "6");
    env.set(
        "LIFEPAD_TERMINAL_HEADLESS_REPORT",
        report_path.to_str().expect("utf8 path"),
    );

    let session = Session::new(SandboxConfig {
        width: 60,
        height: 24,
        ..SandboxConfig::default()
    })?;
    let renderer = TerminalRenderer::default();
    renderer.run(RendererContext { session })?;

    let raw = std::fs::read_to_string(&report_path)?;
    let report: HeadlessReportDto = serde_json::from_str(&raw)?;

    assert_eq!(report.initial.generation, 0);
    assert!(
        report.initial.alive > 0,
        "seeded canvas should start with live cells"
    );
    assert_eq!(report.frames.len(), 6);
    assert_eq!(report.summary.frame_count, 6);
    assert_eq!(report.summary.generations_simulated, 6);
    assert_eq!(
        report.summary.final_generation,
        report.frames.last().expect("frames").generation
    );
    assert!(report.summary.alive_min <= report.summary.alive_max);

    Ok(())
}
