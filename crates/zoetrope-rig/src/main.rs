mod host;
mod sim;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use zoetrope::host::repaint_queue;
use zoetrope::logging::{LoggingConfig, init_logging};
use zoetrope::render::{FboRenderer, RendererConfig, ViewState};

use crate::host::HeadlessHost;
use crate::sim::SimEngine;

/// Emulated vsync interval the drain loop paces frames at.
const TICK: Duration = Duration::from_millis(4);

fn main() -> Result<()> {
    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║         ZOETROPE HEADLESS RIG          ║");
    println!("  ║   sim engine  ·  queue-paced frames    ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    init_logging(LoggingConfig::default());

    let frame_budget = env_or("ZOETROPE_RIG_FRAMES", 120)?.max(1);
    let notify_hz = env_or("ZOETROPE_RIG_NOTIFY_HZ", 60)?;

    let host = Arc::new(HeadlessHost::new());
    let engine = Arc::new(SimEngine::new(notify_hz));
    let (scheduler, repaints) = repaint_queue();
    let view = Arc::new(ViewState::new());
    view.on_ready(|| log::info!("render context ready; playback loop engaged"));

    let renderer = FboRenderer::new(
        engine.clone(),
        host.clone(),
        Arc::new(scheduler),
        &view,
        RendererConfig::default(),
    );

    // The render thread makes its context current, then kicks frame one;
    // every later frame waits for the repaint intent the previous frame
    // (or an engine notification) queued.
    host.bind();
    let started = Instant::now();
    renderer.render_frame();
    let mut frames: u64 = 1;
    while frames < frame_budget {
        if !repaints.take_timeout(Duration::from_millis(250)) {
            bail!("render loop starved: no repaint intent within 250ms");
        }
        thread::sleep(TICK);
        renderer.render_frame();
        frames += 1;
    }
    let elapsed = started.elapsed();

    view.shutdown();

    let stats = engine.stats();
    println!("  Frames rendered      {frames}");
    println!("  Engine notifies      {}", stats.notifications);
    println!("  Updates / renders    {} / {}", stats.updates, stats.renders);
    println!("  Swaps acknowledged   {}", stats.swaps);
    println!("  Proc lookups         {}", host.resolved());
    println!("  Elapsed              {elapsed:.2?}");
    println!(
        "  Effective rate       {:.1} fps",
        frames as f64 / elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

fn env_or(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a positive integer, got {raw:?}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {name}")),
    }
}
