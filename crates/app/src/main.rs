//! stipple - headless stroke replay
//!
//! Replays a JSON stroke script through a painting session on the CPU
//! canvas, using the script's timestamps as the clock, and writes the
//! flattened canvas as a PNG.

mod script;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::Parser;
use stipple_painting::{
    Brush, BrushShape, CpuCanvas, FileTextureProvider, JitterSource, PaintSession, RandomJitter, RenderSurface,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::script::{Script, ScriptEvent};

#[derive(Parser, Debug)]
#[command(name = "stipple", version)]
struct Cli {
    /// Input stroke script (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override canvas width.
    #[arg(long)]
    width: Option<u32>,

    /// Override canvas height.
    #[arg(long)]
    height: Option<u32>,

    /// Composite the result over an opaque white background.
    #[arg(long)]
    opaque: bool,

    /// Log per-segment detail.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut script = read_script(&cli.in_path)?;
    if let Some(width) = cli.width {
        script.config.display.width = width;
    }
    if let Some(height) = cli.height {
        script.config.display.height = height;
    }
    script.scale_to_device();

    let assets_root = cli.in_path.parent().unwrap_or_else(|| Path::new("."));
    let brush = build_brush(&script, assets_root)?;

    let width = script.config.display.scaled_width();
    let height = script.config.display.scaled_height();
    let canvas = CpuCanvas::new(width, height);
    let jitter = match script.seed {
        Some(seed) => RandomJitter::from_seed(seed),
        None => RandomJitter::from_entropy(),
    };
    let mut session = PaintSession::new(canvas, jitter, &script.config.stroke, brush);

    replay(&mut session, &script)?;

    let mut bitmap = session.surface().persistent().clone();
    if cli.opaque {
        let mut background = stipple_painting::CpuSurface::new(width, height);
        background.clear([1.0, 1.0, 1.0, 1.0]);
        for (index, pixel) in bitmap.pixels().iter().enumerate() {
            let x = index as u32 % width;
            let y = index as u32 / width;
            background.blend_pixel(x, y, *pixel, 1.0);
        }
        bitmap = background;
    }

    if let Some(parent) = cli.out.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    bitmap
        .to_rgba8_image()
        .save_with_format(&cli.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", cli.out.display()))?;

    info!("wrote {}", cli.out.display());
    Ok(())
}

fn read_script(path: &Path) -> anyhow::Result<Script> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let r = BufReader::new(f);
    let script: Script = serde_json::from_reader(r).with_context(|| "parse script JSON")?;
    Ok(script)
}

fn build_brush(script: &Script, assets_root: &Path) -> anyhow::Result<Brush> {
    let provider = FileTextureProvider {
        shape_path: script.shape_texture.as_ref().map(|p| assets_root.join(p)),
        grain_path: script.grain_texture.as_ref().map(|p| assets_root.join(p)),
    };
    let shape = BrushShape::from_provider(&provider, script.brush.stroke.falloff);
    let brush = Brush::new(script.brush.clone(), shape).context("invalid brush settings")?;
    Ok(brush)
}

/// Feed the events through the session, ticking the flatten timer on the
/// script clock, then let the final flatten run.
fn replay<S: RenderSurface, J: JitterSource>(session: &mut PaintSession<S, J>, script: &Script) -> anyhow::Result<()> {
    let origin = Instant::now();
    let mut now = origin;

    for timed in &script.events {
        now = origin + Duration::from_millis(timed.at_ms);
        session.tick(now)?;

        if let Some(event) = timed.event.pointer() {
            if let Err(e) = session.handle(event, now) {
                warn!("event at {}ms rejected: {}", timed.at_ms, e);
            }
            continue;
        }
        match timed.event {
            ScriptEvent::Clear => session.clear(),
            ScriptEvent::Color(color) => session.set_brush_color(color),
            ScriptEvent::Size { size } => session.set_brush_size(size),
            _ => {}
        }
    }

    if session.is_stroking() {
        warn!("script ended mid-stroke; ending it");
        session.handle(stipple_painting::PointerEvent::End, now)?;
    }

    let quiescent = now + script.config.stroke.flatten_delay();
    if !session.tick(quiescent)? && session.live_primitive_count() > 0 {
        session.flatten_now()?;
    }
    info!(
        "replayed {} events, {} flattens",
        script.events.len(),
        session.trail().flatten_count()
    );
    Ok(())
}
