use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop::timer::{TimeoutAction, Timer};
use clap::{ArgAction, Parser};
use layerkit::render::flatten;
use layerkit::registry::write_png;
use layerkit::scene::{Reconciler, Scene};
use layerkit::{Config, Engine};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "layerkit")]
#[command(version, about = "Retained-mode 2D scene renderer")]
struct Cli {
    /// Scene file (TOML) to render
    #[arg(long, short = 's', value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Directory for the rendered PNGs (canvas.png plus surfaces/<name>.png)
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Config file to use instead of ~/.config/layerkit/config.toml
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of frames to run
    #[arg(long, short = 'f', value_name = "N")]
    frames: Option<u64>,

    /// Print the config file JSON schema and exit
    #[arg(long, action = ArgAction::SetTrue)]
    print_schema: bool,
}

/// State threaded through the frame timer.
struct Host {
    engine: Engine,
    /// Timer ticks so far, whether or not a frame was due.
    ticks: u64,
    frames: u64,
    max_frames: u64,
    stop_when_idle: bool,
    quit: Arc<AtomicBool>,
}

impl Host {
    /// Runs one frame. Returns `false` once the loop should stop.
    fn tick(&mut self) -> bool {
        if self.quit.load(Ordering::Acquire) {
            info!("Quit signal received - stopping render loop");
            self.engine.cancel();
            return false;
        }

        self.ticks += 1;
        if let Some(report) = self.engine.pump() {
            self.frames += 1;
            for error in &report.errors {
                warn!("{}", error);
            }
            debug!(
                "Frame {} painted {:?}",
                report.frame_index, report.painted
            );
        }

        if self.ticks >= self.max_frames {
            info!("Reached {} frames", self.ticks);
            return false;
        }
        if !self.engine.render_loop().is_running() {
            debug!("No surfaces registered; stopping after {} ticks", self.ticks);
            return false;
        }
        if self.stop_when_idle && !self.engine.registry().has_pending_damage() {
            debug!("Nothing left to paint after {} frames", self.frames);
            return false;
        }
        true
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.print_schema {
        println!("{}", serde_json::to_string_pretty(&Config::json_schema())?);
        return Ok(());
    }

    let Some(scene_path) = cli.scene else {
        println!("layerkit: Retained-mode 2D scene renderer");
        println!();
        println!("Usage:");
        println!("  layerkit --scene scene.toml --out renders/");
        println!("  layerkit --print-schema    Print the config JSON schema");
        println!("  layerkit --help            Show help");
        return Ok(());
    };

    let config = Config::load(cli.config.as_deref())?;
    let scene = Scene::load(&scene_path)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;
    info!(
        "Loaded {} surfaces and {} shapes from {}",
        scene.surfaces.len(),
        scene.shape_count(),
        scene_path.display()
    );

    let mut engine = Engine::new().with_policy(config.render.draw_error_policy);
    let asset_dir = scene_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut reconciler =
        Reconciler::with_asset_dir(config.canvas.size(), config.canvas.scale, asset_dir);
    reconciler.apply(&mut engine, &scene)?;

    let quit = Arc::new(AtomicBool::new(false));
    for signal in [
        signal_hook::consts::SIGINT,
        signal_hook::consts::SIGTERM,
    ] {
        signal_hook::flag::register(signal, Arc::clone(&quit))
            .context("Failed to register signal handler")?;
    }

    let mut host = Host {
        engine,
        ticks: 0,
        frames: 0,
        max_frames: cli.frames.unwrap_or(config.performance.max_frames).max(1),
        stop_when_idle: config.performance.stop_when_idle,
        quit,
    };
    run_frames(&mut host, Duration::from_millis(config.performance.frame_interval_ms))?;
    info!("Rendered {} frames in {} ticks", host.frames, host.ticks);

    export(&host.engine, &config, &cli.out)
}

/// Drives [`Host::tick`] from a calloop timer until it asks to stop.
fn run_frames(host: &mut Host, interval: Duration) -> Result<()> {
    let mut event_loop: EventLoop<Host> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let signal = event_loop.get_signal();

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |_, _, host: &mut Host| {
            if host.tick() {
                TimeoutAction::ToDuration(interval)
            } else {
                signal.stop();
                TimeoutAction::Drop
            }
        })
        .map_err(|err| anyhow::anyhow!("Failed to insert frame timer: {}", err.error))?;

    event_loop
        .run(None, host, |_| {})
        .context("Render loop failed")
}

fn export(engine: &Engine, config: &Config, out: &Path) -> Result<()> {
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let surfaces_dir = out.join("surfaces");
    for surface in engine.registry().surfaces() {
        let Some(file_name) = surface_file_name(surface.name()) else {
            warn!(
                "Surface '{}' is not usable as a file name; skipping its PNG",
                surface.name()
            );
            continue;
        };
        fs::create_dir_all(&surfaces_dir).with_context(|| {
            format!("Failed to create output directory {}", surfaces_dir.display())
        })?;
        let path = surfaces_dir.join(file_name);
        let image = surface
            .snapshot()
            .with_context(|| format!("Failed to snapshot surface '{}'", surface.name()))?;
        write_png(&image, &path)?;
        info!("Wrote {}", path.display());
    }

    let canvas = flatten(
        engine.registry(),
        config.canvas.size(),
        config.canvas.scale,
        config.canvas.background,
    )
    .context("Failed to flatten canvas")?;
    let path = out.join("canvas.png");
    write_png(&canvas, &path)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// File name for a surface's PNG, or `None` when the name could leave the
/// output directory or is otherwise unusable.
fn surface_file_name(name: &str) -> Option<String> {
    let usable = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
    usable.then(|| format!("{name}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_surface_names_become_png_files() {
        assert_eq!(surface_file_name("back").as_deref(), Some("back.png"));
        assert_eq!(surface_file_name("canvas").as_deref(), Some("canvas.png"));
        assert_eq!(
            surface_file_name("layer-2.hi res").as_deref(),
            Some("layer-2.hi res.png")
        );
    }

    #[test]
    fn path_like_surface_names_are_rejected() {
        for name in ["", ".", "..", "../up", "a/b", "a\\b", ".hidden", "/abs", "c:x"] {
            assert_eq!(surface_file_name(name), None, "{name:?}");
        }
    }
}
