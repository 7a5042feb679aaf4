// What you SEE:
// • A window showing the scene lit by every photographed light at once.
// • The controller (scroll / keyboard / oscillator) changes each light's
//   brightness live; only the lights that moved are recomposited.
// • Every few seconds the full-resolution composite is written to disk
//   in the background and the FPS is logged. ESC quits.

mod backend;
mod config;
mod controller;
mod curve;
mod draw;
mod error;
mod painting;
mod preprocess;
mod rendering;
mod save;
mod types;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use backend::RenderingContext;
use config::Cli;
use controller::{Controller, IntensityController};
use curve::ResponseCurve;
use draw::Drawer;
use error::Result;
use painting::Painting;
use rendering::Rendering;
use save::SaveQueue;
use types::{FrameBuffer, Rgb};

/// FPS is still reported at this pace when saving is disabled.
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.requires_abort() => {
            error!(error = %e, "compositing state is unrecoverable, aborting");
            std::process::abort();
        }
        Err(e) if !e.is_fatal() => {
            warn!(error = %e, "finished with a non-fatal error");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    /* --- Response curve + painting ---
       Any failure here stops before a window ever opens. */
    let curve = match &cli.curve {
        Some(path) => ResponseCurve::from_file(path, cli.inversion_target)?,
        None => ResponseCurve::build(None, cli.curve_size, cli.inversion_target)?,
    };
    info!(
        size = curve.size(),
        source = %cli.curve.as_ref().map_or("default".into(), |p| p.display().to_string()),
        "response curve ready"
    );
    let painting = Painting::load(&cli.images, cli.remove_background(), curve)?;
    let (width, height) = painting.dimensions();

    /* --- Controller + window --- */
    let mut controller = Controller::new(cli.controller);
    controller.begin(painting.channels())?;
    let mut drawer = Drawer::new("Cement", (width, height), cli.window_height)?;

    /* --- Compositing state --- */
    let mut ctx = RenderingContext::new();
    let mut rendering = Rendering::create(&mut ctx, &painting, width, height)?;

    let mut saves = SaveQueue::new(&cli.output);
    let outcome = render_loop(
        cli,
        &mut drawer,
        &mut controller,
        &mut ctx,
        &mut rendering,
        &mut saves,
    );

    // Saves already started always finish, even when the loop failed.
    if saves.outstanding() > 0 {
        info!(pending = saves.outstanding(), "waiting for saves");
    }
    saves.join_all();
    outcome
}

fn render_loop(
    cli: &Cli,
    drawer: &mut Drawer,
    controller: &mut Controller,
    ctx: &mut RenderingContext,
    rendering: &mut Rendering<'_>,
    saves: &mut SaveQueue,
) -> Result<()> {
    let (width, height) = rendering.dimensions();
    let mut screen = FrameBuffer::new(width, height);
    let mut intensity = vec![Rgb::ZERO; rendering.intensities().len()];

    let save_every = cli.save_every();
    let report_every = save_every.unwrap_or(REPORT_INTERVAL);
    let mut last_report = Instant::now();
    let mut last_frame = Instant::now();
    let mut frames: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();
        let dt = now - last_frame;
        last_frame = now;
        frames += 1;

        // 1) New intensities from the controller.
        controller.update(&drawer.input(dt), &mut intensity)?;

        // 2) Re-apply only the channels that moved, then tone-map.
        rendering.update(ctx, &intensity)?;
        let display = rendering.tonemap();

        // 3) Present (this is when the on-screen image updates).
        display.pack_into(&mut screen);
        drawer.present(&screen)?;

        // 4) FPS report and, with it, the periodic save.
        let elapsed = now.duration_since(last_report);
        if elapsed >= report_every {
            let fps = frames as f64 / elapsed.as_secs_f64();
            info!(passes = ctx.passes(), "{fps:.1} FPS");
            if save_every.is_some() {
                saves.trigger(&display);
            }
            frames = 0;
            last_report = now;
        }
    }

    Ok(())
}
