use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tracing::{info, warn};

use spectrum_visualizer::{
    AnimationDriver, PlaybackState, PixmapSurface, SpectrumSource,
    capture::{CaptureDevice, LiveSpectrum},
    config::{Args, EngineConfig, SourceKind},
    controls::{self, Action},
    logging,
    spectrum::SyntheticSource,
    ui,
};

/// Poll interval while frames are due.
const FRAME_POLL: Duration = Duration::from_millis(4);
/// Poll interval while the driver is parked.
const IDLE_POLL: Duration = Duration::from_millis(250);

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn open_source(config: &EngineConfig, kind: SourceKind) -> (Box<dyn SpectrumSource>, SourceKind) {
    if kind == SourceKind::Live {
        let device = if config.capture_input {
            CaptureDevice::Input
        } else {
            CaptureDevice::Loopback
        };
        match LiveSpectrum::open(device, config.bins) {
            Ok(live) => return (Box::new(live), SourceKind::Live),
            Err(err) => warn!("live capture unavailable, playing the sample track: {err}"),
        }
    }
    let demo = SyntheticSource::new(config.bins).with_length(config.demo_frames(), config.looping);
    (Box::new(demo), SourceKind::Demo)
}

fn run(
    terminal: &mut Tui,
    driver: &mut AnimationDriver<PixmapSurface>,
    config: &EngineConfig,
) -> Result<()> {
    let (source, mut kind) = open_source(config, config.source);
    driver.attach(source);
    if !config.start_paused {
        driver.set_playing(true);
    }

    let mut dirty = true;
    loop {
        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);
        let (canvas, _) = ui::layout(screen, driver.style().settings());
        driver.on_canvas_resize(ui::canvas_size(canvas, config.pixel_ratio));

        let outcome = driver.tick(Instant::now());
        if outcome.drew() || dirty {
            terminal.draw(|f| ui::draw(f, driver))?;
            dirty = false;
        }

        let timeout = if outcome.rearm() { FRAME_POLL } else { IDLE_POLL };
        if !event::poll(timeout)? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(key) => key,
            Event::Resize(..) => {
                dirty = true;
                continue;
            }
            _ => continue,
        };
        let Some(action) = controls::action_for(&key) else {
            continue;
        };
        dirty = true;
        if controls::apply_style(action, driver.style_mut()) {
            continue;
        }

        match action {
            Action::Quit => break,
            Action::TogglePlayback => {
                let playing = driver.state() == PlaybackState::Running;
                driver.set_playing(!playing);
            }
            Action::SwapSource => {
                let was_running = driver.state() == PlaybackState::Running;
                let (source, opened) = open_source(config, kind.other());
                kind = opened;
                driver.attach(source);
                driver.set_playing(was_running);
            }
            Action::ToggleAttached => {
                if driver.state() == PlaybackState::Idle {
                    let (source, opened) = open_source(config, kind);
                    kind = opened;
                    driver.attach(source);
                } else {
                    driver.detach();
                }
            }
            _ => {}
        }
    }

    let stats = driver.stats();
    info!(
        drawn = stats.drawn,
        throttled = stats.throttled,
        stills = stats.stills,
        "shutting down"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = EngineConfig::try_from(args).context("Invalid configuration")?;
    logging::init(&config.log)?;
    info!(mode = ?config.settings.active_mode, source = ?config.source, "starting");

    let mut driver = AnimationDriver::new(
        PixmapSurface::new(0, 0),
        config.settings.clone(),
        config.target_fps,
    );
    if let Some(seed) = config.seed {
        driver = driver.with_seed(seed);
    }

    // Setup Terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut driver, &config);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
