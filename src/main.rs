//! ASCII Impulse entry point
//!
//! Loads settings, builds the simulation and runs the draw/step loop in the
//! terminal. Press `q` (or Ctrl-C) to quit, or pass `--frames` to stop on
//! its own.

use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::{cursor, execute, queue, terminal};

use ascii_impulse::consts::*;
use ascii_impulse::{Backend, CharGrid, ImpulseMode, Settings, Simulation};

#[derive(Parser, Debug)]
#[command(version, about = "Bouncing circles with impulse collisions, drawn in the terminal")]
struct Args {
    /// JSON settings file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// RNG seed for the initial scatter
    #[arg(short, long)]
    seed: Option<u64>,
    /// Frames to run (0 = until `q` is pressed)
    #[arg(short, long, default_value_t = 0)]
    frames: u64,
    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = FRAME_DELAY_MS)]
    delay_ms: u64,
    /// Fixed grid height (default: follow the terminal)
    #[arg(long)]
    rows: Option<usize>,
    /// Fixed grid width (default: follow the terminal)
    #[arg(long)]
    cols: Option<usize>,
    /// Step backend: sequential | parallel
    #[arg(long)]
    backend: Option<String>,
    /// Impulse application: scalar | vector
    #[arg(long)]
    impulse: Option<String>,
    /// Step without drawing and print the final positions
    #[arg(long)]
    headless: bool,
}

// load here to keep main clean
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if let Some(name) = &args.backend {
        settings.backend = match Backend::from_str(name) {
            Some(backend) => backend,
            None => bail!("unknown backend `{name}` (expected sequential or parallel)"),
        };
    }
    if let Some(name) = &args.impulse {
        settings.impulse_mode = match ImpulseMode::from_str(name) {
            Some(mode) => mode,
            None => bail!("unknown impulse mode `{name}` (expected scalar or vector)"),
        };
    }
    Ok(settings)
}

/// Grid size for this frame: explicit overrides win, then the terminal's
/// (cols, rows) size, then the built-in default
fn grid_size(rows: Option<usize>, cols: Option<usize>, terminal: Option<(u16, u16)>) -> (usize, usize) {
    let (term_rows, term_cols) = match terminal {
        Some((width, height)) if width > 0 && height > 0 => (height as usize, width as usize),
        _ => (SCREEN_ROWS, SCREEN_COLS),
    };
    (rows.unwrap_or(term_rows), cols.unwrap_or(term_cols))
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') => true,
        // Raw mode swallows SIGINT, so Ctrl-C arrives as a key
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Drain pending input without blocking; true if a quit key was pressed
fn quit_requested() -> Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if is_quit_key(&key) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Raw mode, alternate screen and hidden cursor for the lifetime of the value
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
            .context("failed to set up the terminal")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn run_headless(sim: &mut Simulation, frames: u64) -> Result<()> {
    if frames == 0 {
        bail!("--headless needs a frame count (--frames N)");
    }
    for _ in 0..frames {
        sim.step();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "after {} steps (seed {:?}):", sim.steps(), sim.seed())?;
    for (i, pos) in sim.positions().enumerate() {
        writeln!(out, "{i:3}: ({:7.2}, {:7.2})", pos.x, pos.y)?;
    }
    Ok(())
}

fn run_terminal(sim: &mut Simulation, args: &Args) -> Result<()> {
    if args.rows == Some(0) || args.cols == Some(0) {
        bail!("screen must be at least 1x1");
    }
    let delay = Duration::from_millis(args.delay_ms);
    let arena_size = sim.settings().arena_size;

    let guard = TerminalGuard::enter()?;
    let (rows, cols) = grid_size(args.rows, args.cols, terminal::size().ok());
    let mut grid = CharGrid::new(rows, cols);

    let mut stdout = io::stdout();
    let mut frame = 0u64;
    while args.frames == 0 || frame < args.frames {
        // Follow terminal resizes
        let (rows, cols) = grid_size(args.rows, args.cols, terminal::size().ok());
        if grid.rows() != rows || grid.cols() != cols {
            log::debug!("Grid resized to {}x{}", rows, cols);
            grid = CharGrid::new(rows, cols);
        }

        grid.plot_bodies(sim.positions(), arena_size);
        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
        for (row, line) in grid.lines().enumerate() {
            queue!(stdout, cursor::MoveTo(0, row as u16), Print(line))?;
        }
        stdout.flush()?;

        thread::sleep(delay);
        if quit_requested()? {
            break;
        }
        sim.step();
        frame += 1;
    }
    drop(guard);
    log::info!("Stopped after {} frames", frame);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("ASCII Impulse starting...");

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let mut sim = Simulation::new(settings).context("invalid simulation settings")?;

    if args.headless {
        run_headless(&mut sim, args.frames)
    } else {
        run_terminal(&mut sim, &args)
    }
}
