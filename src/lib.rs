//! ASCII Impulse - bouncing circles in a square arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision detection, impulse resolution, integration)
//! - `renderer`: Character-grid rendering of body positions
//! - `settings`: Data-driven simulation constants loaded from JSON

pub mod renderer;
pub mod settings;
pub mod sim;

pub use renderer::CharGrid;
pub use settings::{Backend, ImpulseMode, Settings, SettingsError, SpeedClamp};
pub use sim::{Bodies, Body, Simulation, StepStats};

/// Simulation configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Number of bodies in the arena
    pub const POPULATION: usize = 50;
    /// Side length of the square arena (coordinates run 0..ARENA_SIZE-1)
    pub const ARENA_SIZE: f32 = 100.0;

    /// Body defaults - every body shares radius and mass
    pub const BODY_RADIUS: f32 = 1.0;
    pub const BODY_MASS: f32 = 1.0;

    /// Bounce elasticity (0 = fully inelastic, 1 = fully elastic)
    pub const RESTITUTION: f32 = 0.5;
    /// Per-axis speed cap, keeps collisions easy to follow on screen
    pub const MAX_SPEED: f32 = 2.0;

    /// Initial velocity components are integers in [-INITIAL_SPEED_SPREAD, INITIAL_SPEED_SPREAD]
    pub const INITIAL_SPEED_SPREAD: i32 = 2;

    /// Where a body lands after crossing the high edge (ARENA_SIZE - inset)
    pub const BOUNCE_INSET_HIGH: f32 = 1.5;
    /// Where a body lands after crossing the low edge
    pub const BOUNCE_INSET_LOW: f32 = 0.5;

    /// Terminal defaults
    pub const FRAME_DELAY_MS: u64 = 50;
    pub const SCREEN_ROWS: usize = 24;
    pub const SCREEN_COLS: usize = 80;
}
