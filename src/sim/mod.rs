//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Seeded RNG only, and only at initialization
//! - Stable iteration order (by body index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod integrate;
pub mod state;
pub mod step;

pub use collision::{Contact, bodies_collide, contact_impulse, pair_update, resolve_collision};
pub use integrate::{bounce, integrate_body};
pub use state::{Bodies, Body};
pub use step::{Simulation, StepStats};
