//! Collision detection and impulse resolution for equal circles
//!
//! Detection is a plain distance test. Resolution never touches the bodies'
//! velocities directly: it returns (or stages) the velocities each body should
//! take once the whole pair scan is done, so every pair in a step sees the
//! same pre-impulse state.

use glam::Vec2;

use super::state::Body;
use crate::settings::{ImpulseMode, Settings};

/// Impulse computed for one colliding pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the first body's center to the second's
    pub normal: Vec2,
    /// Relative velocity along the normal (negative = approaching)
    pub normal_speed: f32,
    /// Impulse scalar
    pub impulse: f32,
}

/// Strict overlap test: touching circles (distance == radii sum) do not collide
#[inline]
pub fn circles_overlap(a: Vec2, b: Vec2, radius_a: f32, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Overlap test for two bodies sharing the configured radius
#[inline]
pub fn bodies_collide(a: &Body, b: &Body, radius: f32) -> bool {
    circles_overlap(a.pos, b.pos, radius, radius)
}

/// Compute the impulse for a pair, or `None` when there is nothing to resolve.
///
/// Two cases are silent no-ops:
/// - coincident centers (no normal can be defined)
/// - bodies already moving apart along the normal
pub fn contact_impulse(
    a: &Body,
    b: &Body,
    restitution: f32,
    inv_mass_a: f32,
    inv_mass_b: f32,
) -> Option<Contact> {
    let relative_vel = b.vel - a.vel;

    let offset = b.pos - a.pos;
    let distance = offset.length();
    if distance == 0.0 {
        return None;
    }
    let normal = offset / distance;

    let normal_speed = relative_vel.dot(normal);
    if normal_speed > 0.0 {
        return None;
    }

    let impulse = -(1.0 + restitution) * normal_speed / (inv_mass_a + inv_mass_b);
    Some(Contact {
        normal,
        normal_speed,
        impulse,
    })
}

/// Velocities the two bodies take after `contact` is applied
pub fn post_impulse_velocities(
    a: &Body,
    b: &Body,
    contact: &Contact,
    inv_mass: f32,
    mode: ImpulseMode,
) -> (Vec2, Vec2) {
    let delta = match mode {
        // Directional part is dropped: both axes get the full scalar
        ImpulseMode::Scalar => Vec2::splat(contact.impulse),
        ImpulseMode::Vector => contact.normal * contact.impulse,
    };
    (a.vel - delta * inv_mass, b.vel + delta * inv_mass)
}

/// Full pair update: overlap test, impulse, staged velocities.
///
/// Returns the new velocities for bodies `i` and `j`, or `None` if the pair
/// does not collide or resolves to a no-op.
pub fn pair_update(bodies: &[Body], i: usize, j: usize, settings: &Settings) -> Option<(Vec2, Vec2)> {
    let (a, b) = (&bodies[i], &bodies[j]);
    if !bodies_collide(a, b, settings.radius) {
        return None;
    }
    let inv_mass = settings.inv_mass();
    let contact = contact_impulse(a, b, settings.restitution, inv_mass, inv_mass)?;
    Some(post_impulse_velocities(
        a,
        b,
        &contact,
        inv_mass,
        settings.impulse_mode,
    ))
}

/// Resolve pair `(i, j)` into the pending buffer.
///
/// Overwrites whatever an earlier pair staged for either body (last write
/// wins). Returns whether anything was staged.
pub fn resolve_collision(
    bodies: &[Body],
    pending: &mut [Vec2],
    i: usize,
    j: usize,
    settings: &Settings,
) -> bool {
    match pair_update(bodies, i, j, settings) {
        Some((vel_i, vel_j)) => {
            pending[i] = vel_i;
            pending[j] = vel_j;
            true
        }
        None => false,
    }
}
