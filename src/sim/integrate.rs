//! Velocity/position integration and arena bounces

use glam::Vec2;

use super::state::Body;
use crate::consts::{BOUNCE_INSET_HIGH, BOUNCE_INSET_LOW};
use crate::settings::{Settings, SpeedClamp};

/// Take the staged velocity, then reset the slot to "unset".
///
/// Each axis is applied independently; a zero component is the sentinel
/// and leaves that axis alone.
#[inline]
pub fn apply_pending(vel: &mut Vec2, pending: &mut Vec2) {
    if pending.x != 0.0 {
        vel.x = pending.x;
    }
    if pending.y != 0.0 {
        vel.y = pending.y;
    }
    *pending = Vec2::ZERO;
}

/// Enforce the per-axis speed cap
#[inline]
pub fn clamp_speed(vel: &mut Vec2, max_speed: f32, mode: SpeedClamp) {
    match mode {
        SpeedClamp::UpperOnly => {
            vel.x = vel.x.min(max_speed);
            vel.y = vel.y.min(max_speed);
        }
        SpeedClamp::Symmetric => {
            *vel = vel.clamp(Vec2::splat(-max_speed), Vec2::splat(max_speed));
        }
    }
}

/// Reflect one axis off the arena walls. Returns the number of walls hit.
///
/// The body is placed slightly inside the wall so the next step does not
/// test the same crossing again.
#[inline]
fn bounce_axis(pos: &mut f32, vel: &mut f32, arena_size: f32) -> u32 {
    let mut hits = 0;
    if *pos > arena_size - 1.0 {
        *vel = -*vel;
        *pos = arena_size - BOUNCE_INSET_HIGH;
        hits += 1;
    }
    if *pos < 0.0 {
        *vel = -*vel;
        *pos = BOUNCE_INSET_LOW;
        hits += 1;
    }
    hits
}

/// Reflect a body off all four walls
pub fn bounce(body: &mut Body, arena_size: f32) -> u32 {
    bounce_axis(&mut body.pos.x, &mut body.vel.x, arena_size)
        + bounce_axis(&mut body.pos.y, &mut body.vel.y, arena_size)
}

/// Advance one body: staged velocity, speed cap, move, bounce.
/// Returns the number of wall bounces.
pub fn integrate_body(body: &mut Body, pending: &mut Vec2, settings: &Settings) -> u32 {
    apply_pending(&mut body.vel, pending);
    clamp_speed(&mut body.vel, settings.max_speed, settings.speed_clamp);
    body.pos += body.vel;
    bounce(body, settings.arena_size)
}
