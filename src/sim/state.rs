//! Body state store
//!
//! Every body lives in one contiguous `Vec`, addressed by index. The pending
//! velocity buffer sits beside it and is only touched inside a step.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::INITIAL_SPEED_SPREAD;

/// A circular body. Radius and mass are shared and live in [`crate::Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }
}

/// Fixed-size body population plus its per-step pending velocities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bodies {
    bodies: Vec<Body>,
    /// Next velocity staged by the resolver. A zero component means "unset".
    #[serde(skip)]
    pending: Vec<Vec2>,
}

impl Bodies {
    /// Build a store from explicit bodies (scenarios and tests)
    pub fn from_bodies(bodies: Vec<Body>) -> Self {
        let pending = vec![Vec2::ZERO; bodies.len()];
        Self { bodies, pending }
    }

    /// Scatter `population` bodies over the arena with small integer velocities
    pub fn random(population: usize, arena_size: f32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        // Positions are whole cells, like the grid they are drawn on
        let cells = (arena_size as i32).max(1);
        let bodies = (0..population)
            .map(|_| {
                let x = rng.random_range(0..cells) as f32;
                let y = rng.random_range(0..cells) as f32;
                let vx = rng.random_range(-INITIAL_SPEED_SPREAD..=INITIAL_SPEED_SPREAD) as f32;
                let vy = rng.random_range(-INITIAL_SPEED_SPREAD..=INITIAL_SPEED_SPREAD) as f32;
                Body::new(Vec2::new(x, y), Vec2::new(vx, vy))
            })
            .collect();
        Self::from_bodies(bodies)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Body> {
        self.bodies.get(i)
    }

    /// Position of body `i`, or `None` past the end
    pub fn position(&self, i: usize) -> Option<Vec2> {
        self.bodies.get(i).map(|b| b.pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn pending(&self, i: usize) -> Option<Vec2> {
        self.pending.get(i).copied()
    }

    /// Split borrow for a step: bodies and the pending buffer side by side
    pub(crate) fn split_mut(&mut self) -> (&mut [Body], &mut [Vec2]) {
        // Deserialized stores come back with no pending buffer
        if self.pending.len() != self.bodies.len() {
            self.pending = vec![Vec2::ZERO; self.bodies.len()];
        }
        (&mut self.bodies, &mut self.pending)
    }
}
