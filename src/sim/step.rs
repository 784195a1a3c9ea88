//! Simulation step
//!
//! One step is two passes with a hard barrier between them:
//! 1. pair scan: detect overlaps and stage post-impulse velocities
//! 2. integration: apply staged velocities, cap speed, move, bounce
//!
//! The backend only decides how those passes are split across threads.
//! Both backends produce bit-identical results.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::resolve_collision;
use super::integrate::integrate_body;
use super::state::{Bodies, Body};
use crate::settings::{Backend, Settings, SettingsError};

/// Counters from the most recent step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    /// Unordered pairs tested for overlap
    pub pairs_tested: usize,
    /// Bodies leaving the pair scan with a staged velocity
    pub staged: usize,
    /// Wall reflections during integration
    pub bounces: usize,
}

/// Owns the body store and advances it one frame at a time
#[derive(Debug, Clone)]
pub struct Simulation {
    settings: Settings,
    bodies: Bodies,
    /// Seed used for the initial scatter (None for hand-built scenarios)
    seed: Option<u64>,
    steps: u64,
    last_stats: StepStats,
}

impl Simulation {
    /// Scatter bodies using `settings`. A missing seed is drawn at random.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        let bodies = Bodies::random(settings.population, settings.arena_size, seed);
        log::info!(
            "Simulation initialized: {} bodies, arena {}, seed {}",
            settings.population,
            settings.arena_size,
            seed
        );
        Ok(Self::build(settings, bodies, Some(seed)))
    }

    /// Default constants with the given population and arena size
    pub fn initialize(population: usize, arena_size: f32) -> Result<Self, SettingsError> {
        Self::new(Settings {
            population,
            arena_size,
            ..Default::default()
        })
    }

    /// Run from an explicit body set. `settings.population` is replaced by
    /// the store's length, so an empty store is rejected.
    pub fn with_bodies(settings: Settings, bodies: Bodies) -> Result<Self, SettingsError> {
        let settings = Settings {
            population: bodies.len(),
            ..settings
        };
        settings.validate()?;
        Ok(Self::build(settings, bodies, None))
    }

    fn build(settings: Settings, bodies: Bodies, seed: Option<u64>) -> Self {
        if settings.backend == Backend::Parallel && !cfg!(feature = "parallel") {
            log::warn!("Parallel backend requested without the `parallel` feature, running sequentially");
        }
        log::info!(
            "Backend: {}, impulse: {}, speed clamp: {:?}",
            settings.backend.as_str(),
            settings.impulse_mode.as_str(),
            settings.speed_clamp
        );
        Self {
            settings,
            bodies,
            seed,
            steps: 0,
            last_stats: StepStats::default(),
        }
    }

    /// Advance one frame
    pub fn step(&mut self) {
        let settings = &self.settings;
        let (bodies, pending) = self.bodies.split_mut();

        let (staged, bounces) = match settings.backend {
            #[cfg(feature = "parallel")]
            Backend::Parallel => {
                parallel::resolve_pairs(bodies, pending, settings);
                let staged = count_staged(pending);
                let bounces = parallel::integrate(bodies, pending, settings);
                (staged, bounces)
            }
            _ => {
                resolve_pairs(bodies, pending, settings);
                let staged = count_staged(pending);
                let bounces = integrate(bodies, pending, settings);
                (staged, bounces)
            }
        };

        let n = bodies.len();
        self.last_stats = StepStats {
            pairs_tested: n * n.saturating_sub(1) / 2,
            staged,
            bounces,
        };
        self.steps += 1;
        log::trace!("step {}: {:?}", self.steps, self.last_stats);
    }

    /// Position of body `i` for the renderer
    pub fn get_position(&self, i: usize) -> Option<(f32, f32)> {
        self.bodies.position(i).map(|p| (p.x, p.y))
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.bodies.iter().map(|b| b.pos)
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Completed steps since construction
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }
}

fn count_staged(pending: &[Vec2]) -> usize {
    pending.iter().filter(|p| **p != Vec2::ZERO).count()
}

/// Sequential pair scan, i < j in lexicographic order
fn resolve_pairs(bodies: &[Body], pending: &mut [Vec2], settings: &Settings) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            resolve_collision(bodies, pending, i, j, settings);
        }
    }
}

/// Sequential integration in index order
fn integrate(bodies: &mut [Body], pending: &mut [Vec2], settings: &Settings) -> usize {
    bodies
        .iter_mut()
        .zip(pending.iter_mut())
        .map(|(body, slot)| integrate_body(body, slot, settings) as usize)
        .sum()
}

#[cfg(feature = "parallel")]
mod parallel {
    use glam::Vec2;
    use rayon::prelude::*;

    use crate::sim::collision::pair_update;
    use crate::sim::integrate::integrate_body;
    use crate::sim::state::Body;
    use crate::settings::Settings;

    /// Pending velocity body `k` ends the sequential scan with.
    ///
    /// In i < j order the pairs touching `k` are (0,k)..(k-1,k) then
    /// (k,k+1)..(k,n-1), so the last write comes from the highest partner
    /// above `k`, falling back to the highest partner below it.
    fn last_staged(bodies: &[Body], k: usize, settings: &Settings) -> Vec2 {
        for j in ((k + 1)..bodies.len()).rev() {
            if let Some((vel_k, _)) = pair_update(bodies, k, j, settings) {
                return vel_k;
            }
        }
        for i in (0..k).rev() {
            if let Some((_, vel_k)) = pair_update(bodies, i, k, settings) {
                return vel_k;
            }
        }
        Vec2::ZERO
    }

    /// Each work item writes only its own pending slot
    pub(super) fn resolve_pairs(bodies: &[Body], pending: &mut [Vec2], settings: &Settings) {
        pending
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, slot)| *slot = last_staged(bodies, k, settings));
    }

    pub(super) fn integrate(bodies: &mut [Body], pending: &mut [Vec2], settings: &Settings) -> usize {
        bodies
            .par_iter_mut()
            .zip(pending.par_iter_mut())
            .map(|(body, slot)| integrate_body(body, slot, settings) as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ImpulseMode, SpeedClamp};
    use proptest::prelude::*;

    fn two_body_sim(mode: ImpulseMode) -> Simulation {
        let bodies = Bodies::from_bodies(vec![
            Body::new(Vec2::new(10.0, 10.0), Vec2::new(0.0, 1.0)),
            Body::new(Vec2::new(10.0, 11.0), Vec2::new(0.0, -1.0)),
        ]);
        let settings = Settings {
            impulse_mode: mode,
            ..Default::default()
        };
        Simulation::with_bodies(settings, bodies).unwrap()
    }

    #[test]
    fn test_head_on_pair_vector_mode() {
        let mut sim = two_body_sim(ImpulseMode::Vector);
        sim.step();
        let a = sim.bodies().get(0).unwrap();
        let b = sim.bodies().get(1).unwrap();
        // y-velocities reversed, x untouched
        assert_eq!(a.vel, Vec2::new(0.0, -0.5));
        assert_eq!(b.vel, Vec2::new(0.0, 0.5));
        assert_eq!(a.pos, Vec2::new(10.0, 9.5));
        assert_eq!(b.pos, Vec2::new(10.0, 11.5));
        assert_eq!(sim.last_stats().staged, 2);
        assert_eq!(sim.last_stats().pairs_tested, 1);
    }

    #[test]
    fn test_head_on_pair_scalar_mode() {
        let mut sim = two_body_sim(ImpulseMode::Scalar);
        sim.step();
        let a = sim.bodies().get(0).unwrap();
        let b = sim.bodies().get(1).unwrap();
        assert_eq!(a.vel, Vec2::new(-1.5, -0.5));
        assert_eq!(b.vel, Vec2::new(1.5, 0.5));
        assert!(a.vel.y < 0.0 && b.vel.y > 0.0);
    }

    #[test]
    fn test_pending_does_not_leak_into_next_step() {
        let mut sim = two_body_sim(ImpulseMode::Vector);
        sim.step();
        assert!((0..2).all(|i| sim.bodies().pending(i) == Some(Vec2::ZERO)));
        // Now 2 apart and separating: nothing staged, velocities kept
        sim.step();
        assert_eq!(sim.last_stats().staged, 0);
        assert_eq!(sim.bodies().get(0).unwrap().vel, Vec2::new(0.0, -0.5));
        assert_eq!(sim.bodies().get(1).unwrap().vel, Vec2::new(0.0, 0.5));
    }

    #[test]
    fn test_with_bodies_tracks_population() {
        let sim = two_body_sim(ImpulseMode::Vector);
        assert_eq!(sim.settings().population, 2);

        let err = Simulation::with_bodies(Settings::default(), Bodies::from_bodies(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "population", .. }));
    }

    #[test]
    fn test_get_position() {
        let sim = two_body_sim(ImpulseMode::Scalar);
        assert_eq!(sim.get_position(1), Some((10.0, 11.0)));
        assert_eq!(sim.get_position(2), None);
    }

    #[test]
    fn test_initialize_rejects_tiny_arena() {
        assert!(Simulation::initialize(10, 1.0).is_err());
        let sim = Simulation::initialize(10, 40.0).unwrap();
        assert_eq!(sim.bodies().len(), 10);
        assert!(sim.seed().is_some());
    }

    #[test]
    fn test_determinism() {
        let settings = Settings {
            seed: Some(12345),
            ..Default::default()
        };
        let mut sim1 = Simulation::new(settings.clone()).unwrap();
        let mut sim2 = Simulation::new(settings).unwrap();
        for _ in 0..500 {
            sim1.step();
            sim2.step();
        }
        assert_eq!(sim1.bodies(), sim2.bodies());
        assert_eq!(sim1.steps(), 500);
    }

    #[test]
    fn test_backends_agree() {
        for mode in [ImpulseMode::Scalar, ImpulseMode::Vector] {
            let base = Settings {
                seed: Some(777),
                population: 120,
                arena_size: 30.0,
                impulse_mode: mode,
                ..Default::default()
            };
            let mut seq = Simulation::new(base.clone()).unwrap();
            let mut par = Simulation::new(Settings {
                backend: Backend::Parallel,
                ..base
            })
            .unwrap();
            for _ in 0..200 {
                seq.step();
                par.step();
                assert_eq!(seq.last_stats(), par.last_stats());
            }
            assert_eq!(seq.bodies(), par.bodies());
        }
    }

    #[test]
    fn test_crowded_arena_stays_in_bounds() {
        let mut sim = Simulation::new(Settings {
            seed: Some(3),
            population: 200,
            arena_size: 20.0,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..300 {
            sim.step();
            for body in sim.bodies().iter() {
                assert!(body.pos.x >= 0.0 && body.pos.x <= 19.0);
                assert!(body.pos.y >= 0.0 && body.pos.y <= 19.0);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_bodies_stay_in_arena(
            seed in any::<u64>(),
            population in 1usize..60,
            arena_size in 2.0f32..120.0,
            steps in 1usize..150,
            vector in any::<bool>(),
        ) {
            let mut sim = Simulation::new(Settings {
                seed: Some(seed),
                population,
                arena_size,
                impulse_mode: if vector { ImpulseMode::Vector } else { ImpulseMode::Scalar },
                speed_clamp: SpeedClamp::Symmetric,
                ..Default::default()
            }).unwrap();
            let max_speed = sim.settings().max_speed;
            for _ in 0..steps {
                sim.step();
                for body in sim.bodies().iter() {
                    prop_assert!(body.pos.x >= 0.0 && body.pos.x <= arena_size - 1.0);
                    prop_assert!(body.pos.y >= 0.0 && body.pos.y <= arena_size - 1.0);
                    prop_assert!(body.vel.x.abs() <= max_speed);
                    prop_assert!(body.vel.y.abs() <= max_speed);
                }
            }
        }
    }
}
