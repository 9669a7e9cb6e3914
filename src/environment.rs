//! Sun placement and environment-map lifecycle.
//!
//! The environment map is the pre-filtered cubemap used as ambient light. It
//! is derived from the sky state, so every sun move releases the previous map
//! before a new one is baked, keeping a single live map.

use anyhow::{Context, Result};
use glam::Vec3;
use log::debug;

use crate::params::{Parameters, SkyUniforms, WaterUniforms};
use crate::sun::sun_direction_for;

/// Opaque handle to a baked environment map owned by a baker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentMap {
    pub id: u64,
}

/// Produces and releases pre-filtered environment maps from the sky state.
pub trait EnvironmentBaker {
    fn bake(&mut self, sky: &SkyUniforms) -> Result<EnvironmentMap>;
    fn release(&mut self, map: EnvironmentMap);
}

/// Baker that only hands out handles. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullBaker {
    next_id: u64,
}

impl EnvironmentBaker for NullBaker {
    fn bake(&mut self, _sky: &SkyUniforms) -> Result<EnvironmentMap> {
        self.next_id += 1;
        Ok(EnvironmentMap { id: self.next_id })
    }

    fn release(&mut self, _map: EnvironmentMap) {}
}

/// Holds the current sun and the active environment map.
#[derive(Debug, Default)]
pub struct Environment {
    sun: Vec3,
    active: Option<EnvironmentMap>,
    generation: u64,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the sun, pushes it into the sky and water state, and
    /// replaces the environment map.
    pub fn update_sun(
        &mut self,
        params: &Parameters,
        sky: &mut SkyUniforms,
        water: &mut WaterUniforms,
        baker: &mut dyn EnvironmentBaker,
    ) -> Result<()> {
        self.sun = sun_direction_for(params);

        sky.sun_position = self.sun;
        water.sun_direction = self.sun.normalize_or_zero();

        if let Some(previous) = self.active.take() {
            baker.release(previous);
        }
        let map = baker
            .bake(sky)
            .context("failed to bake environment map")?;
        self.active = Some(map);
        self.generation += 1;
        debug!(
            "sun at ({:.4}, {:.4}, {:.4}), environment map #{}",
            self.sun.x, self.sun.y, self.sun.z, map.id
        );
        Ok(())
    }

    pub fn sun(&self) -> Vec3 {
        self.sun
    }

    /// Map currently used as the ambient lighting source.
    pub fn active_map(&self) -> Option<EnvironmentMap> {
        self.active
    }

    /// Number of maps baked so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use anyhow::anyhow;

    use super::*;

    #[derive(Default)]
    struct CountingBaker {
        next_id: u64,
        live: HashSet<u64>,
        releases: Vec<u64>,
        fail_next: bool,
    }

    impl EnvironmentBaker for CountingBaker {
        fn bake(&mut self, _sky: &SkyUniforms) -> Result<EnvironmentMap> {
            if self.fail_next {
                return Err(anyhow!("device lost"));
            }
            self.next_id += 1;
            self.live.insert(self.next_id);
            Ok(EnvironmentMap { id: self.next_id })
        }

        fn release(&mut self, map: EnvironmentMap) {
            assert!(self.live.remove(&map.id), "released unknown map {map:?}");
            self.releases.push(map.id);
        }
    }

    fn run(env: &mut Environment, params: &Parameters, baker: &mut CountingBaker) -> Result<()> {
        let mut sky = SkyUniforms::default();
        let mut water = WaterUniforms::default();
        env.update_sun(params, &mut sky, &mut water, baker)
    }

    #[test]
    fn first_update_releases_nothing() {
        let mut env = Environment::new();
        let mut baker = CountingBaker::default();
        run(&mut env, &Parameters::default(), &mut baker).unwrap();
        assert!(baker.releases.is_empty());
        assert_eq!(baker.live.len(), 1);
        assert_eq!(env.active_map(), Some(EnvironmentMap { id: 1 }));
    }

    #[test]
    fn second_update_releases_exactly_the_stale_map() {
        let mut env = Environment::new();
        let mut baker = CountingBaker::default();
        let params = Parameters::default();
        run(&mut env, &params, &mut baker).unwrap();
        run(&mut env, &params, &mut baker).unwrap();
        assert_eq!(baker.releases, vec![1]);
        assert_eq!(baker.live.len(), 1);
        assert_eq!(env.active_map(), Some(EnvironmentMap { id: 2 }));
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let mut env = Environment::new();
        let mut baker = CountingBaker::default();
        let params = Parameters::default();
        run(&mut env, &params, &mut baker).unwrap();
        let first = env.sun();
        for _ in 0..10 {
            run(&mut env, &params, &mut baker).unwrap();
            assert_eq!(env.sun(), first);
            assert_eq!(baker.live.len(), 1);
        }
        assert_eq!(env.generation(), 11);
    }

    #[test]
    fn sun_is_pushed_into_sky_and_water() {
        let mut env = Environment::new();
        let mut baker = CountingBaker::default();
        let mut sky = SkyUniforms::default();
        let mut water = WaterUniforms::default();
        let params = Parameters {
            elevation: 30.0,
            azimuth: 45.0,
            ..Parameters::default()
        };
        env.update_sun(&params, &mut sky, &mut water, &mut baker)
            .unwrap();
        assert_eq!(sky.sun_position, env.sun());
        assert!((water.sun_direction.length() - 1.0).abs() < 1e-6);
        assert!((sky.sun_position.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn failed_bake_leaves_no_stale_map_active() {
        let mut env = Environment::new();
        let mut baker = CountingBaker::default();
        let params = Parameters::default();
        run(&mut env, &params, &mut baker).unwrap();
        baker.fail_next = true;
        assert!(run(&mut env, &params, &mut baker).is_err());
        assert_eq!(env.active_map(), None);
        assert!(baker.live.is_empty());
    }
}
