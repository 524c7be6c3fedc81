use crate::config::SystemConfig;
use crate::simulation::{Command, Planet, SimulationState, Sun};
use crate::SimParams;
use cgmath::{Point2, Vector2};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::f32::consts::PI;

#[must_use]
pub fn create_system(config: &SystemConfig, params: &SimParams) -> SimulationState {
  let center = Point2::new(params.sun_position[0], params.sun_position[1]);
  let sun = Sun {
    position: center,
    radius: params.sun_radius,
    mass: config.sun.mass,
  };
  let planets = config
    .planets
    .iter()
    .map(|p| {
      Planet::new(
        p.name.clone(),
        p.density,
        p.orbit_radius,
        p.speed,
        params.planet_radius,
        center,
      )
    })
    .collect();
  SimulationState::new(sun, planets, params.clone())
}

/// Builds `count` drags that start on a ring just inside the world edge and
/// point roughly at the sun, for unattended runs.
#[must_use]
pub fn random_drags(count: u32, params: &SimParams, seed: u64) -> Vec<Command> {
  let mut rng = SmallRng::seed_from_u64(seed);
  let center = Point2::new(params.sun_position[0], params.sun_position[1]);
  let ring = 0.45 * params.world_width.min(params.world_height);
  let mut commands = Vec::with_capacity(count as usize);
  for _ in 0..count {
    // based on unit circle
    let theta = rng.gen::<f32>() * 2.0 * PI;
    let from = center + Vector2::new(theta.cos(), theta.sin()) * ring;
    // aim somewhere across the inner system so some miss and some hit
    let spread = Vector2::new(
      rng.gen::<f32>() * 2.0 - 1.0,
      rng.gen::<f32>() * 2.0 - 1.0,
    ) * (ring * 0.25);
    let to = center + spread;
    commands.push(Command::SpawnAsteroid { from, to });
  }
  commands
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::default_config;
  use cgmath::MetricSpace;

  #[test]
  fn system_follows_config_order() {
    let params = SimParams::default();
    let sim = create_system(&default_config(), &params);
    let names: Vec<_> = sim.planets().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
      names,
      ["planet_1", "planet_2", "planet_3", "planet_4", "planet_5", "planet_6", "planet_7"]
    );
    assert_eq!(sim.sun().mass, 999.0);
    assert_eq!(sim.sun().radius, params.sun_radius);
    assert!(sim.asteroids().is_empty());
    assert!(!sim.paused());
  }

  #[test]
  fn random_drags_are_reproducible_and_start_on_the_ring() {
    let params = SimParams::default();
    let a = random_drags(16, &params, 42);
    let b = random_drags(16, &params, 42);
    assert_eq!(a, b);
    let center = Point2::new(400.0, 400.0);
    for command in a {
      let Command::SpawnAsteroid { from, to } = command else {
        panic!("unexpected command {command:?}");
      };
      assert!((from.distance(center) - 360.0).abs() < 1e-2);
      assert!(to.distance(center) < 360.0);
    }
  }
}
