use crate::SimParams;
use cgmath::{InnerSpace, MetricSpace, Point2, Vector2};
use std::time::Duration;

pub type Rgb = [u8; 3];

pub const SUN_COLOR: Rgb = [255, 255, 0];
pub const ASTEROID_COLOR: Rgb = [255, 0, 0];

/// Maps a density onto a blue (empty) to red (`max_density`) ramp.
pub fn calculate_color(density: f32, max_density: f32) -> Rgb {
  let ratio = if max_density > 0.0 {
    density / max_density
  } else {
    1.0
  };
  // NaN saturates to 0 on the cast
  let value = (255.0 * ratio).clamp(0.0, 255.0) as u8;
  [value, 0, 255 - value]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sun {
  pub position: Point2<f32>,
  pub radius: f32,
  pub mass: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Planet {
  pub name: String,
  pub density: f32,
  pub radius: f32,
  orbit_radius: f32,
  angular_speed: f32,
  position: Point2<f32>,
}

impl Planet {
  /// Starts the planet at angle zero, i.e. `orbit_radius` to the right of `center`.
  pub fn new(
    name: String,
    density: f32,
    orbit_radius: f32,
    angular_speed: f32,
    radius: f32,
    center: Point2<f32>,
  ) -> Self {
    Self {
      name,
      density,
      radius,
      orbit_radius,
      angular_speed,
      position: Point2::new(center.x + orbit_radius, center.y),
    }
  }

  pub fn orbit_radius(&self) -> f32 {
    self.orbit_radius
  }

  pub fn angular_speed(&self) -> f32 {
    self.angular_speed
  }

  pub fn position(&self) -> Point2<f32> {
    self.position
  }

  /// Closed-form position after `elapsed_ms` of unpaused time.
  pub fn position_at(&self, center: Point2<f32>, elapsed_ms: f64, angle_divisor: f32) -> Point2<f32> {
    let angle = elapsed_ms * f64::from(self.angular_speed) / f64::from(angle_divisor);
    let radius = f64::from(self.orbit_radius);
    Point2::new(
      center.x + (radius * angle.cos()) as f32,
      center.y + (radius * angle.sin()) as f32,
    )
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Asteroid {
  pub position: Point2<f32>,
  pub velocity: Vector2<f32>,
  pub speed: f32,
  pub mass: f32,
}

impl Asteroid {
  fn advance(&mut self) {
    self.position += self.velocity;
  }
}

/// Input for one frame, queued by the window layer and applied at the start of
/// the next step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
  TogglePause,
  SetAsteroidMass(f32),
  SetAsteroidSpeed(f32),
  /// Drag from the press point `from` to the release point `to`.
  SpawnAsteroid { from: Point2<f32>, to: Point2<f32> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Body {
  Sun,
  Planet(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
  pub center: Point2<f32>,
  pub radius: f32,
  pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlanetView {
  pub name: String,
  pub density: f32,
  pub circle: Circle,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
  pub sun: Circle,
  pub sun_mass: f32,
  pub planets: Vec<PlanetView>,
  pub asteroids: Vec<Circle>,
  pub paused: bool,
  pub elapsed_ms: f64,
}

pub struct SimulationState {
  params: SimParams,
  sun: Sun,
  planets: Vec<Planet>,
  asteroids: Vec<Asteroid>,
  paused: bool,
  elapsed_ms: f64,
  asteroid_mass: f32,
  asteroid_speed: f32,
}

impl SimulationState {
  pub fn new(sun: Sun, planets: Vec<Planet>, params: SimParams) -> Self {
    let asteroid_mass = params.default_mass as f32;
    let asteroid_speed = params.default_speed as f32;
    let mut state = Self {
      params,
      sun,
      planets,
      asteroids: Vec::new(),
      paused: false,
      elapsed_ms: 0.0,
      asteroid_mass,
      asteroid_speed,
    };
    state.update_planets();
    state
  }

  pub fn params(&self) -> &SimParams {
    &self.params
  }

  pub fn sun(&self) -> &Sun {
    &self.sun
  }

  pub fn planets(&self) -> &[Planet] {
    &self.planets
  }

  pub fn asteroids(&self) -> &[Asteroid] {
    &self.asteroids
  }

  pub fn paused(&self) -> bool {
    self.paused
  }

  /// Unpaused time accumulated so far, in milliseconds.
  pub fn elapsed_ms(&self) -> f64 {
    self.elapsed_ms
  }

  pub fn asteroid_mass(&self) -> f32 {
    self.asteroid_mass
  }

  pub fn asteroid_speed(&self) -> f32 {
    self.asteroid_speed
  }

  /// Runs one frame: applies `commands` in order, then (unless paused) moves
  /// the clock, the planets and the asteroids and resolves collisions.
  pub fn step(
    &mut self,
    frame_delta: Duration,
    commands: impl IntoIterator<Item = Command>,
  ) -> Snapshot {
    for command in commands {
      self.apply(command);
    }
    if !self.paused {
      self.advance(frame_delta);
    }
    self.snapshot()
  }

  pub fn apply(&mut self, command: Command) {
    match command {
      Command::TogglePause => {
        self.paused = !self.paused;
        log::info!(
          "simulation {} at {:.0} ms",
          if self.paused { "paused" } else { "resumed" },
          self.elapsed_ms
        );
      }
      Command::SetAsteroidMass(mass) => {
        if mass.is_finite() && mass > 0.0 {
          self.asteroid_mass = mass;
        } else {
          log::warn!("ignoring asteroid mass {mass}");
        }
      }
      Command::SetAsteroidSpeed(speed) => {
        if speed.is_finite() && speed > 0.0 {
          self.asteroid_speed = speed;
        } else {
          log::warn!("ignoring asteroid speed {speed}");
        }
      }
      Command::SpawnAsteroid { from, to } => {
        self.spawn_asteroid(from, to);
      }
    }
  }

  /// Creates an asteroid at `from` heading towards `to` with the current mass
  /// and speed. Returns false when nothing was created: the simulation is
  /// paused or the drag has no length.
  pub fn spawn_asteroid(&mut self, from: Point2<f32>, to: Point2<f32>) -> bool {
    if self.paused {
      log::debug!("discarding drag {from:?} -> {to:?} while paused");
      return false;
    }
    let drag = to - from;
    let length = drag.magnitude();
    if !length.is_finite() || length <= f32::EPSILON {
      log::debug!("discarding zero-length drag at {from:?}");
      return false;
    }
    let direction = drag / length;
    let asteroid = Asteroid {
      position: from,
      velocity: direction * self.asteroid_speed,
      speed: self.asteroid_speed,
      mass: self.asteroid_mass,
    };
    log::debug!(
      "spawned asteroid at {:?} heading {:?} (mass {}, speed {})",
      from,
      direction,
      asteroid.mass,
      asteroid.speed
    );
    self.asteroids.push(asteroid);
    true
  }

  fn advance(&mut self, frame_delta: Duration) {
    self.elapsed_ms += frame_delta.as_secs_f64() * 1000.0;
    self.update_planets();

    let sun = &self.sun;
    let planets = &self.planets;
    let mut hits = Vec::new();
    for (index, asteroid) in self.asteroids.iter_mut().enumerate() {
      asteroid.advance();
      if let Some(body) = find_collision(asteroid.position, sun, planets) {
        hits.push((index, body));
      }
    }
    if hits.is_empty() {
      return;
    }

    let mut destroyed = vec![false; self.asteroids.len()];
    for (index, body) in hits {
      let mass = self.asteroids[index].mass;
      match body {
        Body::Sun => {
          self.sun.mass += mass;
          log::debug!("asteroid absorbed by the sun, mass now {}", self.sun.mass);
        }
        Body::Planet(i) => {
          let planet = &mut self.planets[i];
          planet.density += mass * self.params.density_per_mass;
          log::debug!("asteroid hit {}, density now {}", planet.name, planet.density);
        }
      }
      destroyed[index] = true;
    }
    let mut flags = destroyed.into_iter();
    self.asteroids.retain(|_| !flags.next().unwrap_or(false));
  }

  fn update_planets(&mut self) {
    let center = self.sun.position;
    for planet in &mut self.planets {
      planet.position = planet.position_at(center, self.elapsed_ms, self.params.angle_divisor);
    }
  }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      sun: Circle {
        center: self.sun.position,
        radius: self.sun.radius,
        color: SUN_COLOR,
      },
      sun_mass: self.sun.mass,
      planets: self
        .planets
        .iter()
        .map(|planet| PlanetView {
          name: planet.name.clone(),
          density: planet.density,
          circle: Circle {
            center: planet.position,
            radius: planet.radius,
            color: calculate_color(planet.density, self.params.max_density),
          },
        })
        .collect(),
      asteroids: self
        .asteroids
        .iter()
        .map(|asteroid| Circle {
          center: asteroid.position,
          radius: self.params.asteroid_radius,
          color: ASTEROID_COLOR,
        })
        .collect(),
      paused: self.paused,
      elapsed_ms: self.elapsed_ms,
    }
  }
}

// sun first, then planets in config order
fn find_collision(position: Point2<f32>, sun: &Sun, planets: &[Planet]) -> Option<Body> {
  if position.distance(sun.position) < sun.radius {
    return Some(Body::Sun);
  }
  planets
    .iter()
    .position(|planet| position.distance(planet.position) < planet.radius)
    .map(Body::Planet)
}

#[cfg(test)]
mod tests {
  use super::*;

  const FRAME: Duration = Duration::from_millis(16);

  fn sim_with(planets: Vec<(f32, f32)>) -> SimulationState {
    let params = SimParams::default();
    let center = Point2::new(params.sun_position[0], params.sun_position[1]);
    let sun = Sun {
      position: center,
      radius: params.sun_radius,
      mass: 999.0,
    };
    let planets = planets
      .into_iter()
      .enumerate()
      .map(|(i, (orbit_radius, speed))| {
        Planet::new(
          format!("p{i}"),
          1.0,
          orbit_radius,
          speed,
          params.planet_radius,
          center,
        )
      })
      .collect();
    SimulationState::new(sun, planets, params)
  }

  #[test]
  fn color_endpoints_and_clamping() {
    assert_eq!(calculate_color(0.0, 10.5), [0, 0, 255]);
    assert_eq!(calculate_color(10.5, 10.5), [255, 0, 0]);
    assert_eq!(calculate_color(500.0, 10.5), [255, 0, 0]);
    assert_eq!(calculate_color(-3.0, 10.5), [0, 0, 255]);
    let [r, g, b] = calculate_color(5.25, 10.5);
    assert_eq!(r, 127);
    assert_eq!(g, 0);
    assert_eq!(b, 128);
  }

  #[test]
  fn color_channels_always_sum_to_full_scale() {
    for step in 0..200 {
      let [r, _, b] = calculate_color(step as f32 * 0.1, 10.5);
      assert_eq!(u16::from(r) + u16::from(b), 255);
    }
  }

  #[test]
  fn planets_stay_on_their_orbit() {
    let mut sim = sim_with(vec![(50.0, 3.123), (230.0, 9.192)]);
    for _ in 0..500 {
      sim.step(FRAME, []);
      for planet in sim.planets() {
        let distance = planet.position().distance(sim.sun().position);
        assert!((distance - planet.orbit_radius()).abs() < 1e-3);
      }
    }
  }

  #[test]
  fn planet_starts_at_angle_zero() {
    let sim = sim_with(vec![(80.0, 4.312)]);
    let p = sim.planets()[0].position();
    assert!((p.x - 480.0).abs() < 1e-4);
    assert!((p.y - 400.0).abs() < 1e-4);
  }

  #[test]
  fn asteroid_moves_in_a_straight_line() {
    let mut sim = sim_with(vec![]);
    assert!(sim.spawn_asteroid(Point2::new(10.0, 10.0), Point2::new(13.0, 14.0)));
    for _ in 0..10 {
      sim.step(FRAME, []);
    }
    // direction (0.6, 0.8) at the default speed of 5
    let a = &sim.asteroids()[0];
    assert!((a.position.x - 40.0).abs() < 1e-3);
    assert!((a.position.y - 50.0).abs() < 1e-3);
  }

  #[test]
  fn zero_length_drag_spawns_nothing() {
    let mut sim = sim_with(vec![]);
    let p = Point2::new(100.0, 100.0);
    let snapshot = sim.step(FRAME, [Command::SpawnAsteroid { from: p, to: p }]);
    assert!(snapshot.asteroids.is_empty());
  }

  #[test]
  fn spawn_snapshots_current_mass_and_speed() {
    let mut sim = sim_with(vec![]);
    sim.step(
      FRAME,
      [
        Command::SetAsteroidMass(42.0),
        Command::SetAsteroidSpeed(7.0),
        Command::SpawnAsteroid {
          from: Point2::new(0.0, 0.0),
          to: Point2::new(0.0, 1.0),
        },
        Command::SetAsteroidMass(1.0),
      ],
    );
    let a = &sim.asteroids()[0];
    assert_eq!(a.mass, 42.0);
    assert_eq!(a.speed, 7.0);
    assert_eq!(sim.asteroid_mass(), 1.0);
  }

  #[test]
  fn invalid_slider_values_are_ignored() {
    let mut sim = sim_with(vec![]);
    sim.apply(Command::SetAsteroidMass(0.0));
    sim.apply(Command::SetAsteroidSpeed(f32::NAN));
    assert_eq!(sim.asteroid_mass(), 10.0);
    assert_eq!(sim.asteroid_speed(), 5.0);
  }

  #[test]
  fn sun_hit_wins_over_planet_in_the_same_frame() {
    // orbit radius zero parks the planet on the sun's center
    let mut sim = sim_with(vec![(0.0, 1.0)]);
    sim.spawn_asteroid(Point2::new(395.0, 400.0), Point2::new(396.0, 400.0));
    sim.step(FRAME, []);
    assert!(sim.asteroids().is_empty());
    assert_eq!(sim.sun().mass, 999.0 + 10.0);
    assert_eq!(sim.planets()[0].density, 1.0);
  }

  #[test]
  fn planet_hit_adds_scaled_density() {
    let mut sim = sim_with(vec![(100.0, 0.0)]);
    // planet sits still at (500, 400)
    sim.spawn_asteroid(Point2::new(500.0, 350.0), Point2::new(500.0, 351.0));
    let mut frames = 0;
    while !sim.asteroids().is_empty() && frames < 100 {
      sim.step(FRAME, []);
      frames += 1;
    }
    assert!(sim.asteroids().is_empty());
    assert_eq!(sim.sun().mass, 999.0);
    assert!((sim.planets()[0].density - 2.0).abs() < 1e-6);
  }

  #[test]
  fn every_asteroid_is_checked_when_neighbours_are_removed() {
    let mut sim = sim_with(vec![]);
    // two asteroids that reach the sun this frame, one far away in between
    sim.apply(Command::SetAsteroidSpeed(1.0));
    sim.spawn_asteroid(Point2::new(400.0, 371.0), Point2::new(400.0, 372.0));
    sim.spawn_asteroid(Point2::new(10.0, 10.0), Point2::new(11.0, 10.0));
    sim.spawn_asteroid(Point2::new(371.0, 400.0), Point2::new(372.0, 400.0));
    sim.step(FRAME, []);
    assert_eq!(sim.asteroids().len(), 1);
    assert!((sim.asteroids()[0].position.x - 11.0).abs() < 1e-6);
    assert_eq!(sim.sun().mass, 999.0 + 20.0);
  }

  #[test]
  fn pause_freezes_and_resume_is_continuous() {
    let mut reference = sim_with(vec![(50.0, 3.123), (170.0, 7.912)]);
    let mut paused = sim_with(vec![(50.0, 3.123), (170.0, 7.912)]);
    for sim in [&mut reference, &mut paused] {
      sim.spawn_asteroid(Point2::new(10.0, 10.0), Point2::new(10.0, 20.0));
    }

    for _ in 0..10 {
      reference.step(FRAME, []);
    }

    for _ in 0..5 {
      paused.step(FRAME, []);
    }
    let frozen = paused.step(FRAME, [Command::TogglePause]);
    assert!(frozen.paused);
    for _ in 0..20 {
      let snapshot = paused.step(FRAME, []);
      assert_eq!(snapshot, frozen);
    }
    paused.step(FRAME, [Command::TogglePause]);
    for _ in 0..4 {
      paused.step(FRAME, []);
    }

    assert_eq!(paused.snapshot().elapsed_ms, reference.snapshot().elapsed_ms);
    assert_eq!(paused.snapshot().planets, reference.snapshot().planets);
    assert_eq!(paused.snapshot().asteroids, reference.snapshot().asteroids);
  }

  #[test]
  fn spawning_is_discarded_while_paused() {
    let mut sim = sim_with(vec![]);
    let snapshot = sim.step(
      FRAME,
      [
        Command::TogglePause,
        Command::SpawnAsteroid {
          from: Point2::new(0.0, 0.0),
          to: Point2::new(1.0, 0.0),
        },
      ],
    );
    assert!(snapshot.asteroids.is_empty());
    assert_eq!(snapshot.elapsed_ms, 0.0);
  }
}
