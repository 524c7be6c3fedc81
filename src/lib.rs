pub mod camera;
pub mod clock;
pub mod config;
pub mod controls;
pub mod initialize;
pub mod render;
pub mod simulation;
pub mod state;

use std::ops::RangeInclusive;

#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
  pub world_width: f32,
  pub world_height: f32,
  pub sun_position: [f32; 2],
  pub sun_radius: f32,
  pub planet_radius: f32,
  pub asteroid_radius: f32,
  /// Divides `elapsed_ms * speed` to get the orbital angle in radians.
  pub angle_divisor: f32,
  /// Density that maps to a fully red planet.
  pub max_density: f32,
  /// Planet density gained per unit of absorbed asteroid mass.
  pub density_per_mass: f32,
  pub mass_range: RangeInclusive<u32>,
  pub speed_range: RangeInclusive<u32>,
  pub default_mass: u32,
  pub default_speed: u32,
  pub frames_per_second: u32,
}

impl Default for SimParams {
  fn default() -> Self {
    Self {
      world_width: 800.0,
      world_height: 800.0,
      sun_position: [400.0, 400.0],
      sun_radius: 30.0,
      planet_radius: 10.0,
      asteroid_radius: 5.0,
      angle_divisor: 1400.0,
      max_density: 10.5,
      density_per_mass: 0.1,
      mass_range: 1..=100,
      speed_range: 1..=20,
      default_mass: 10,
      default_speed: 5,
      frames_per_second: 60,
    }
  }
}

/// One filled circle as uploaded to the GPU instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CircleInstance {
  pub center: [f32; 2],
  pub radius: f32,
  pub color: [f32; 3],
}
