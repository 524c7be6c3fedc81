use crate::simulation::Command;
use crate::SimParams;
use cgmath::Point2;
use std::ops::RangeInclusive;
use winit::{
  dpi::PhysicalSize,
  event::{ElementState, KeyEvent, MouseButton, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

/// A bounded integer setting, the keyboard stand-in for a slider widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slider {
  range: RangeInclusive<u32>,
  value: u32,
}

impl Slider {
  pub fn new(range: RangeInclusive<u32>, value: u32) -> Self {
    let value = value.clamp(*range.start(), *range.end());
    Self { range, value }
  }

  pub fn value(&self) -> u32 {
    self.value
  }

  /// Moves the slider by `delta` steps; returns true if the value changed.
  pub fn nudge(&mut self, delta: i64) -> bool {
    let next = (i64::from(self.value) + delta)
      .clamp(i64::from(*self.range.start()), i64::from(*self.range.end())) as u32;
    let changed = next != self.value;
    self.value = next;
    changed
  }
}

/// Turns window input into simulation commands and keeps the slider state.
pub struct ControlPanel {
  mass: Slider,
  speed: Slider,
  paused: bool,
  world_size: [f32; 2],
  window_size: PhysicalSize<u32>,
  cursor: Option<Point2<f32>>,
  drag_start: Option<Point2<f32>>,
  queue: Vec<Command>,
}

impl ControlPanel {
  pub fn init(params: &SimParams, window_size: PhysicalSize<u32>) -> Self {
    Self {
      mass: Slider::new(params.mass_range.clone(), params.default_mass),
      speed: Slider::new(params.speed_range.clone(), params.default_speed),
      paused: false,
      world_size: [params.world_width, params.world_height],
      window_size,
      cursor: None,
      drag_start: None,
      queue: Vec::new(),
    }
  }

  pub fn mass(&self) -> &Slider {
    &self.mass
  }

  pub fn speed(&self) -> &Slider {
    &self.speed
  }

  pub fn title(&self) -> String {
    format!(
      "Planetary System{} | asteroid mass {} | asteroid speed {}",
      if self.paused { " (paused)" } else { "" },
      self.mass.value(),
      self.speed.value()
    )
  }

  /// Commands gathered since the last call, in arrival order.
  pub fn drain(&mut self) -> Vec<Command> {
    std::mem::take(&mut self.queue)
  }

  pub fn resize(&mut self, window_size: PhysicalSize<u32>) {
    self.window_size = window_size;
  }

  pub fn toggle_pause(&mut self) {
    self.paused = !self.paused;
    self.queue.push(Command::TogglePause);
  }

  pub fn nudge_mass(&mut self, delta: i64) {
    if self.mass.nudge(delta) {
      self
        .queue
        .push(Command::SetAsteroidMass(self.mass.value() as f32));
    }
  }

  pub fn nudge_speed(&mut self, delta: i64) {
    if self.speed.nudge(delta) {
      self
        .queue
        .push(Command::SetAsteroidSpeed(self.speed.value() as f32));
    }
  }

  pub fn press(&mut self, at: Point2<f32>) {
    self.drag_start = Some(at);
  }

  pub fn release(&mut self, at: Point2<f32>) {
    if let Some(from) = self.drag_start.take() {
      self.queue.push(Command::SpawnAsteroid { from, to: at });
    }
  }

  /// Window pixels to world coordinates.
  pub fn to_world(&self, x: f64, y: f64) -> Point2<f32> {
    let width = self.window_size.width.max(1) as f32;
    let height = self.window_size.height.max(1) as f32;
    Point2::new(
      x as f32 * self.world_size[0] / width,
      y as f32 * self.world_size[1] / height,
    )
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::CursorMoved { position, .. } => {
        self.cursor = Some(self.to_world(position.x, position.y));
        true
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        if let Some(cursor) = self.cursor {
          match state {
            ElementState::Pressed => self.press(cursor),
            ElementState::Released => self.release(cursor),
          }
        }
        true
      }
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(keycode),
            repeat,
            ..
          },
        ..
      } => match keycode {
        KeyCode::Space | KeyCode::KeyP if !repeat => {
          self.toggle_pause();
          true
        }
        KeyCode::ArrowRight => {
          self.nudge_mass(1);
          true
        }
        KeyCode::ArrowLeft => {
          self.nudge_mass(-1);
          true
        }
        KeyCode::ArrowUp => {
          self.nudge_speed(1);
          true
        }
        KeyCode::ArrowDown => {
          self.nudge_speed(-1);
          true
        }
        _ => false,
      },
      _ => false,
    }
  }
}
