use crate::camera::{Camera, CameraUniform};
use crate::clock::FrameLimiter;
use crate::config;
use crate::controls::ControlPanel;
use crate::initialize::{create_system, random_drags};
use crate::render::*;
use crate::simulation::{Command, SimulationState, Snapshot};
use crate::SimParams;
use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wgpu::util::DeviceExt;
use winit::event::ElementState;
use winit::keyboard::*;
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event::{Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
  window::Window,
};

pub struct RunOptions {
  pub config_path: PathBuf,
  pub reset_config: bool,
  pub headless: bool,
  /// Frames to run in headless mode.
  pub frames: u32,
  /// Random asteroids to launch in headless mode.
  pub asteroids: u32,
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str, params: &SimParams) -> anyhow::Result<Self> {
    let event_loop = EventLoop::new()?;
    let builder = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(LogicalSize::new(params.world_width, params.world_height))
      .with_resizable(false);
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: Option<wgpu::Surface<'static>>,
  config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
  fn new() -> Self {
    Self {
      surface: None,
      config: None,
    }
  }

  fn resume(&mut self, context: &State, window: Arc<Window>) -> anyhow::Result<()> {
    let window_size = window.inner_size();
    let width = window_size.width.max(1);
    let height = window_size.height.max(1);
    let surface = context.instance.create_surface(window)?;
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    self.surface = Some(surface);
    self.config = Some(config);
    Ok(())
  }

  fn resize(&mut self, context: &State, size: PhysicalSize<u32>) {
    if let (Some(surface), Some(config)) = (&self.surface, &mut self.config) {
      config.width = size.width.max(1);
      config.height = size.height.max(1);
      surface.configure(&context.device, config);
    }
  }

  fn acquire(&mut self, context: &State) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
    let (Some(surface), Some(config)) = (&self.surface, &self.config) else {
      return Err(wgpu::SurfaceError::Lost);
    };

    match surface.get_current_texture() {
      Ok(frame) => Ok(frame),
      Err(wgpu::SurfaceError::Timeout) => surface.get_current_texture(),
      Err(
        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory,
      ) => {
        surface.configure(&context.device, config);
        surface.get_current_texture()
      }
    }
  }

  fn config(&self) -> Option<&wgpu::SurfaceConfiguration> {
    self.config.as_ref()
  }
}

struct State {
  instance: wgpu::Instance,
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
  _camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_bind_group_layout: wgpu::BindGroupLayout,
  controls: ControlPanel,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.controls.process_events(event)
  }

  async fn init(
    surface: &SurfaceWrapper,
    size: PhysicalSize<u32>,
    params: &SimParams,
  ) -> anyhow::Result<Self> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: surface.surface.as_ref(),
        force_fallback_adapter: false,
      })
      .await
      .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await
      .context("requesting GPU device")?;

    // the world is a fixed screen-space square; the camera never moves
    let camera = Camera {
      width: params.world_width,
      height: params.world_height,
    };
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let controls = ControlPanel::init(params, size);

    Ok(Self {
      instance,
      adapter,
      device,
      queue,
      _camera_buffer: camera_buffer,
      camera_bind_group,
      camera_bind_group_layout,
      controls,
    })
  }
}

async fn start(mut simulation: SimulationState) -> anyhow::Result<()> {
  let params = simulation.params().clone();
  let EventLoopWrapper { event_loop, window } = EventLoopWrapper::new("Planetary System", &params)?;
  let mut surface = SurfaceWrapper::new();
  let mut context = State::init(&surface, window.inner_size(), &params).await?;
  let mut limiter = FrameLimiter::new(params.frames_per_second, Instant::now());
  let mut snapshot = simulation.snapshot();
  let mut title = context.controls.title();
  window.set_title(&title);
  let mut renderer: Option<Render> = None;
  let mut fatal: Option<anyhow::Error> = None;

  event_loop.run(|event, target: &EventLoopWindowTarget<()>| match event {
    Event::NewEvents(StartCause::Init) => {
      if let Err(err) = surface.resume(&context, window.clone()) {
        fatal = Some(err.context("configuring window surface"));
        target.exit();
        return;
      }
      if renderer.is_none() {
        if let Some(config) = surface.config() {
          renderer = Some(Render::init(
            config,
            &context.device,
            &context.camera_bind_group_layout,
          ));
        }
      }
      log::info!("window ready, running at {} fps", params.frames_per_second);
      target.set_control_flow(ControlFlow::WaitUntil(limiter.next_deadline()));
    }
    Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
      // step here, not on redraw, so the deadline moves even when the OS
      // withholds redraws from a hidden window
      if pump_frame(
        &mut limiter,
        &mut simulation,
        &mut context.controls,
        &mut snapshot,
        Instant::now(),
      ) {
        window.request_redraw();
      }
    }
    Event::AboutToWait => {
      target.set_control_flow(ControlFlow::WaitUntil(limiter.next_deadline()));
    }
    Event::WindowEvent { event, window_id } if window_id == window.id() => {
      if context.input(&event) {
        let next = context.controls.title();
        if next != title {
          window.set_title(&next);
          title = next;
        }
        return;
      }
      match event {
        WindowEvent::CloseRequested
        | WindowEvent::KeyboardInput {
          event:
            KeyEvent {
              state: ElementState::Pressed,
              physical_key: PhysicalKey::Code(KeyCode::Escape),
              ..
            },
          ..
        } => target.exit(),
        WindowEvent::Resized(size) => {
          context.controls.resize(size);
          surface.resize(&context, size);
        }
        WindowEvent::RedrawRequested => {
          let Some(renderer) = &mut renderer else {
            return;
          };
          let Some(view_format) = surface.config().map(|config| config.view_formats[0]) else {
            return;
          };
          match surface.acquire(&context) {
            Ok(frame) => {
              let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                format: Some(view_format),
                ..wgpu::TextureViewDescriptor::default()
              });
              renderer.upload(&context.device, &context.queue, &snapshot);
              renderer.render(
                &view,
                &context.device,
                &context.queue,
                &context.camera_bind_group,
              );
              frame.present();
            }
            Err(err) => log::warn!("dropping frame: {err}"),
          }
        }
        _ => {}
      }
    }
    _ => {}
  })?;

  match fatal {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

/// Steps the simulation if a frame is due at `now`; returns whether it did.
fn pump_frame(
  limiter: &mut FrameLimiter,
  simulation: &mut SimulationState,
  controls: &mut ControlPanel,
  snapshot: &mut Snapshot,
  now: Instant,
) -> bool {
  if !limiter.is_due(now) {
    return false;
  }
  let delta = limiter.tick(now);
  *snapshot = simulation.step(delta, controls.drain());
  true
}

/// Result of an unattended run.
#[derive(Debug)]
pub struct HeadlessSummary {
  pub frames: u32,
  pub snapshot: Snapshot,
}

/// Steps the simulation `frames` times at the nominal frame rate, feeding
/// every one of `drags` in, evenly spaced over the run. Stops early once `stop` is set.
pub fn run_headless(
  simulation: &mut SimulationState,
  frames: u32,
  drags: Vec<Command>,
  stop: &AtomicBool,
) -> HeadlessSummary {
  let frame_delta = Duration::from_secs_f64(1.0 / f64::from(simulation.params().frames_per_second.max(1)));
  // drag i launches on frame i * frames / len; several may share a frame
  let total = drags.len() as u64;
  let slot = |index: u64| index * u64::from(frames) / total.max(1);
  let mut drags = drags.into_iter().zip(0u64..).peekable();
  let mut snapshot = simulation.snapshot();
  let mut ran = 0;
  for frame in 0..frames {
    if stop.load(Ordering::Relaxed) {
      log::info!("interrupted after {frame} frames");
      break;
    }
    let mut commands = Vec::new();
    while let Some((command, _)) = drags.next_if(|(_, index)| slot(*index) <= u64::from(frame)) {
      commands.push(command);
    }
    snapshot = simulation.step(frame_delta, commands);
    ran += 1;
  }
  HeadlessSummary {
    frames: ran,
    snapshot,
  }
}

fn log_summary(summary: &HeadlessSummary) {
  let snapshot = &summary.snapshot;
  log::info!(
    "ran {} frames ({:.1} s simulated)",
    summary.frames,
    snapshot.elapsed_ms / 1000.0
  );
  log::info!("sun mass: {}", snapshot.sun_mass);
  for planet in &snapshot.planets {
    log::info!(
      "{}: density {:.2} at ({:.1}, {:.1})",
      planet.name,
      planet.density,
      planet.circle.center.x,
      planet.circle.center.y
    );
  }
  log::info!("asteroids still flying: {}", snapshot.asteroids.len());
}

pub fn run(options: &RunOptions) -> anyhow::Result<()> {
  env_logger::init();
  config::ensure_config(&options.config_path, options.reset_config)?;
  let system = config::load(&options.config_path)?;
  let params = SimParams::default();
  let mut simulation = create_system(&system, &params);

  if options.headless {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))
      .context("installing Ctrl-C handler")?;
    let drags = random_drags(options.asteroids, &params, 42);
    log::info!(
      "running headless for {} frames with {} asteroids",
      options.frames,
      options.asteroids
    );
    let summary = run_headless(&mut simulation, options.frames, drags, &stop);
    log_summary(&summary);
    return Ok(());
  }

  pollster::block_on(start(simulation))
}
