use crate::simulation::{Circle, Rgb, Snapshot};
use crate::CircleInstance;
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

const INITIAL_CAPACITY: usize = 64;

#[rustfmt::skip]
const QUAD: [[f32; 2]; 6] = [
  [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0],
  [-1.0, -1.0], [1.0, 1.0], [-1.0, 1.0],
];

/// The surface view is sRGB, so colors go to the GPU in linear space.
fn srgb_to_linear(channel: u8) -> f32 {
  let c = f32::from(channel) / 255.0;
  if c <= 0.04045 {
    c / 12.92
  } else {
    ((c + 0.055) / 1.055).powf(2.4)
  }
}

fn linear_color(color: Rgb) -> [f32; 3] {
  color.map(srgb_to_linear)
}

fn instance(circle: &Circle) -> CircleInstance {
  CircleInstance {
    center: [circle.center.x, circle.center.y],
    radius: circle.radius,
    color: linear_color(circle.color),
  }
}

/// Draw list for a frame: sun, then planets, then asteroids on top.
pub fn instances(snapshot: &Snapshot) -> Vec<CircleInstance> {
  let mut out = Vec::with_capacity(1 + snapshot.planets.len() + snapshot.asteroids.len());
  out.push(instance(&snapshot.sun));
  out.extend(snapshot.planets.iter().map(|p| instance(&p.circle)));
  out.extend(snapshot.asteroids.iter().map(instance));
  out
}

pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  quad_buffer: wgpu::Buffer,
  instance_buffer: wgpu::Buffer,
  instance_capacity: usize,
  instance_count: u32,
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
  device.create_buffer(&wgpu::BufferDescriptor {
    label: Some("Circle Instance Buffer"),
    size: (capacity * std::mem::size_of::<CircleInstance>()) as wgpu::BufferAddress,
    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    mapped_at_creation: false,
  })
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("circle shader"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/circle.wgsl"))),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[camera_bind_group_layout],
      push_constant_ranges: &[],
    });
    let quad_layout = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![0 => Float32x2],
    };
    let instance_layout = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<CircleInstance>() as wgpu::BufferAddress, // center2 + radius + color3
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32, 3 => Float32x3],
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[quad_layout, instance_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(config.view_formats[0].into())],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Vertex Buffer"),
      contents: bytemuck::cast_slice(&QUAD),
      usage: wgpu::BufferUsages::VERTEX,
    });

    Render {
      render_pipeline,
      quad_buffer,
      instance_buffer: create_instance_buffer(device, INITIAL_CAPACITY),
      instance_capacity: INITIAL_CAPACITY,
      instance_count: 0,
    }
  }

  /// Copies the frame's circles into the instance buffer, growing it when the
  /// asteroid count outgrows the current allocation.
  pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, snapshot: &Snapshot) {
    let data = instances(snapshot);
    if data.len() > self.instance_capacity {
      self.instance_capacity = data.len().next_power_of_two();
      self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
      log::debug!("instance buffer grown to {} circles", self.instance_capacity);
    }
    queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&data));
    self.instance_count = data.len() as u32;
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, camera_bind_group, &[]);
      rpass.set_vertex_buffer(0, self.quad_buffer.slice(..));
      rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
      rpass.draw(0..QUAD.len() as u32, 0..self.instance_count);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
