use cgmath::SquareMatrix;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Screen-space camera: world units are pixels of a `width` x `height` view
/// with the origin in the top-left corner and y pointing down.
pub struct Camera {
  pub width: f32,
  pub height: f32,
}

impl Camera {
  pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let proj = cgmath::ortho(0.0, self.width, self.height, 0.0, -1.0, 1.0);
    OPENGL_TO_WGPU_MATRIX * proj
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}
