use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed screen-space camera: origin at the window's top-left corner, y grows
/// downward, one unit per logical pixel. Board rectangles are drawn as-is.
pub struct ScreenCamera {
    pub logical_size: Vec2,
}

impl ScreenCamera {
    pub fn new(logical_width: f32, logical_height: f32) -> Self {
        Self {
            logical_size: Vec2::new(logical_width, logical_height),
        }
    }

    pub fn resize(&mut self, logical_width: f32, logical_height: f32) {
        if logical_width > 0.0 && logical_height > 0.0 {
            self.logical_size = Vec2::new(logical_width, logical_height);
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            0.0,
            self.logical_size.x,
            self.logical_size.y,
            0.0,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}
