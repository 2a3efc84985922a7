#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// Index pattern for one quad built by [`SpriteVertex::quad`], relative to its first vertex.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl SpriteVertex {
    /// Four corners of an axis-aligned screen rectangle showing the whole
    /// texture: top-left, top-right, bottom-right, bottom-left.
    pub fn quad(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> [SpriteVertex; 4] {
        let right = x + width;
        let bottom = y + height;
        [
            SpriteVertex {
                position: [x, y],
                tex_coords: [0.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [right, y],
                tex_coords: [1.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [right, bottom],
                tex_coords: [1.0, 1.0],
                color,
            },
            SpriteVertex {
                position: [x, bottom],
                tex_coords: [0.0, 1.0],
                color,
            },
        ]
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // tex_coords
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, color) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_corners_cover_rect_with_full_uv() {
        let quad = SpriteVertex::quad(50.0, 60.0, 100.0, 80.0, [1.0; 4]);
        assert_eq!(quad[0].position, [50.0, 60.0]);
        assert_eq!(quad[2].position, [150.0, 140.0]);
        assert_eq!(quad[0].tex_coords, [0.0, 0.0]);
        assert_eq!(quad[2].tex_coords, [1.0, 1.0]);
        assert!(quad.iter().all(|v| v.color == [1.0; 4]));
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 32);
        assert_eq!(SpriteVertex::layout().attributes.len(), 3);
    }
}
