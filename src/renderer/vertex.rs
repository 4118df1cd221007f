//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for table elements
pub mod colors {
    pub const WALL: [f32; 4] = [0.35, 0.35, 0.5, 1.0];
    pub const FLIPPER: [f32; 4] = [0.55, 0.35, 0.95, 1.0];
    pub const BALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BUMPER: [f32; 4] = [0.2, 0.45, 0.9, 1.0];
    pub const BUMPER_LIT: [f32; 4] = [0.95, 0.75, 0.25, 1.0];
    pub const BUMPER_GLOW: [f32; 4] = [0.95, 0.75, 0.25, 0.35];
    pub const LABEL_MARK: [f32; 4] = [0.9, 0.9, 1.0, 0.8];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}

/// High contrast variants
pub mod contrast {
    pub const WALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const FLIPPER: [f32; 4] = [1.0, 0.85, 0.0, 1.0];
    pub const BUMPER: [f32; 4] = [0.0, 0.6, 1.0, 1.0];
    pub const BUMPER_LIT: [f32; 4] = [1.0, 0.2, 0.2, 1.0];
}
