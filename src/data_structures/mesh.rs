//! CPU-side mesh data and procedural geometry.
//!
//! [`MeshData`] is the engine-agnostic representation of a triangle mesh:
//! positions, normals and a `u32` index list. GPU upload happens later in the
//! renderer, so mesh construction (and the tests for it) never touch a device.

use cgmath::InnerSpace;

/// A single mesh vertex: position and normal.
///
/// Matcap shading samples the lighting texture by normal direction, so no
/// texture coordinates are stored.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// An indexed triangle mesh kept in host memory.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Generate a torus around the Z axis.
    ///
    /// `radius` is the distance from the torus center to the tube center,
    /// `tube` the tube radius. `radial_segments` subdivides the tube
    /// cross-section, `tubular_segments` the ring itself.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let mut vertices =
            Vec::with_capacity(((radial_segments + 1) * (tubular_segments + 1)) as usize);

        for j in 0..=radial_segments {
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * std::f32::consts::TAU;
                let v = j as f32 / radial_segments as f32 * std::f32::consts::TAU;

                let position = [
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                ];
                // The tube center at the same ring angle.
                let center = cgmath::Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let normal = (cgmath::Vector3::from(position) - center).normalize();

                vertices.push(Vertex {
                    position,
                    normal: normal.into(),
                });
            }
        }

        let mut indices = Vec::with_capacity((radial_segments * tubular_segments * 6) as usize);
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = (tubular_segments + 1) * j + i - 1;
                let b = (tubular_segments + 1) * (j - 1) + i - 1;
                let c = (tubular_segments + 1) * (j - 1) + i;
                let d = (tubular_segments + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// Axis-aligned bounding box as `(min, max)`. Empty meshes report zeros.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        if self.vertices.is_empty() {
            return ([0.0; 3], [0.0; 3]);
        }
        for vertex in &self.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex.position[axis]);
                max[axis] = max[axis].max(vertex.position[axis]);
            }
        }
        (min, max)
    }

    /// Translate all vertices so the bounding-box center sits at the origin.
    pub fn center(&mut self) {
        let (min, max) = self.bounds();
        let shift = [
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        ];
        for vertex in &mut self.vertices {
            for axis in 0..3 {
                vertex.position[axis] -= shift[axis];
            }
        }
    }
}
