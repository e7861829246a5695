//! Per-instance transformation data for GPU instancing.
//!
//! Every scene object carries an [`Instance`] (position, rotation, scale).
//! Objects that share geometry and material are drawn with a single
//! instanced draw call, so their transforms are packed into a vertex buffer
//! of [`InstanceRaw`] values.

use cgmath::One;

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation: no move, rotate, or scale.
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            // Uniform scaling keeps the rotation matrix a valid normal matrix.
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// The raw instance data as stored in the GPU vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // A full matrix per object, advanced once per instance.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rad, Rotation3, SquareMatrix};

    #[test]
    fn identity_instance_has_identity_matrix() {
        let matrix = Instance::new().to_matrix();
        assert_eq!(matrix, cgmath::Matrix4::identity());
    }

    #[test]
    fn translation_lands_in_last_column() {
        let mut instance = Instance::new();
        instance.position = cgmath::Vector3::new(1.0, 2.0, 3.0);
        let matrix = instance.to_matrix();
        assert_eq!(matrix.w.x, 1.0);
        assert_eq!(matrix.w.y, 2.0);
        assert_eq!(matrix.w.z, 3.0);
    }

    #[test]
    fn uniform_scale_applies_to_all_axes() {
        let mut instance = Instance::new();
        instance.scale = cgmath::Vector3::new(0.5, 0.5, 0.5);
        instance.rotation = cgmath::Quaternion::from_angle_x(Rad(0.3));
        let matrix = instance.to_matrix();
        // The basis columns all keep the scale factor as their length.
        for column in [matrix.x, matrix.y, matrix.z] {
            let len = (column.x * column.x + column.y * column.y + column.z * column.z).sqrt();
            assert!((len - 0.5).abs() < 1e-5);
        }
    }
}
