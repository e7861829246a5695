//! Render composition: instanced batching of the scene graph.
//!
//! The renderer walks the scene each frame and groups objects that share a
//! geometry/material pair into one instanced draw call. GPU resources are
//! created lazily the first time an `Arc` handle is seen and cached by
//! pointer identity afterwards, so the hundred shared-torus instances cost
//! one mesh upload, one material bind group and one draw.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{instance::InstanceRaw, mesh::MeshData, texture::Texture},
    scene::{Material, SceneGraph},
};

/// Mesh data uploaded to the GPU.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// A material bound for the matcap pipeline.
struct GpuMaterial {
    bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    fn upload(ctx: &Context, material: &Material) -> Self {
        let texture = Texture::from_rgba(&ctx.device, &ctx.queue, &material.matcap, &material.name);
        let sampler = texture
            .sampler
            .as_ref()
            .expect("matcap textures are always created with a sampler");
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &ctx.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(&material.name),
        });
        Self { bind_group }
    }
}

/// Key identifying a batch: the addresses of its shared geometry and
/// material. The scene graph never drops objects, so the pointers stay
/// stable and unambiguous.
type BatchKey = (usize, usize);

struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

/// Caches of uploaded GPU resources plus per-batch instance buffers.
#[derive(Default)]
pub struct SceneRenderer {
    meshes: HashMap<usize, GpuMesh>,
    materials: HashMap<usize, GpuMaterial>,
    instance_buffers: HashMap<BatchKey, InstanceBuffer>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group the scene into instanced batches, uploading any GPU resources
    /// not seen before. Returns draw order: `(key, instance count)`.
    fn prepare(&mut self, ctx: &Context, scene: &SceneGraph) -> Vec<(BatchKey, u32)> {
        let mut order: Vec<BatchKey> = Vec::new();
        let mut batches: HashMap<BatchKey, Vec<InstanceRaw>> = HashMap::new();

        for object in scene.objects() {
            let geometry_key = Arc::as_ptr(&object.geometry) as usize;
            let material_key = Arc::as_ptr(&object.material) as usize;

            self.meshes
                .entry(geometry_key)
                .or_insert_with(|| GpuMesh::upload(&ctx.device, &object.geometry));
            self.materials
                .entry(material_key)
                .or_insert_with(|| GpuMaterial::upload(ctx, &object.material));

            let key = (geometry_key, material_key);
            let batch = batches.entry(key).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            batch.push(object.instance.to_raw());
        }

        let mut draws = Vec::with_capacity(order.len());
        for key in order {
            let instances = &batches[&key];
            let needs_grow = self
                .instance_buffers
                .get(&key)
                .is_none_or(|existing| existing.capacity < instances.len());
            if needs_grow {
                let buffer = ctx
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(instances),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                self.instance_buffers.insert(
                    key,
                    InstanceBuffer {
                        buffer,
                        capacity: instances.len(),
                    },
                );
            } else {
                let existing = &self.instance_buffers[&key];
                ctx.queue
                    .write_buffer(&existing.buffer, 0, bytemuck::cast_slice(instances));
            }
            draws.push((key, instances.len() as u32));
        }
        draws
    }

    /// Issue exactly one render of the current scene graph from the current
    /// camera. A scene in any intermediate state of population (including
    /// empty) renders fine; the pass just clears and presents.
    pub fn render(&mut self, ctx: &Context, scene: &SceneGraph) -> Result<(), wgpu::SurfaceError> {
        let draws = self.prepare(ctx, scene);

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&ctx.pipeline);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);

            for ((geometry_key, material_key), amount) in draws {
                if amount == 0 {
                    log::warn!("skipping a batch with zero instances");
                    continue;
                }
                let mesh = &self.meshes[&geometry_key];
                let material = &self.materials[&material_key];
                let instances = &self.instance_buffers[&(geometry_key, material_key)];

                render_pass.set_bind_group(0, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, instances.buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..amount);
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
