//! The scene graph: a flat, append-only collection of renderable objects.
//!
//! Geometry and materials are shared between objects through `Arc`, so the
//! hundred torus instances all reference a single mesh and a single matcap
//! material. That sharing is what lets the renderer collapse them into one
//! instanced draw call, and it must be preserved when adding objects.
//!
//! Insertion returns a stable [`ObjectId`]: the graph never removes objects,
//! so the id doubles as the binding target for tweens.

use std::sync::Arc;

use image::RgbaImage;

use crate::data_structures::{instance::Instance, mesh::MeshData};

/// A shading material: a name for GPU debug labels plus the decoded matcap
/// lighting image. Uploaded to the GPU once by the renderer, shared by
/// reference everywhere else.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub matcap: RgbaImage,
}

/// Stable handle to an object in the scene graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

/// One renderable object: shared geometry, shared material, own transform.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub geometry: Arc<MeshData>,
    pub material: Arc<Material>,
    pub instance: Instance,
}

/// Ordered collection of everything eligible to be rendered in a frame.
#[derive(Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object. Objects are never removed, so the returned id stays
    /// valid for the lifetime of the graph.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        &mut self.objects[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_object() -> SceneObject {
        SceneObject {
            geometry: Arc::new(MeshData::default()),
            material: Arc::new(Material {
                name: "test".into(),
                matcap: RgbaImage::new(1, 1),
            }),
            instance: Instance::new(),
        }
    }

    #[test]
    fn new_scene_is_empty() {
        let scene = SceneGraph::new();
        assert!(scene.is_empty());
        assert_eq!(scene.len(), 0);
    }

    #[test]
    fn ids_stay_stable_across_insertions() {
        let mut scene = SceneGraph::new();
        let first = scene.add(dummy_object());
        let mut second_object = dummy_object();
        second_object.instance.position.y = 4.0;
        let second = scene.add(second_object);

        assert_ne!(first, second);
        assert_eq!(scene.object(second).instance.position.y, 4.0);
        assert_eq!(scene.object(first).instance.position.y, 0.0);
    }

    #[test]
    fn object_mut_writes_through() {
        let mut scene = SceneGraph::new();
        let id = scene.add(dummy_object());
        scene.object_mut(id).instance.position.y = 2.5;
        assert_eq!(scene.object(id).instance.position.y, 2.5);
    }
}
