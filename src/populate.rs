//! One-shot scene population.
//!
//! Runs exactly once, after both assets have loaded: builds the text mesh
//! and the shared torus resources, fills the scene graph with one text
//! object and a hundred randomly placed torus instances, and registers a
//! looping Y tween for every object.
//!
//! All distribution parameters live here as named constants, and sampling
//! goes through a caller-supplied [`Rng`] so tests can drive everything
//! from a fixed seed.

use std::sync::Arc;

use cgmath::{Rad, Rotation3, Vector3};
use image::RgbaImage;
use rand::Rng;

use crate::{
    data_structures::{instance::Instance, mesh::MeshData},
    resources::text,
    scene::{Material, SceneGraph, SceneObject},
    tween::{Timeline, Tween},
};

pub const TEXT_CONTENT: &str = "Turn up";
pub const TEXT_SIZE: f32 = 0.5;
pub const TEXT_DEPTH: f32 = 0.2;
/// The text bobs between its resting Y and this offset.
pub const TEXT_RISE: f32 = 0.3;

pub const RING_COUNT: usize = 100;
pub const RING_RADIUS: f32 = 0.3;
pub const RING_TUBE: f32 = 0.2;
pub const RING_RADIAL_SEGMENTS: u32 = 20;
pub const RING_TUBULAR_SEGMENTS: u32 = 45;

/// Rings scatter inside a cube of side `2 * FIELD_HALF_EXTENT`.
pub const FIELD_HALF_EXTENT: f32 = 5.0;
/// X and Y rotations are sampled from `[0, ROTATION_RANGE)`; Z stays at
/// identity.
pub const ROTATION_RANGE: f32 = std::f32::consts::PI;
pub const SCALE_MIN: f32 = 0.2;
pub const SCALE_MAX: f32 = 1.0;
/// Each ring rises by its own offset in `[0, RISE_RANGE)`.
pub const RISE_RANGE: f32 = 1.0;
/// Tween start delays in `[0, DELAY_RANGE)` keep the rings out of lockstep.
pub const DELAY_RANGE: f32 = 0.5;
pub const TWEEN_DURATION: f32 = 0.4;

/// The two loaded assets the populator consumes.
pub struct LoadedAssets {
    pub matcap: RgbaImage,
    pub font: Vec<u8>,
}

/// Randomized parameters for one ring instance.
#[derive(Clone, Debug, PartialEq)]
pub struct RingParams {
    pub position: Vector3<f32>,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub scale: f32,
    pub rise: f32,
    pub delay: f32,
}

impl RingParams {
    pub fn sample(rng: &mut impl Rng) -> Self {
        Self {
            position: Vector3::new(
                rng.gen_range(-FIELD_HALF_EXTENT..FIELD_HALF_EXTENT),
                rng.gen_range(-FIELD_HALF_EXTENT..FIELD_HALF_EXTENT),
                rng.gen_range(-FIELD_HALF_EXTENT..FIELD_HALF_EXTENT),
            ),
            rotation_x: rng.gen_range(0.0..ROTATION_RANGE),
            rotation_y: rng.gen_range(0.0..ROTATION_RANGE),
            scale: rng.gen_range(SCALE_MIN..=SCALE_MAX),
            rise: rng.gen_range(0.0..RISE_RANGE),
            delay: rng.gen_range(0.0..DELAY_RANGE),
        }
    }

    pub fn to_instance(&self) -> Instance {
        Instance {
            position: self.position,
            // XYZ Euler order with a zero Z angle: the Y spin applies first,
            // then the X tilt.
            rotation: cgmath::Quaternion::from_angle_x(Rad(self.rotation_x))
                * cgmath::Quaternion::from_angle_y(Rad(self.rotation_y)),
            scale: Vector3::new(self.scale, self.scale, self.scale),
        }
    }
}

/// Populate the scene from the loaded assets: one text mesh, one hundred
/// rings, one looping tween each.
///
/// Meshing failures propagate so the caller can log and leave the scene
/// empty; partial population is never left behind in that case because the
/// text mesh is built before anything is inserted.
pub fn populate(
    scene: &mut SceneGraph,
    timeline: &mut Timeline,
    assets: &LoadedAssets,
    rng: &mut impl Rng,
) -> anyhow::Result<()> {
    let text_mesh = Arc::new(text::build_text_mesh(
        &assets.font,
        TEXT_CONTENT,
        TEXT_SIZE,
        TEXT_DEPTH,
    )?);
    let material = Arc::new(Material {
        name: "matcap".to_string(),
        matcap: assets.matcap.clone(),
    });
    let ring_mesh = Arc::new(MeshData::torus(
        RING_RADIUS,
        RING_TUBE,
        RING_RADIAL_SEGMENTS,
        RING_TUBULAR_SEGMENTS,
    ));

    spawn_text(scene, timeline, text_mesh, material.clone());
    spawn_rings(scene, timeline, ring_mesh, material, rng);

    log::info!(
        "scene populated: {} objects, {} tweens",
        scene.len(),
        timeline.len()
    );
    Ok(())
}

/// Insert the centered text mesh at the origin with its looping rise tween.
pub fn spawn_text(
    scene: &mut SceneGraph,
    timeline: &mut Timeline,
    geometry: Arc<MeshData>,
    material: Arc<Material>,
) {
    let id = scene.add(SceneObject {
        geometry,
        material,
        instance: Instance::new(),
    });
    timeline.add(Tween::looping(id, 0.0, TEXT_RISE, TWEEN_DURATION, 0.0));
}

/// Insert [`RING_COUNT`] rings sharing one geometry and one material, each
/// with independently sampled transform and tween parameters.
pub fn spawn_rings(
    scene: &mut SceneGraph,
    timeline: &mut Timeline,
    geometry: Arc<MeshData>,
    material: Arc<Material>,
    rng: &mut impl Rng,
) {
    for _ in 0..RING_COUNT {
        let params = RingParams::sample(rng);
        let id = scene.add(SceneObject {
            geometry: geometry.clone(),
            material: material.clone(),
            instance: params.to_instance(),
        });
        timeline.add(Tween::looping(
            id,
            params.position.y,
            params.position.y + params.rise,
            TWEEN_DURATION,
            params.delay,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn ring_rotation_spins_about_y_before_tilting_about_x() {
        let params = RingParams {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation_x: std::f32::consts::FRAC_PI_2,
            rotation_y: std::f32::consts::FRAC_PI_2,
            scale: 1.0,
            rise: 0.0,
            delay: 0.0,
        };
        let rotated = params.to_instance().rotation * Vector3::unit_z();
        // Y spin moves +Z onto +X, which the X tilt then leaves in place.
        // The reverse composition would land on -Y instead.
        assert!((rotated - Vector3::unit_x()).magnitude() < 1e-5);
    }
}
