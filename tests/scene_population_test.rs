//! Scene population behavior: object counts, resource sharing, randomized
//! parameter ranges and tween configuration, all driven by a seeded RNG so
//! the assertions are exact and reproducible.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use turnup::data_structures::mesh::MeshData;
use turnup::populate::{
    self, DELAY_RANGE, FIELD_HALF_EXTENT, RING_COUNT, RISE_RANGE, ROTATION_RANGE, RingParams,
    SCALE_MAX, SCALE_MIN, TEXT_RISE, TWEEN_DURATION,
};
use turnup::scene::{Material, SceneGraph};
use turnup::tween::{Ease, Timeline};

fn shared_material() -> Arc<Material> {
    Arc::new(Material {
        name: "matcap".into(),
        matcap: image::RgbaImage::new(2, 2),
    })
}

fn populated_scene(seed: u64) -> (SceneGraph, Timeline) {
    let mut scene = SceneGraph::new();
    let mut timeline = Timeline::new();
    let material = shared_material();
    let text_mesh = Arc::new(MeshData::torus(0.1, 0.05, 4, 6));
    let ring_mesh = Arc::new(MeshData::torus(0.3, 0.2, 20, 45));
    let mut rng = StdRng::seed_from_u64(seed);

    populate::spawn_text(&mut scene, &mut timeline, text_mesh, material.clone());
    populate::spawn_rings(&mut scene, &mut timeline, ring_mesh, material, &mut rng);
    (scene, timeline)
}

#[test]
fn scene_is_empty_before_population() {
    let scene = SceneGraph::new();
    assert_eq!(scene.len(), 0);
}

#[test]
fn population_adds_one_text_and_one_hundred_rings() {
    let (scene, timeline) = populated_scene(7);
    assert_eq!(scene.len(), 1 + RING_COUNT);
    assert_eq!(timeline.len(), 1 + RING_COUNT);
}

#[test]
fn all_rings_share_one_geometry_and_one_material() {
    let (scene, _) = populated_scene(7);
    let rings = &scene.objects()[1..];
    let first = &rings[0];
    for ring in rings {
        assert!(Arc::ptr_eq(&ring.geometry, &first.geometry));
        assert!(Arc::ptr_eq(&ring.material, &first.material));
    }
    // The text shares the material but not the geometry.
    let text = &scene.objects()[0];
    assert!(Arc::ptr_eq(&text.material, &first.material));
    assert!(!Arc::ptr_eq(&text.geometry, &first.geometry));
}

#[test]
fn ring_positions_stay_inside_the_field_cube() {
    let (scene, _) = populated_scene(21);
    for ring in &scene.objects()[1..] {
        let position = ring.instance.position;
        for coordinate in [position.x, position.y, position.z] {
            assert!((-FIELD_HALF_EXTENT..=FIELD_HALF_EXTENT).contains(&coordinate));
        }
    }
}

#[test]
fn ring_scale_is_uniform_and_in_range() {
    let (scene, _) = populated_scene(3);
    for ring in &scene.objects()[1..] {
        let scale = ring.instance.scale;
        assert_eq!(scale.x, scale.y);
        assert_eq!(scale.y, scale.z);
        assert!((SCALE_MIN..=SCALE_MAX).contains(&scale.x));
    }
}

#[test]
fn sampled_parameters_respect_all_ranges() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..1000 {
        let params = RingParams::sample(&mut rng);
        for coordinate in [params.position.x, params.position.y, params.position.z] {
            assert!(coordinate >= -FIELD_HALF_EXTENT && coordinate < FIELD_HALF_EXTENT);
        }
        assert!(params.rotation_x >= 0.0 && params.rotation_x < ROTATION_RANGE);
        assert!(params.rotation_y >= 0.0 && params.rotation_y < ROTATION_RANGE);
        assert!((SCALE_MIN..=SCALE_MAX).contains(&params.scale));
        assert!(params.rise >= 0.0 && params.rise < RISE_RANGE);
        assert!(params.delay >= 0.0 && params.delay < DELAY_RANGE);
    }
}

#[test]
fn sampling_is_reproducible_from_a_seed() {
    let mut first = StdRng::seed_from_u64(42);
    let mut second = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        assert_eq!(
            RingParams::sample(&mut first),
            RingParams::sample(&mut second)
        );
    }
}

#[test]
fn every_tween_loops_forever_with_yoyo() {
    let (_, timeline) = populated_scene(7);
    for tween in timeline.tweens() {
        assert!(tween.repeats_forever);
        assert!(tween.yoyo);
        assert_eq!(tween.ease, Ease::OutCirc);
        assert_eq!(tween.duration, TWEEN_DURATION);
    }
}

#[test]
fn text_tween_rises_by_the_fixed_offset_without_delay() {
    let (_, timeline) = populated_scene(7);
    let text_tween = &timeline.tweens()[0];
    assert_eq!(text_tween.from, 0.0);
    assert_eq!(text_tween.to, TEXT_RISE);
    assert_eq!(text_tween.delay, 0.0);
}

#[test]
fn ring_tweens_rise_from_their_own_positions() {
    let (scene, timeline) = populated_scene(13);
    for (object, tween) in scene.objects()[1..]
        .iter()
        .zip(&timeline.tweens()[1..])
    {
        assert_eq!(tween.from, object.instance.position.y);
        let rise = tween.to - tween.from;
        assert!((0.0..RISE_RANGE).contains(&rise));
        assert!((0.0..DELAY_RANGE).contains(&tween.delay));
    }
}

#[test]
fn ring_delays_are_not_all_equal() {
    let (_, timeline) = populated_scene(5);
    let delays: Vec<f32> = timeline.tweens()[1..].iter().map(|t| t.delay).collect();
    assert!(delays.windows(2).any(|pair| pair[0] != pair[1]));
}

#[test]
fn advancing_the_timeline_moves_only_y() {
    let (mut scene, mut timeline) = populated_scene(11);
    let before: Vec<_> = scene
        .objects()
        .iter()
        .map(|o| o.instance.position)
        .collect();

    timeline.advance(0.1, &mut scene);

    for (object, start) in scene.objects().iter().zip(&before) {
        let position = object.instance.position;
        assert_eq!(position.x, start.x);
        assert_eq!(position.z, start.z);
    }
}
