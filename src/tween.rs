//! Looping value tweens and the per-frame timeline that drives them.
//!
//! A [`Tween`] binds one scene object's Y position to a time-driven
//! interpolation from a start value to a target value. The demo only ever
//! creates infinite yoyo tweens (the value ping-pongs between `from` and
//! `to` forever), but single-pass tweens are supported for completeness.
//!
//! The [`Timeline`] owns all tweens and is advanced exactly once per frame
//! by the render loop. Tweens are never cancelled; they run until process
//! teardown.

use crate::scene::{ObjectId, SceneGraph};

/// Ease-out circular interpolation: fast start, gentle arrival.
pub fn ease_out_circ(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    (1.0 - (p - 1.0) * (p - 1.0)).max(0.0).sqrt()
}

/// Interpolation curve applied to the normalized tween phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ease {
    Linear,
    OutCirc,
}

impl Ease {
    pub fn apply(self, p: f32) -> f32 {
        match self {
            Ease::Linear => p.clamp(0.0, 1.0),
            Ease::OutCirc => ease_out_circ(p),
        }
    }
}

/// A time-driven interpolation of one object's Y position.
#[derive(Clone, Debug)]
pub struct Tween {
    pub target: ObjectId,
    pub from: f32,
    pub to: f32,
    /// Seconds for one pass from `from` to `to`.
    pub duration: f32,
    /// Seconds to hold at `from` before the first pass starts.
    pub delay: f32,
    pub ease: Ease,
    /// Reverse direction at each end instead of jumping back to `from`.
    pub yoyo: bool,
    pub repeats_forever: bool,
    elapsed: f32,
}

impl Tween {
    /// The configuration every object in this demo uses: infinite repeat,
    /// yoyo, ease-out circular.
    pub fn looping(target: ObjectId, from: f32, to: f32, duration: f32, delay: f32) -> Self {
        Self {
            target,
            from,
            to,
            duration,
            delay,
            ease: Ease::OutCirc,
            yoyo: true,
            repeats_forever: true,
            elapsed: 0.0,
        }
    }

    /// The interpolated value after `elapsed` seconds of wall time.
    pub fn value_at(&self, elapsed: f32) -> f32 {
        if elapsed < self.delay || self.duration <= 0.0 {
            return self.from;
        }
        let active = elapsed - self.delay;
        let cycle = active / self.duration;

        let phase = if self.repeats_forever {
            if self.yoyo {
                let wrapped = cycle % 2.0;
                if wrapped <= 1.0 { wrapped } else { 2.0 - wrapped }
            } else {
                cycle % 1.0
            }
        } else if self.yoyo {
            let clamped = cycle.min(2.0);
            if clamped <= 1.0 { clamped } else { 2.0 - clamped }
        } else {
            cycle.min(1.0)
        };

        self.from + (self.to - self.from) * self.ease.apply(phase)
    }
}

/// All running tweens, advanced once per frame.
#[derive(Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween) {
        self.tweens.push(tween);
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Advance all tweens by `dt` seconds and write the resulting Y values
    /// into their bound scene objects.
    pub fn advance(&mut self, dt: f32, scene: &mut SceneGraph) {
        for tween in &mut self.tweens {
            tween.elapsed += dt;
            let value = tween.value_at(tween.elapsed);
            scene.object_mut(tween.target).instance.position.y = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{instance::Instance, mesh::MeshData};
    use crate::scene::{Material, SceneObject};
    use std::sync::Arc;

    fn scene_with_one_object() -> (SceneGraph, ObjectId) {
        let mut scene = SceneGraph::new();
        let id = scene.add(SceneObject {
            geometry: Arc::new(MeshData::default()),
            material: Arc::new(Material {
                name: "test".into(),
                matcap: image::RgbaImage::new(1, 1),
            }),
            instance: Instance::new(),
        });
        (scene, id)
    }

    #[test]
    fn ease_out_circ_endpoints() {
        assert_eq!(ease_out_circ(0.0), 0.0);
        assert_eq!(ease_out_circ(1.0), 1.0);
        assert!((ease_out_circ(0.5) - 0.75f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn holds_start_value_during_delay() {
        let (_, id) = scene_with_one_object();
        let tween = Tween::looping(id, 1.0, 2.0, 0.4, 0.3);
        assert_eq!(tween.value_at(0.0), 1.0);
        assert_eq!(tween.value_at(0.29), 1.0);
    }

    #[test]
    fn yoyo_cycle_hits_both_endpoints() {
        let (_, id) = scene_with_one_object();
        let tween = Tween::looping(id, 1.0, 2.0, 0.25, 0.25);
        // End of forward pass.
        assert!((tween.value_at(0.5) - 2.0).abs() < 1e-5);
        // End of backward pass: back at the start.
        assert!((tween.value_at(0.75) - 1.0).abs() < 1e-5);
        // And forward again.
        assert!((tween.value_at(1.0) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn value_stays_within_endpoints_forever() {
        let (_, id) = scene_with_one_object();
        let tween = Tween::looping(id, -0.5, 0.5, 0.4, 0.25);
        for step in 0..2000 {
            let value = tween.value_at(step as f32 * 0.013);
            assert!((-0.5..=0.5).contains(&value), "escaped at step {step}");
        }
    }

    #[test]
    fn advance_writes_into_bound_object() {
        let (mut scene, id) = scene_with_one_object();
        let mut timeline = Timeline::new();
        timeline.add(Tween::looping(id, 0.0, 0.3, 0.4, 0.0));
        timeline.advance(0.4, &mut scene);
        assert!((scene.object(id).instance.position.y - 0.3).abs() < 1e-5);
    }

    #[test]
    fn zero_duration_tween_stays_at_start() {
        let (_, id) = scene_with_one_object();
        let tween = Tween::looping(id, 3.0, 9.0, 0.0, 0.0);
        assert_eq!(tween.value_at(5.0), 3.0);
    }
}
