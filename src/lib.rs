//! turnup
//!
//! An instancing-oriented wgpu demo: a piece of extruded 3D text floats in
//! a field of one hundred matcap-shaded toruses, everything bobbing on
//! looping yoyo tweens under an orbiting, damped camera.
//!
//! High-level modules
//! - `app`: the winit event loop, asset-load join and frame driver
//! - `camera`: camera types, orbit controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `data_structures`: mesh, instance and texture data models
//! - `pipelines`: the matcap render pipeline
//! - `populate`: one-shot randomized scene population
//! - `render`: instanced batching and render pass composition
//! - `resources`: asset loading and text meshing
//! - `scene`: the scene graph of shared-resource objects
//! - `tween`: looping value tweens and the per-frame timeline

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod populate;
pub mod render;
pub mod resources;
pub mod scene;
pub mod tween;

// Re-exports commonly used types for convenience in downstream code.
pub use app::AssetJoin;
pub use populate::{LoadedAssets, RingParams};
pub use scene::{Material, ObjectId, SceneGraph, SceneObject};
pub use tween::{Timeline, Tween};
