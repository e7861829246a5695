//! Core data types for scene representation.
//!
//! - `mesh` contains CPU-side mesh data and the procedural torus generator
//! - `instance` holds per-instance transformation data for GPU instancing
//! - `texture` contains the GPU texture wrapper (depth buffer, matcap)

pub mod instance;
pub mod mesh;
pub mod texture;
