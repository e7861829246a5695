//! Render pipeline definitions.
//!
//! The demo draws everything with a single matcap pipeline; see [`matcap`].

pub mod matcap;
