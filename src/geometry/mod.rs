//! CPU-side geometry produced by builders and installed into schema values.
//!
//! A geometry is a plain bundle of arrays. [`Geometry::install`] swaps those
//! arrays into the owning [`Values`] record in one step, taking the previous
//! arrays back so the next build can reuse their allocations.

mod bounds;
pub mod cylinders;
pub mod mesh;

pub use bounds::Sphere3D;

use crate::{
    options::BaseGeometryOptions,
    schema::{PartialSchema, Value, Values},
};

/// Concrete geometry/draw kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Tessellated triangle mesh.
    Mesh,
    /// Ray-cast cylinder impostors.
    Cylinders,
    /// Ray-marched volume.
    DirectVolume,
}

/// A geometry kind that can be built, installed into values, and refreshed
/// from props.
pub trait Geometry: Default {
    /// Draw kind.
    const KIND: GeometryKind;

    /// Partial schemas declaring this kind's slots, after the global and
    /// internal ones.
    fn partial_schemas() -> &'static [PartialSchema];

    /// Whether per-group radii are looked up at draw time (`tSize`) rather
    /// than baked into positions.
    fn uses_size_texture() -> bool;

    /// Number of vertices (or indices) the draw call consumes.
    fn draw_count(&self) -> u32;

    /// Local-frame bounding sphere.
    fn bounding_sphere(&self) -> Sphere3D;

    /// Set the local-frame bounding sphere.
    fn set_bounding_sphere(&mut self, sphere: Sphere3D);

    /// Drop contents but keep allocations.
    fn clear(&mut self);

    /// Move this geometry's arrays into `values`.
    ///
    /// Afterwards `self` holds the previously installed arrays, cleared, for
    /// reuse by the next build.
    fn install(&mut self, values: &mut Values);

    /// Write prop-driven uniforms and defines. Unchanged values keep their
    /// version; returns whether any value was written.
    fn update_values(
        values: &mut Values,
        props: &BaseGeometryOptions,
        size_factor: f32,
    ) -> bool;
}

/// Swap `next` into the float array slot `name`, returning the previous
/// array (cleared) or an empty one.
pub(crate) fn swap_f32(
    values: &mut Values,
    name: &'static str,
    next: Vec<f32>,
) -> Vec<f32> {
    match values.replace(name, Value::Float32Array(next)) {
        Some(Value::Float32Array(mut old)) => {
            old.clear();
            old
        }
        _ => Vec::new(),
    }
}

/// Swap `next` into the u32 array slot `name`, returning the previous array
/// (cleared) or an empty one.
pub(crate) fn swap_u32(
    values: &mut Values,
    name: &'static str,
    next: Vec<u32>,
) -> Vec<u32> {
    match values.replace(name, Value::Uint32Array(next)) {
        Some(Value::Uint32Array(mut old)) => {
            old.clear();
            old
        }
        _ => Vec::new(),
    }
}
