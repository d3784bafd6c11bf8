//! Cylinder impostor primitives.
//!
//! Each primitive is a (start, end, scale, caps, group) record expanded to a
//! screen-aligned box by the vertex stage and ray-cast in the fragment
//! stage. Radii are not stored here: the shader multiplies the group's
//! `tSize` entry by `uSizeFactor` and the per-primitive scale.

use glam::Vec3;

use super::{swap_f32, Geometry, GeometryKind, Sphere3D};
use crate::{
    options::BaseGeometryOptions,
    schema::{
        builtin::{BASE_SCHEMA, CYLINDERS_SCHEMA, SIZE_SCHEMA},
        PartialSchema, Value, Values,
    },
};

/// Vertices emitted per impostor primitive (two triangles).
pub const CYLINDER_IMPOSTOR_VERTICES: u32 = 6;

/// Cap bit: closed at the start point.
pub const CAP_TOP: u8 = 0b01;
/// Cap bit: closed at the end point.
pub const CAP_BOTTOM: u8 = 0b10;

/// Impostor cylinder primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cylinders {
    starts: Vec<f32>,
    ends: Vec<f32>,
    scales: Vec<f32>,
    caps: Vec<f32>,
    groups: Vec<f32>,
    bounding_sphere: Sphere3D,
}

impl Cylinders {
    /// Empty set, reusing `recycle`'s allocations when given.
    pub fn create_empty(recycle: Option<Self>) -> Self {
        let mut cylinders = recycle.unwrap_or_default();
        cylinders.clear();
        cylinders
    }

    /// Number of primitives.
    pub fn count(&self) -> usize {
        self.scales.len()
    }

    /// Flat `xyz` start points.
    pub fn starts(&self) -> &[f32] {
        &self.starts
    }

    /// Flat `xyz` end points.
    pub fn ends(&self) -> &[f32] {
        &self.ends
    }

    /// Length scale per primitive.
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Cap bits per primitive.
    pub fn caps(&self) -> &[f32] {
        &self.caps
    }

    /// Group id per primitive.
    pub fn groups(&self) -> &[f32] {
        &self.groups
    }
}

impl Geometry for Cylinders {
    const KIND: GeometryKind = GeometryKind::Cylinders;

    fn partial_schemas() -> &'static [PartialSchema] {
        &[BASE_SCHEMA, SIZE_SCHEMA, CYLINDERS_SCHEMA]
    }

    fn uses_size_texture() -> bool {
        true
    }

    fn draw_count(&self) -> u32 {
        self.count() as u32 * CYLINDER_IMPOSTOR_VERTICES
    }

    fn bounding_sphere(&self) -> Sphere3D {
        self.bounding_sphere
    }

    fn set_bounding_sphere(&mut self, sphere: Sphere3D) {
        self.bounding_sphere = sphere;
    }

    fn clear(&mut self) {
        self.starts.clear();
        self.ends.clear();
        self.scales.clear();
        self.caps.clear();
        self.groups.clear();
        self.bounding_sphere = Sphere3D::EMPTY;
    }

    fn install(&mut self, values: &mut Values) {
        values.set("drawCount", Value::Uint(self.draw_count()));
        values.set(
            "invariantBoundingSphere",
            Value::Sphere(self.bounding_sphere),
        );
        self.starts =
            swap_f32(values, "aStart", std::mem::take(&mut self.starts));
        self.ends = swap_f32(values, "aEnd", std::mem::take(&mut self.ends));
        self.scales =
            swap_f32(values, "aScale", std::mem::take(&mut self.scales));
        self.caps = swap_f32(values, "aCap", std::mem::take(&mut self.caps));
        self.groups =
            swap_f32(values, "aGroup", std::mem::take(&mut self.groups));
        self.bounding_sphere = Sphere3D::EMPTY;
    }

    fn update_values(
        values: &mut Values,
        props: &BaseGeometryOptions,
        size_factor: f32,
    ) -> bool {
        let mut changed =
            values.set_if_changed("uAlpha", Value::Float(props.alpha));
        changed |= values.set_if_changed("dUseFog", Value::Bool(props.use_fog));
        changed |= values
            .set_if_changed("dDoubleSided", Value::Bool(props.double_sided));
        changed |=
            values.set_if_changed("uSizeFactor", Value::Float(size_factor));
        changed
    }
}

/// Accumulates impostor primitives.
pub struct CylindersBuilder {
    cylinders: Cylinders,
}

impl CylindersBuilder {
    /// Builder pre-sized for `estimate` primitives, reusing `recycle`'s
    /// allocations.
    pub fn new(estimate: usize, recycle: Option<Cylinders>) -> Self {
        let mut cylinders = Cylinders::create_empty(recycle);
        cylinders.starts.reserve(estimate * 3);
        cylinders.ends.reserve(estimate * 3);
        cylinders.scales.reserve(estimate);
        cylinders.caps.reserve(estimate);
        cylinders.groups.reserve(estimate);
        Self { cylinders }
    }

    /// Append one primitive. Zero-length segments are skipped; returns
    /// whether the primitive was added.
    pub fn add(
        &mut self,
        start: Vec3,
        end: Vec3,
        scale: f32,
        caps: u8,
        group: u32,
    ) -> bool {
        let length = start.distance_squared(end);
        if !length.is_finite() || length == 0.0 {
            return false;
        }
        let c = &mut self.cylinders;
        c.starts.extend_from_slice(&start.to_array());
        c.ends.extend_from_slice(&end.to_array());
        c.scales.push(scale);
        c.caps.push(f32::from(caps));
        c.groups.push(group as f32);
        true
    }

    /// Number of primitives added so far.
    pub fn count(&self) -> usize {
        self.cylinders.count()
    }

    /// Finish building.
    pub fn finish(self) -> Cylinders {
        self.cylinders
    }
}
