//! Draw items binding a validated values record to a composed schema.
//!
//! A [`Renderable`] owns the values of one geometry kind. It composes the
//! global and internal partial schemas in front of the kind's own, injects
//! `uObjectId`, and refuses to exist unless every declared slot is bound
//! with a value of the declared type. Counts are read live from the cells,
//! so they can never disagree with the installed geometry.

pub mod direct_volume;

use std::fmt::Write as _;

use crate::{
    error::ReprError,
    geometry::{GeometryKind, Sphere3D},
    schema::{
        builtin::{is_global_uniform, GLOBAL_UNIFORM_SCHEMA, INTERNAL_SCHEMA},
        PartialSchema, ResourceKind, Schema, Value, Values,
    },
};

/// Per-draw visibility toggles, independent of the values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderableState {
    /// Drawn at all.
    pub visible: bool,
    /// Drawn into the picking pass.
    pub pickable: bool,
    /// Extra opacity multiplier on top of `uAlpha`.
    pub alpha_factor: f32,
}

impl Default for RenderableState {
    fn default() -> Self {
        Self {
            visible: true,
            pickable: true,
            alpha_factor: 1.0,
        }
    }
}

/// A bound draw item.
#[derive(Debug)]
pub struct Renderable {
    id: i32,
    kind: GeometryKind,
    schema: Schema,
    values: Values,
    /// Visibility toggles.
    pub state: RenderableState,
    opaque: bool,
}

impl Renderable {
    /// Compose `GLOBAL + INTERNAL + parts`, bind `values` with `uObjectId =
    /// id`, and validate every non-global slot.
    ///
    /// `opaque` is `false` for kinds that are always alpha blended.
    pub fn new(
        id: i32,
        kind: GeometryKind,
        parts: &[PartialSchema],
        mut values: Values,
        state: RenderableState,
        opaque: bool,
    ) -> Result<Self, ReprError> {
        let mut all = Vec::with_capacity(parts.len() + 2);
        all.push(GLOBAL_UNIFORM_SCHEMA);
        all.push(INTERNAL_SCHEMA);
        all.extend_from_slice(parts);
        let schema = Schema::compose(&all)?;
        values.set("uObjectId", Value::Int(id));
        schema.validate(&values, is_global_uniform)?;
        Ok(Self {
            id,
            kind,
            schema,
            values,
            state,
            opaque,
        })
    }

    /// Object id written to `uObjectId`.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Geometry kind.
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Composed schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Bound values.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Mutable access for in-place updates.
    pub fn values_mut(&mut self) -> &mut Values {
        &mut self.values
    }

    /// Re-check the bound values after in-place updates.
    pub fn validate(&self) -> Result<(), ReprError> {
        self.schema.validate(&self.values, is_global_uniform)
    }

    /// Vertices or indices per instance, read from `drawCount`.
    pub fn draw_count(&self) -> u32 {
        self.values.uint("drawCount")
    }

    /// Instances, read from `instanceCount`.
    pub fn instance_count(&self) -> u32 {
        self.values.uint("instanceCount")
    }

    /// World-frame bound over every instance.
    pub fn bounding_sphere(&self) -> Sphere3D {
        self.values
            .sphere("boundingSphere")
            .unwrap_or(Sphere3D::EMPTY)
    }

    /// Whether the item can be drawn in the opaque pass.
    pub fn is_opaque(&self) -> bool {
        self.opaque
            && self.state.alpha_factor >= 1.0
            && self.values.float("uAlpha").is_none_or(|a| a >= 1.0)
    }

    /// Stable key of every define's current value; equal keys share a
    /// program variant.
    pub fn define_key(&self) -> String {
        let mut key = String::new();
        for name in self.schema.names_of(ResourceKind::Define) {
            let _ = match self.values.get(name) {
                Some(Value::Bool(b)) => write!(key, "{name}={b};"),
                Some(Value::Str(s)) => write!(key, "{name}={s};"),
                Some(Value::Int(i)) => write!(key, "{name}={i};"),
                Some(Value::Float(v)) => write!(key, "{name}={v};"),
                _ => write!(key, "{name};"),
            };
        }
        key
    }
}
