//! Partial schemas shared by every geometry kind.
//!
//! Geometry kinds compose these with their own attribute schema, e.g. a mesh
//! renderable is `GLOBAL_UNIFORM_SCHEMA + INTERNAL_SCHEMA + BASE_SCHEMA +
//! MESH_SCHEMA`.

use super::{
    ArrayKind, AttributeUsage, DefineKind, PartialSchema, SchemaEntry,
    TextureFilter, TextureFormat, TextureKind, UniformKind, ValueKind,
};

/// Allowed `dColorType` values.
pub const COLOR_TYPES: &[&str] = &["uniform", "instance", "group", "groupInstance"];

/// Allowed `dSizeType` values.
pub const SIZE_TYPES: &[&str] = &["uniform", "instance", "group", "groupInstance"];

/// Process-wide uniforms shared by every draw item. Supplied by the
/// renderer at draw time, never by a per-object values record.
pub const GLOBAL_UNIFORM_SCHEMA: PartialSchema = &[
    ("uModel", SchemaEntry::Uniform(UniformKind::Mat4)),
    ("uView", SchemaEntry::Uniform(UniformKind::Mat4)),
    ("uProjection", SchemaEntry::Uniform(UniformKind::Mat4)),
    ("uCameraPosition", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("uPixelRatio", SchemaEntry::Uniform(UniformKind::Float)),
    ("uViewportHeight", SchemaEntry::Uniform(UniformKind::Float)),
    ("uLightIntensity", SchemaEntry::Uniform(UniformKind::Float)),
    ("uAmbientIntensity", SchemaEntry::Uniform(UniformKind::Float)),
    ("uFogNear", SchemaEntry::Uniform(UniformKind::Float)),
    ("uFogFar", SchemaEntry::Uniform(UniformKind::Float)),
    ("uFogColor", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("uHighlightColor", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("uSelectColor", SchemaEntry::Uniform(UniformKind::Vec3)),
];

/// Per-object values injected by the renderable itself.
pub const INTERNAL_SCHEMA: PartialSchema =
    &[("uObjectId", SchemaEntry::Uniform(UniformKind::Int))];

/// Instancing, counts, bounds, color and marker slots common to all
/// structural geometry kinds.
pub const BASE_SCHEMA: PartialSchema = &[
    ("drawCount", SchemaEntry::Value(ValueKind::Uint)),
    ("instanceCount", SchemaEntry::Value(ValueKind::Uint)),
    ("matrix", SchemaEntry::Value(ValueKind::Mat4)),
    ("boundingSphere", SchemaEntry::Value(ValueKind::Sphere)),
    ("invariantBoundingSphere", SchemaEntry::Value(ValueKind::Sphere)),
    (
        "aInstance",
        SchemaEntry::attribute(ArrayKind::Float32, 1, AttributeUsage::Instance),
    ),
    (
        "aTransform",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            16,
            AttributeUsage::Instance,
        ),
    ),
    ("uInstanceCount", SchemaEntry::Uniform(UniformKind::Int)),
    ("uGroupCount", SchemaEntry::Uniform(UniformKind::Int)),
    ("uAlpha", SchemaEntry::Uniform(UniformKind::Float)),
    ("dUseFog", SchemaEntry::Define(DefineKind::Boolean)),
    ("uColor", SchemaEntry::Uniform(UniformKind::Vec3)),
    (
        "tColor",
        SchemaEntry::texture(
            TextureKind::ImageUint8,
            TextureFormat::Rgb,
            TextureFilter::Nearest,
        ),
    ),
    ("uColorTexDim", SchemaEntry::Uniform(UniformKind::Vec2)),
    ("dColorType", SchemaEntry::Define(DefineKind::String(COLOR_TYPES))),
    (
        "tMarker",
        SchemaEntry::texture(
            TextureKind::ImageUint8,
            TextureFormat::Alpha,
            TextureFilter::Nearest,
        ),
    ),
    ("uMarkerTexDim", SchemaEntry::Uniform(UniformKind::Vec2)),
];

/// Per-group size lookup for kinds whose radii are resolved at draw time.
pub const SIZE_SCHEMA: PartialSchema = &[
    ("uSize", SchemaEntry::Uniform(UniformKind::Float)),
    (
        "tSize",
        SchemaEntry::texture(
            TextureKind::ImageFloat32,
            TextureFormat::Alpha,
            TextureFilter::Nearest,
        ),
    ),
    ("uSizeTexDim", SchemaEntry::Uniform(UniformKind::Vec2)),
    ("dSizeType", SchemaEntry::Define(DefineKind::String(SIZE_TYPES))),
];

/// Triangle mesh attributes.
pub const MESH_SCHEMA: PartialSchema = &[
    (
        "aPosition",
        SchemaEntry::attribute(ArrayKind::Float32, 3, AttributeUsage::Vertex),
    ),
    (
        "aNormal",
        SchemaEntry::attribute(ArrayKind::Float32, 3, AttributeUsage::Vertex),
    ),
    (
        "aGroup",
        SchemaEntry::attribute(ArrayKind::Float32, 1, AttributeUsage::Vertex),
    ),
    ("elements", SchemaEntry::Elements(ArrayKind::Uint32)),
    ("dFlatShaded", SchemaEntry::Define(DefineKind::Boolean)),
    ("dDoubleSided", SchemaEntry::Define(DefineKind::Boolean)),
];

/// Cylinder impostor primitive attributes.
pub const CYLINDERS_SCHEMA: PartialSchema = &[
    (
        "aStart",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            3,
            AttributeUsage::Primitive,
        ),
    ),
    (
        "aEnd",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            3,
            AttributeUsage::Primitive,
        ),
    ),
    (
        "aScale",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            1,
            AttributeUsage::Primitive,
        ),
    ),
    (
        "aCap",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            1,
            AttributeUsage::Primitive,
        ),
    ),
    (
        "aGroup",
        SchemaEntry::attribute(
            ArrayKind::Float32,
            1,
            AttributeUsage::Primitive,
        ),
    ),
    ("uSizeFactor", SchemaEntry::Uniform(UniformKind::Float)),
    ("dDoubleSided", SchemaEntry::Define(DefineKind::Boolean)),
];

/// Whether `name` is supplied by the process-wide global uniforms.
pub fn is_global_uniform(name: &str) -> bool {
    GLOBAL_UNIFORM_SCHEMA.iter().any(|(n, _)| *n == name)
}
