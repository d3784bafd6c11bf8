//! Ray-marched volume renderables.
//!
//! The volume is drawn as its bounding box; the fragment stage marches
//! through `tGridTex` and maps density through `tTransferTex`. The grid can
//! be packed into 2D texture tiles or uploaded as a real 3D texture; the two
//! variants override `dGridTexType` and `tGridTex` of the base schema.

use glam::{Mat4, UVec3, Vec3};

use super::{Renderable, RenderableState};
use crate::{
    error::ReprError,
    geometry::GeometryKind,
    schema::{
        ArrayKind, AttributeUsage, DefineKind, PartialSchema, SchemaEntry,
        TextureData, TextureFilter, TextureFormat, TextureImage, TextureKind,
        UniformKind, Value, ValueKind, Values,
    },
};

/// Allowed `dRenderMode` values.
pub const RENDER_MODES: &[&str] = &["isosurface", "volume"];

/// Texels in the transfer function lookup.
pub const TRANSFER_TEXTURE_WIDTH: u32 = 256;

/// Slots shared by both grid layouts.
pub const DIRECT_VOLUME_BASE_SCHEMA: PartialSchema = &[
    ("drawCount", SchemaEntry::Value(ValueKind::Uint)),
    ("instanceCount", SchemaEntry::Value(ValueKind::Uint)),
    (
        "aPosition",
        SchemaEntry::attribute(ArrayKind::Float32, 3, AttributeUsage::Vertex),
    ),
    ("elements", SchemaEntry::Elements(ArrayKind::Uint32)),
    ("uAlpha", SchemaEntry::Uniform(UniformKind::Float)),
    ("dUseFog", SchemaEntry::Define(DefineKind::Boolean)),
    ("uIsoValue", SchemaEntry::Uniform(UniformKind::Float)),
    ("uBboxMin", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("uBboxMax", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("uBboxSize", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("dMaxSteps", SchemaEntry::Define(DefineKind::Number)),
    ("uTransform", SchemaEntry::Uniform(UniformKind::Mat4)),
    ("uGridDim", SchemaEntry::Uniform(UniformKind::Vec3)),
    ("dRenderMode", SchemaEntry::Define(DefineKind::String(RENDER_MODES))),
    (
        "tTransferTex",
        SchemaEntry::texture(
            TextureKind::ImageUint8,
            TextureFormat::Rgba,
            TextureFilter::Linear,
        ),
    ),
    ("dGridTexType", SchemaEntry::Define(DefineKind::String(&["2d", "3d"]))),
];

/// Grid packed into tiles of a 2D texture.
pub const DIRECT_VOLUME_2D_SCHEMA: PartialSchema = &[
    ("dGridTexType", SchemaEntry::Define(DefineKind::String(&["2d"]))),
    ("uGridTexDim", SchemaEntry::Uniform(UniformKind::Vec2)),
    (
        "tGridTex",
        SchemaEntry::texture(
            TextureKind::ImageUint8,
            TextureFormat::Rgba,
            TextureFilter::Linear,
        ),
    ),
];

/// Grid uploaded as a 3D texture.
pub const DIRECT_VOLUME_3D_SCHEMA: PartialSchema = &[
    ("dGridTexType", SchemaEntry::Define(DefineKind::String(&["3d"]))),
    (
        "tGridTex",
        SchemaEntry::texture(
            TextureKind::VolumeUint8,
            TextureFormat::Rgba,
            TextureFilter::Linear,
        ),
    ),
];

/// Ray-marching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Shade the first crossing of `uIsoValue`.
    #[default]
    Isosurface,
    /// Accumulate color and opacity along the ray.
    Volume,
}

impl RenderMode {
    fn define(self) -> &'static str {
        match self {
            Self::Isosurface => "isosurface",
            Self::Volume => "volume",
        }
    }
}

/// Grid placement and marching parameters common to both layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectVolumeGrid {
    /// Grid-space box minimum.
    pub bbox_min: Vec3,
    /// Grid-space box maximum.
    pub bbox_max: Vec3,
    /// Grid dimensions in cells.
    pub dim: UVec3,
    /// Grid-to-model transform.
    pub transform: Mat4,
    /// Iso level in [0, 1] for isosurface mode.
    pub iso_value: f32,
    /// Marching mode.
    pub render_mode: RenderMode,
    /// Maximum march steps per ray.
    pub max_steps: i32,
    /// Opacity.
    pub alpha: f32,
    /// Fog on or off.
    pub use_fog: bool,
}

impl DirectVolumeGrid {
    /// Values of [`DIRECT_VOLUME_BASE_SCHEMA`], with the bounding box as
    /// geometry and `transfer` as the density lookup.
    pub fn base_values(&self, transfer: TextureImage) -> Values {
        let (positions, indices) = box_mesh(self.bbox_min, self.bbox_max);
        let mut values = Values::new();
        values.insert("drawCount", Value::Uint(indices.len() as u32));
        values.insert("instanceCount", Value::Uint(1));
        values.insert("aPosition", Value::Float32Array(positions));
        values.insert("elements", Value::Uint32Array(indices));
        values.insert("uAlpha", Value::Float(self.alpha));
        values.insert("dUseFog", Value::Bool(self.use_fog));
        values.insert("uIsoValue", Value::Float(self.iso_value));
        values.insert("uBboxMin", Value::Vec3(self.bbox_min));
        values.insert("uBboxMax", Value::Vec3(self.bbox_max));
        values.insert("uBboxSize", Value::Vec3(self.bbox_max - self.bbox_min));
        values.insert("dMaxSteps", Value::Int(self.max_steps));
        values.insert("uTransform", Value::Mat4(self.transform));
        values.insert("uGridDim", Value::Vec3(self.dim.as_vec3()));
        values.insert(
            "dRenderMode",
            Value::Str(self.render_mode.define().to_owned()),
        );
        values.insert("tTransferTex", Value::Texture(transfer));
        values
    }
}

/// Renderable sampling a grid packed into a 2D texture. Never opaque.
pub fn direct_volume_2d_renderable(
    id: i32,
    grid: &DirectVolumeGrid,
    grid_texture: TextureImage,
    transfer: TextureImage,
    state: RenderableState,
) -> Result<Renderable, ReprError> {
    let mut values = grid.base_values(transfer);
    values.insert("dGridTexType", Value::Str("2d".to_owned()));
    values.insert("uGridTexDim", Value::Vec2(grid_texture.dim()));
    values.insert("tGridTex", Value::Texture(grid_texture));
    Renderable::new(
        id,
        GeometryKind::DirectVolume,
        &[DIRECT_VOLUME_BASE_SCHEMA, DIRECT_VOLUME_2D_SCHEMA],
        values,
        state,
        false,
    )
}

/// Renderable sampling a 3D texture. Never opaque.
pub fn direct_volume_3d_renderable(
    id: i32,
    grid: &DirectVolumeGrid,
    grid_texture: TextureImage,
    transfer: TextureImage,
    state: RenderableState,
) -> Result<Renderable, ReprError> {
    let mut values = grid.base_values(transfer);
    values.insert("dGridTexType", Value::Str("3d".to_owned()));
    values.insert("tGridTex", Value::Texture(grid_texture));
    Renderable::new(
        id,
        GeometryKind::DirectVolume,
        &[DIRECT_VOLUME_BASE_SCHEMA, DIRECT_VOLUME_3D_SCHEMA],
        values,
        state,
        false,
    )
}

/// RGBA lookup of [`TRANSFER_TEXTURE_WIDTH`]×1 texels: constant `color`,
/// alpha interpolated linearly between `(density, alpha)` control points.
/// Densities outside the first/last point take that point's alpha.
pub fn transfer_texture(color: Vec3, points: &[(f32, f32)]) -> TextureImage {
    let rgb = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let alpha_at = |x: f32| -> f32 {
        let Some(first) = sorted.first() else {
            return 0.0;
        };
        if x <= first.0 {
            return first.1;
        }
        for w in sorted.windows(2) {
            let ((x0, a0), (x1, a1)) = (w[0], w[1]);
            if x <= x1 {
                let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 1.0 };
                return a0 + (a1 - a0) * t;
            }
        }
        sorted.last().map_or(0.0, |p| p.1)
    };
    let mut data = Vec::with_capacity(TRANSFER_TEXTURE_WIDTH as usize * 4);
    for i in 0..TRANSFER_TEXTURE_WIDTH {
        let x = i as f32 / (TRANSFER_TEXTURE_WIDTH - 1) as f32;
        let a = (alpha_at(x).clamp(0.0, 1.0) * 255.0).round();
        data.extend_from_slice(&[rgb.x as u8, rgb.y as u8, rgb.z as u8, a as u8]);
    }
    TextureImage {
        width: TRANSFER_TEXTURE_WIDTH,
        height: 1,
        depth: 1,
        channels: 4,
        data: TextureData::U8(data),
    }
}

/// Zero-filled RGBA volume of `dim` texels.
pub fn empty_volume_texture(dim: UVec3) -> TextureImage {
    let len = (dim.x * dim.y * dim.z * 4) as usize;
    TextureImage {
        width: dim.x,
        height: dim.y,
        depth: dim.z,
        channels: 4,
        data: TextureData::U8(vec![0; len]),
    }
}

/// Closed box: 8 corners, 12 outward-facing triangles.
fn box_mesh(min: Vec3, max: Vec3) -> (Vec<f32>, Vec<u32>) {
    let mut positions = Vec::with_capacity(24);
    for i in 0..8u32 {
        let corner = Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
        positions.extend_from_slice(&corner.to_array());
    }
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    (positions, indices)
}
