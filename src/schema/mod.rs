//! Declarative mapping from symbolic names to GPU resource slots.
//!
//! A geometry kind declares its inputs as a list of partial schemas
//! (global uniforms, internal values, base instancing/theming slots, and its
//! own attributes). [`Schema::compose`] merges them into one validated
//! schema at initialization time, and [`Schema::validate`] checks that a
//! [`Values`] record satisfies it before anything is bound.

pub mod builtin;
pub mod value_cell;
pub mod values;

pub use value_cell::ValueCell;
pub use values::{TextureData, TextureImage, Value, Values};

use crate::error::{MismatchReason, ReprError};

/// Broad resource class of a schema slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Per-vertex, per-instance, or per-primitive array.
    Attribute,
    /// Per-draw scalar, vector, or matrix.
    Uniform,
    /// Compile-time constant baked into a program variant.
    Define,
    /// Sampled 2D image or 3D volume.
    Texture,
    /// Index buffer.
    Elements,
    /// CPU-side bookkeeping value (counts, bounds) never uploaded directly.
    Value,
}

/// Element type of an array slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// `f32` components.
    Float32,
    /// `u32` components.
    Uint32,
    /// `u8` components.
    Uint8,
}

impl ArrayKind {
    fn type_name(self) -> &'static str {
        match self {
            Self::Float32 => "float32[]",
            Self::Uint32 => "uint32[]",
            Self::Uint8 => "uint8[]",
        }
    }

    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Float32, Value::Float32Array(_))
                | (Self::Uint32, Value::Uint32Array(_))
                | (Self::Uint8, Value::Uint8Array(_))
        )
    }
}

/// How often an attribute advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUsage {
    /// Once per vertex.
    Vertex,
    /// Once per unit instance (symmetry copy).
    Instance,
    /// Once per impostor primitive; read from a storage buffer by primitive
    /// index.
    Primitive,
}

/// Shape of a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    /// `bool`.
    Bool,
    /// `i32`.
    Int,
    /// `f32`.
    Float,
    /// `vec2<f32>`.
    Vec2,
    /// `vec3<f32>`.
    Vec3,
    /// `vec4<f32>`.
    Vec4,
    /// `mat4x4<f32>`.
    Mat4,
}

impl UniformKind {
    fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat4 => "mat4",
        }
    }

    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Vec2, Value::Vec2(_))
                | (Self::Vec3, Value::Vec3(_))
                | (Self::Vec4, Value::Vec4(_))
                | (Self::Mat4, Value::Mat4(_))
        )
    }
}

/// Type of a define slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineKind {
    /// On/off switch.
    Boolean,
    /// Numeric constant.
    Number,
    /// One of a fixed set of strings; an empty set accepts any string.
    String(&'static [&'static str]),
}

/// Dimensionality and texel type of a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// 2D, 8-bit normalized.
    ImageUint8,
    /// 2D, 32-bit float.
    ImageFloat32,
    /// 3D, 8-bit normalized.
    VolumeUint8,
    /// 3D, 32-bit float.
    VolumeFloat32,
}

impl TextureKind {
    /// Whether the texture is a 3D volume.
    pub fn is_volume(self) -> bool {
        matches!(self, Self::VolumeUint8 | Self::VolumeFloat32)
    }

    fn is_float(self) -> bool {
        matches!(self, Self::ImageFloat32 | Self::VolumeFloat32)
    }
}

/// Channel layout of a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single channel.
    Alpha,
    /// Three channels.
    Rgb,
    /// Four channels.
    Rgba,
}

impl TextureFormat {
    /// Components per texel.
    pub fn channels(self) -> u32 {
        match self {
            Self::Alpha => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Sampler filter of a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// Type of a CPU-side value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Unsigned count.
    Uint,
    /// Boolean flag.
    Bool,
    /// Float scalar.
    Float,
    /// 4×4 matrix.
    Mat4,
    /// Bounding sphere.
    Sphere,
}

impl ValueKind {
    fn type_name(self) -> &'static str {
        match self {
            Self::Uint => "uint",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Mat4 => "mat4",
            Self::Sphere => "sphere",
        }
    }

    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Uint, Value::Uint(_))
                | (Self::Bool, Value::Bool(_))
                | (Self::Float, Value::Float(_))
                | (Self::Mat4, Value::Mat4(_))
                | (Self::Sphere, Value::Sphere(_))
        )
    }
}

/// One named slot: resource kind plus type/arity/usage metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEntry {
    /// Vertex/instance/primitive array.
    Attribute {
        /// Component type.
        kind: ArrayKind,
        /// Components per item.
        item_size: u32,
        /// Advance rate.
        usage: AttributeUsage,
    },
    /// Per-draw uniform.
    Uniform(UniformKind),
    /// Compile-time define.
    Define(DefineKind),
    /// Sampled texture.
    Texture {
        /// Dimensionality and texel type.
        kind: TextureKind,
        /// Channel layout.
        format: TextureFormat,
        /// Sampler filter.
        filter: TextureFilter,
    },
    /// Index buffer.
    Elements(ArrayKind),
    /// CPU-side value.
    Value(ValueKind),
}

impl SchemaEntry {
    /// Attribute slot.
    pub const fn attribute(
        kind: ArrayKind,
        item_size: u32,
        usage: AttributeUsage,
    ) -> Self {
        Self::Attribute {
            kind,
            item_size,
            usage,
        }
    }

    /// Texture slot.
    pub const fn texture(
        kind: TextureKind,
        format: TextureFormat,
        filter: TextureFilter,
    ) -> Self {
        Self::Texture {
            kind,
            format,
            filter,
        }
    }

    /// Broad resource class.
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            Self::Attribute { .. } => ResourceKind::Attribute,
            Self::Uniform(_) => ResourceKind::Uniform,
            Self::Define(_) => ResourceKind::Define,
            Self::Texture { .. } => ResourceKind::Texture,
            Self::Elements(_) => ResourceKind::Elements,
            Self::Value(_) => ResourceKind::Value,
        }
    }

    /// Check that `value` can be bound to this slot.
    pub fn check(&self, value: &Value) -> Result<(), MismatchReason> {
        let wrong = |expected: &'static str| MismatchReason::WrongType {
            expected,
            found: value.type_name(),
        };
        match *self {
            Self::Attribute { kind, .. } | Self::Elements(kind) => {
                if kind.matches(value) {
                    Ok(())
                } else {
                    Err(wrong(kind.type_name()))
                }
            }
            Self::Uniform(kind) => {
                if kind.matches(value) {
                    Ok(())
                } else {
                    Err(wrong(kind.type_name()))
                }
            }
            Self::Value(kind) => {
                if kind.matches(value) {
                    Ok(())
                } else {
                    Err(wrong(kind.type_name()))
                }
            }
            Self::Define(kind) => check_define(kind, value),
            Self::Texture { kind, format, .. } => {
                check_texture(kind, format, value)
            }
        }
    }
}

fn check_define(kind: DefineKind, value: &Value) -> Result<(), MismatchReason> {
    match (kind, value) {
        (DefineKind::Boolean, Value::Bool(_))
        | (DefineKind::Number, Value::Float(_) | Value::Int(_)) => Ok(()),
        (DefineKind::String(options), Value::Str(s)) => {
            if options.is_empty() || options.contains(&s.as_str()) {
                Ok(())
            } else {
                Err(MismatchReason::InvalidOption(s.clone()))
            }
        }
        (DefineKind::Boolean, _) => Err(MismatchReason::WrongType {
            expected: "bool",
            found: value.type_name(),
        }),
        (DefineKind::Number, _) => Err(MismatchReason::WrongType {
            expected: "float",
            found: value.type_name(),
        }),
        (DefineKind::String(_), _) => Err(MismatchReason::WrongType {
            expected: "string",
            found: value.type_name(),
        }),
    }
}

fn check_texture(
    kind: TextureKind,
    format: TextureFormat,
    value: &Value,
) -> Result<(), MismatchReason> {
    let Value::Texture(image) = value else {
        return Err(MismatchReason::WrongType {
            expected: "texture",
            found: value.type_name(),
        });
    };
    let data_ok = match image.data {
        TextureData::U8(_) => !kind.is_float(),
        TextureData::F32(_) => kind.is_float(),
    };
    if !data_ok || image.channels != format.channels() {
        return Err(MismatchReason::WrongType {
            expected: "texture with matching texel layout",
            found: "texture",
        });
    }
    if !kind.is_volume() && image.depth != 1 {
        return Err(MismatchReason::WrongType {
            expected: "2D texture",
            found: "3D texture",
        });
    }
    if image.data.len() != image.expected_len() {
        return Err(MismatchReason::TextureSize {
            expected: image.expected_len(),
            found: image.data.len(),
        });
    }
    Ok(())
}

/// A partial schema as declared by one concern.
pub type PartialSchema = &'static [(&'static str, SchemaEntry)];

/// Merged, validated schema for one geometry/draw kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entries: Vec<(&'static str, SchemaEntry)>,
}

impl Schema {
    /// Merge `parts` in order.
    ///
    /// A later declaration of an existing name overrides it when both share
    /// a resource kind; a differing resource kind is a
    /// [`ReprError::SchemaConflict`].
    pub fn compose(parts: &[PartialSchema]) -> Result<Self, ReprError> {
        let mut entries: Vec<(&'static str, SchemaEntry)> = Vec::new();
        for part in parts {
            for &(name, entry) in *part {
                match entries.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, existing)) => {
                        if existing.resource_kind() != entry.resource_kind() {
                            return Err(ReprError::SchemaConflict {
                                name,
                                existing: existing.resource_kind(),
                                incoming: entry.resource_kind(),
                            });
                        }
                        *existing = entry;
                    }
                    None => entries.push((name, entry)),
                }
            }
        }
        Ok(Self { entries })
    }

    /// Entry declared under `name`.
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, e)| e)
    }

    /// Entries in declaration order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&'static str, &SchemaEntry)> + '_ {
        self.entries.iter().map(|(n, e)| (*n, e))
    }

    /// Names of every entry of the given resource kind, in declaration
    /// order.
    pub fn names_of(
        &self,
        kind: ResourceKind,
    ) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| e.resource_kind() == kind)
            .map(|(n, _)| *n)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schema declares nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that `values` binds every entry not excluded by `external`
    /// with a value of the declared type.
    pub fn validate(
        &self,
        values: &Values,
        external: impl Fn(&str) -> bool,
    ) -> Result<(), ReprError> {
        for (name, entry) in self.iter() {
            if external(name) {
                continue;
            }
            let Some(value) = values.get(name) else {
                return Err(ReprError::SchemaMismatch {
                    name,
                    reason: MismatchReason::Missing,
                });
            };
            entry
                .check(value)
                .map_err(|reason| ReprError::SchemaMismatch { name, reason })?;
        }
        Ok(())
    }
}
