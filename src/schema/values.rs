//! Concrete values bound to schema names.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use super::value_cell::ValueCell;
use crate::geometry::Sphere3D;

/// Texel storage of a [`TextureImage`].
#[derive(Debug, Clone, PartialEq)]
pub enum TextureData {
    /// Normalized 8-bit components.
    U8(Vec<u8>),
    /// 32-bit float components.
    F32(Vec<f32>),
}

impl TextureData {
    /// Number of stored components.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(d) => d.len(),
            Self::F32(d) => d.len(),
        }
    }

    /// Whether no components are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CPU-side texture payload: 2D images use `depth == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels (1 for 2D images).
    pub depth: u32,
    /// Components per texel.
    pub channels: u32,
    /// Texel components, row-major, tightly packed.
    pub data: TextureData,
}

impl TextureImage {
    /// Near-square 2D dimensions able to hold `count` items.
    ///
    /// Always at least 1×1 so empty geometry still binds a valid texture.
    pub fn dimensions_for(count: usize) -> (u32, u32) {
        let count = count.max(1);
        let width = (count as f64).sqrt().ceil() as usize;
        let height = count.div_ceil(width);
        (width as u32, height as u32)
    }

    /// 2D 8-bit image sized for `count` items, zero filled.
    pub fn for_items_u8(count: usize, channels: u32) -> Self {
        let (width, height) = Self::dimensions_for(count);
        let len = (width * height * channels) as usize;
        Self {
            width,
            height,
            depth: 1,
            channels,
            data: TextureData::U8(vec![0; len]),
        }
    }

    /// 2D float image sized for `count` items, zero filled.
    pub fn for_items_f32(count: usize, channels: u32) -> Self {
        let (width, height) = Self::dimensions_for(count);
        let len = (width * height * channels) as usize;
        Self {
            width,
            height,
            depth: 1,
            channels,
            data: TextureData::F32(vec![0.0; len]),
        }
    }

    /// Components required by the declared dimensions.
    pub fn expected_len(&self) -> usize {
        (self.width * self.height * self.depth * self.channels) as usize
    }

    /// Dimensions as a `uXxxTexDim` uniform value.
    pub fn dim(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// A single GPU-bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean uniform or define.
    Bool(bool),
    /// Signed integer uniform.
    Int(i32),
    /// Unsigned count (draw/instance counts).
    Uint(u32),
    /// Float uniform or numeric define.
    Float(f32),
    /// 2-component vector.
    Vec2(Vec2),
    /// 3-component vector.
    Vec3(Vec3),
    /// 4-component vector.
    Vec4(Vec4),
    /// 4×4 matrix.
    Mat4(Mat4),
    /// String define.
    Str(String),
    /// Bounding sphere.
    Sphere(Sphere3D),
    /// Float attribute array.
    Float32Array(Vec<f32>),
    /// Unsigned attribute or index array.
    Uint32Array(Vec<u32>),
    /// Byte attribute array.
    Uint8Array(Vec<u8>),
    /// Texture payload.
    Texture(TextureImage),
}

impl Value {
    /// Stable type name used in mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Str(_) => "string",
            Self::Sphere(_) => "sphere",
            Self::Float32Array(_) => "float32[]",
            Self::Uint32Array(_) => "uint32[]",
            Self::Uint8Array(_) => "uint8[]",
            Self::Texture(_) => "texture",
        }
    }
}

/// Name-keyed record of value cells satisfying one schema.
#[derive(Debug, Clone, Default)]
pub struct Values {
    cells: FxHashMap<&'static str, ValueCell<Value>>,
}

impl Values {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh cell under `name`, replacing any previous binding.
    pub fn insert(&mut self, name: &'static str, value: Value) {
        drop(self.cells.insert(name, ValueCell::new(value)));
    }

    /// Move every cell of `other` into this record.
    pub fn extend(&mut self, other: Self) {
        self.cells.extend(other.cells);
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    /// Cell bound under `name`.
    pub fn cell(&self, name: &str) -> Option<&ValueCell<Value>> {
        self.cells.get(name)
    }

    /// Mutable cell bound under `name`.
    pub fn cell_mut(&mut self, name: &str) -> Option<&mut ValueCell<Value>> {
        self.cells.get_mut(name)
    }

    /// Current value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.get(name).map(ValueCell::get)
    }

    /// Version of the cell bound under `name`.
    pub fn version(&self, name: &str) -> Option<u64> {
        self.cells.get(name).map(ValueCell::version)
    }

    /// Unconditional write; binds a new cell if `name` is unbound.
    pub fn set(&mut self, name: &'static str, value: Value) {
        match self.cells.get_mut(name) {
            Some(cell) => cell.update(value),
            None => self.insert(name, value),
        }
    }

    /// Write only when the value differs. Returns `true` when written.
    pub fn set_if_changed(&mut self, name: &'static str, value: Value) -> bool {
        match self.cells.get_mut(name) {
            Some(cell) => cell.update_if_changed(value),
            None => {
                self.insert(name, value);
                true
            }
        }
    }

    /// Swap in `value` and return the previous value for reuse.
    pub fn replace(&mut self, name: &'static str, value: Value) -> Option<Value> {
        match self.cells.get_mut(name) {
            Some(cell) => Some(cell.replace(value)),
            None => {
                self.insert(name, value);
                None
            }
        }
    }

    /// Bound names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.keys().copied()
    }

    /// `(name, version)` for every bound cell.
    pub fn versions(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.cells.iter().map(|(name, cell)| (*name, cell.version()))
    }

    /// Sum of all cell versions; equal sums across two observations of the
    /// same record mean nothing was written in between.
    pub fn version_sum(&self) -> u64 {
        self.cells.values().map(ValueCell::version).sum()
    }

    /// Unsigned count bound under `name`, or 0.
    pub fn uint(&self, name: &str) -> u32 {
        match self.get(name) {
            Some(Value::Uint(v)) => *v,
            _ => 0,
        }
    }

    /// Float bound under `name`.
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(Value::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Bounding sphere bound under `name`.
    pub fn sphere(&self, name: &str) -> Option<Sphere3D> {
        match self.get(name) {
            Some(Value::Sphere(s)) => Some(*s),
            _ => None,
        }
    }

    /// Float array bound under `name`.
    pub fn f32_array(&self, name: &str) -> Option<&[f32]> {
        match self.get(name) {
            Some(Value::Float32Array(a)) => Some(a),
            _ => None,
        }
    }

    /// Unsigned array bound under `name`.
    pub fn u32_array(&self, name: &str) -> Option<&[u32]> {
        match self.get(name) {
            Some(Value::Uint32Array(a)) => Some(a),
            _ => None,
        }
    }

    /// Texture bound under `name`.
    pub fn texture(&self, name: &str) -> Option<&TextureImage> {
        match self.get(name) {
            Some(Value::Texture(t)) => Some(t),
            _ => None,
        }
    }
}
