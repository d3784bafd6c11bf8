//! GPU mirror of one renderable's values.
//!
//! [`RenderItem::sync`] walks the renderable's schema and uploads only the
//! slots whose cell version moved since the previous sync. Uniforms are
//! packed into one block of 16-byte slots; defines are folded into a
//! program variant key so callers know when a different pipeline is needed.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;

use super::dynamic_buffer::DynamicBuffer;
use crate::{
    renderable::Renderable,
    schema::{
        builtin::is_global_uniform, AttributeUsage, SchemaEntry, TextureData,
        TextureFilter, TextureImage, TextureKind, UniformKind, Value, Values,
    },
};

/// One 16-byte uniform slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct UniformSlot {
    /// Raw 32-bit words.
    pub words: [u32; 4],
}

impl UniformSlot {
    fn floats(values: &[f32]) -> Self {
        let mut words = [0u32; 4];
        for (w, v) in words.iter_mut().zip(values) {
            *w = v.to_bits();
        }
        Self { words }
    }
}

/// Slots a uniform of `kind` occupies.
pub fn uniform_slot_count(kind: UniformKind) -> usize {
    match kind {
        UniformKind::Mat4 => 4,
        _ => 1,
    }
}

/// Pack `uniforms` in order, each starting on a 16-byte boundary. Missing
/// or mistyped values pack as zeros so offsets never shift.
pub fn pack_uniforms<'a>(
    uniforms: impl IntoIterator<Item = (&'a str, UniformKind)>,
    values: &Values,
) -> Vec<UniformSlot> {
    let mut slots = Vec::new();
    for (name, kind) in uniforms {
        let start = slots.len();
        match (kind, values.get(name)) {
            (UniformKind::Bool, Some(Value::Bool(b))) => slots.push(UniformSlot {
                words: [u32::from(*b), 0, 0, 0],
            }),
            (UniformKind::Int, Some(Value::Int(i))) => {
                slots.push(UniformSlot {
                    words: [u32::from_ne_bytes(i.to_ne_bytes()), 0, 0, 0],
                });
            }
            (UniformKind::Float, Some(Value::Float(f))) => {
                slots.push(UniformSlot::floats(&[*f]));
            }
            (UniformKind::Vec2, Some(Value::Vec2(v))) => {
                slots.push(UniformSlot::floats(&v.to_array()));
            }
            (UniformKind::Vec3, Some(Value::Vec3(v))) => {
                slots.push(UniformSlot::floats(&v.to_array()));
            }
            (UniformKind::Vec4, Some(Value::Vec4(v))) => {
                slots.push(UniformSlot::floats(&v.to_array()));
            }
            (UniformKind::Mat4, Some(Value::Mat4(m))) => {
                for col in m.to_cols_array().chunks(4) {
                    slots.push(UniformSlot::floats(col));
                }
            }
            _ => {}
        }
        slots.resize(start + uniform_slot_count(kind), UniformSlot::zeroed());
    }
    slots
}

/// Per-name record of the last uploaded cell version.
#[derive(Debug, Default)]
pub(crate) struct VersionTracker {
    seen: FxHashMap<&'static str, u64>,
}

impl VersionTracker {
    /// Record `version` for `name`; `true` when it differs from the last
    /// recorded one or `name` was never seen.
    pub(crate) fn changed(&mut self, name: &'static str, version: u64) -> bool {
        self.seen.insert(name, version) != Some(version)
    }
}

/// What one [`RenderItem::sync`] call uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Attribute buffers written.
    pub attributes: usize,
    /// Index buffer written.
    pub elements: bool,
    /// Textures written.
    pub textures: usize,
    /// Uniform block rewritten.
    pub uniforms: bool,
    /// Program variant key changed.
    pub defines_changed: bool,
    /// Some buffer or texture was reallocated; bind groups need rebuilding.
    pub reallocated: bool,
}

impl SyncStats {
    /// Whether nothing was uploaded.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
}

/// GPU buffers and textures mirroring one renderable.
pub struct RenderItem {
    label: String,
    attributes: FxHashMap<&'static str, DynamicBuffer>,
    elements: Option<DynamicBuffer>,
    uniforms: Option<DynamicBuffer>,
    textures: FxHashMap<&'static str, GpuTexture>,
    versions: VersionTracker,
    define_key: String,
}

impl RenderItem {
    /// Empty item; the first [`Self::sync`] uploads everything.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attributes: FxHashMap::default(),
            elements: None,
            uniforms: None,
            textures: FxHashMap::default(),
            versions: VersionTracker::default(),
            define_key: String::new(),
        }
    }

    /// Upload every slot of `renderable` whose version changed.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        renderable: &Renderable,
    ) -> SyncStats {
        let mut stats = SyncStats::default();
        let values = renderable.values();
        let mut uniforms_dirty = false;
        let mut uniform_layout: Vec<(&'static str, UniformKind)> = Vec::new();

        for (name, entry) in renderable.schema().iter() {
            if is_global_uniform(name) {
                continue;
            }
            let Some(cell) = values.cell(name) else {
                continue;
            };
            if let SchemaEntry::Uniform(kind) = entry {
                uniform_layout.push((name, *kind));
            }
            if !self.versions.changed(name, cell.version()) {
                continue;
            }
            match entry {
                SchemaEntry::Attribute { usage, .. } => {
                    let usage = match usage {
                        AttributeUsage::Vertex | AttributeUsage::Instance => {
                            wgpu::BufferUsages::VERTEX
                        }
                        AttributeUsage::Primitive => wgpu::BufferUsages::STORAGE,
                    };
                    if let Some(bytes) = array_bytes(cell.get()) {
                        let label = format!("{}/{name}", self.label);
                        let buffer =
                            self.attributes.entry(name).or_insert_with(|| {
                                DynamicBuffer::new(
                                    device,
                                    &label,
                                    bytes.len(),
                                    usage,
                                )
                            });
                        stats.reallocated |=
                            buffer.write_bytes(device, queue, bytes);
                        stats.attributes += 1;
                    }
                }
                SchemaEntry::Elements(_) => {
                    if let Some(bytes) = array_bytes(cell.get()) {
                        let label = format!("{}/elements", self.label);
                        let buffer = self.elements.get_or_insert_with(|| {
                            DynamicBuffer::new(
                                device,
                                &label,
                                bytes.len(),
                                wgpu::BufferUsages::INDEX,
                            )
                        });
                        stats.reallocated |=
                            buffer.write_bytes(device, queue, bytes);
                        stats.elements = true;
                    }
                }
                SchemaEntry::Texture { kind, filter, .. } => {
                    if let Value::Texture(image) = cell.get() {
                        stats.reallocated |= self
                            .upload_texture(device, queue, name, *kind, *filter, image);
                        stats.textures += 1;
                    }
                }
                SchemaEntry::Uniform(_) => uniforms_dirty = true,
                SchemaEntry::Define(_) => {
                    let key = renderable.define_key();
                    if key != self.define_key {
                        self.define_key = key;
                        stats.defines_changed = true;
                    }
                }
                SchemaEntry::Value(_) => {}
            }
        }

        if uniforms_dirty {
            let slots = pack_uniforms(uniform_layout, values);
            let label = format!("{}/uniforms", self.label);
            let buffer = self.uniforms.get_or_insert_with(|| {
                DynamicBuffer::new(
                    device,
                    &label,
                    slots.len() * size_of::<UniformSlot>(),
                    wgpu::BufferUsages::UNIFORM,
                )
            });
            stats.reallocated |= buffer.write(device, queue, &slots);
            stats.uniforms = true;
        }
        stats
    }

    fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &'static str,
        kind: TextureKind,
        filter: TextureFilter,
        image: &TextureImage,
    ) -> bool {
        let format = texture_format(image);
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: image.depth.max(1),
        };
        let reusable = self
            .textures
            .get(name)
            .is_some_and(|t| t.size == size && t.format == format);
        if !reusable {
            let label = format!("{}/{name}", self.label);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: if kind.is_volume() {
                    wgpu::TextureDimension::D3
                } else {
                    wgpu::TextureDimension::D2
                },
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&Default::default());
            let filter_mode = match filter {
                TextureFilter::Nearest => wgpu::FilterMode::Nearest,
                TextureFilter::Linear => wgpu::FilterMode::Linear,
            };
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&label),
                mag_filter: filter_mode,
                min_filter: filter_mode,
                ..Default::default()
            });
            let _ = self.textures.insert(
                name,
                GpuTexture {
                    texture,
                    view,
                    sampler,
                    size,
                    format,
                },
            );
        }
        if let Some(gpu) = self.textures.get(name) {
            let data = texel_bytes(image);
            let bytes_per_texel = bytes_per_texel(format);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(size.width * bytes_per_texel),
                    rows_per_image: Some(size.height),
                },
                size,
            );
        }
        !reusable
    }

    /// Attribute buffer bound under `name`.
    pub fn attribute(&self, name: &str) -> Option<&wgpu::Buffer> {
        self.attributes.get(name).map(DynamicBuffer::buffer)
    }

    /// Index buffer.
    pub fn elements(&self) -> Option<&wgpu::Buffer> {
        self.elements.as_ref().map(DynamicBuffer::buffer)
    }

    /// Packed per-object uniform block.
    pub fn uniforms(&self) -> Option<&wgpu::Buffer> {
        self.uniforms.as_ref().map(DynamicBuffer::buffer)
    }

    /// View and sampler of the texture bound under `name`.
    pub fn texture(
        &self,
        name: &str,
    ) -> Option<(&wgpu::TextureView, &wgpu::Sampler)> {
        self.textures.get(name).map(|t| (&t.view, &t.sampler))
    }

    /// Current program variant key.
    pub fn define_key(&self) -> &str {
        &self.define_key
    }
}

fn array_bytes(value: &Value) -> Option<&[u8]> {
    match value {
        Value::Float32Array(a) => Some(bytemuck::cast_slice(a)),
        Value::Uint32Array(a) => Some(bytemuck::cast_slice(a)),
        Value::Uint8Array(a) => Some(a),
        _ => None,
    }
}

/// GPU format for `image`. Three-channel data is widened to four since
/// wgpu has no RGB formats.
pub fn texture_format(image: &TextureImage) -> wgpu::TextureFormat {
    match (&image.data, image.channels) {
        (TextureData::U8(_), 1) => wgpu::TextureFormat::R8Unorm,
        (TextureData::U8(_), 2) => wgpu::TextureFormat::Rg8Unorm,
        (TextureData::U8(_), _) => wgpu::TextureFormat::Rgba8Unorm,
        (TextureData::F32(_), 1) => wgpu::TextureFormat::R32Float,
        (TextureData::F32(_), 2) => wgpu::TextureFormat::Rg32Float,
        (TextureData::F32(_), _) => wgpu::TextureFormat::Rgba32Float,
    }
}

fn bytes_per_texel(format: wgpu::TextureFormat) -> u32 {
    match format {
        wgpu::TextureFormat::R8Unorm => 1,
        wgpu::TextureFormat::Rg8Unorm => 2,
        wgpu::TextureFormat::R32Float => 4,
        wgpu::TextureFormat::Rg32Float => 8,
        wgpu::TextureFormat::Rgba32Float => 16,
        _ => 4,
    }
}

/// Upload bytes for `image`, widening RGB to RGBA (alpha = 1).
pub fn texel_bytes(image: &TextureImage) -> Cow<'_, [u8]> {
    match (&image.data, image.channels) {
        (TextureData::U8(d), 3) => Cow::Owned(
            d.chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], u8::MAX])
                .collect(),
        ),
        (TextureData::U8(d), _) => Cow::Borrowed(d),
        (TextureData::F32(d), 3) => {
            let wide: Vec<f32> = d
                .chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 1.0])
                .collect();
            Cow::Owned(bytemuck::cast_slice(&wide).to_vec())
        }
        (TextureData::F32(d), _) => Cow::Borrowed(bytemuck::cast_slice(d)),
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;

    #[test]
    fn uniforms_pack_into_aligned_slots() {
        let mut values = Values::new();
        values.insert("uAlpha", Value::Float(0.5));
        values.insert("uColor", Value::Vec3(Vec3::new(1.0, 2.0, 3.0)));
        values.insert("uTransform", Value::Mat4(Mat4::IDENTITY));
        let slots = pack_uniforms(
            [
                ("uAlpha", UniformKind::Float),
                ("uMissing", UniformKind::Int),
                ("uColor", UniformKind::Vec3),
                ("uTransform", UniformKind::Mat4),
            ],
            &values,
        );
        assert_eq!(slots.len(), 7);
        assert_eq!(slots[0].words[0], 0.5f32.to_bits());
        assert_eq!(slots[1], UniformSlot::zeroed());
        assert_eq!(slots[2].words[2], 3.0f32.to_bits());
        assert_eq!(slots[3].words[0], 1.0f32.to_bits());
        assert_eq!(slots[4].words[1], 1.0f32.to_bits());
        assert_eq!(bytemuck::cast_slice::<_, u8>(&slots).len(), 7 * 16);
    }

    #[test]
    fn mistyped_uniform_keeps_its_slot() {
        let mut values = Values::new();
        values.insert("uModel", Value::Float(1.0));
        let slots = pack_uniforms([("uModel", UniformKind::Mat4)], &values);
        assert_eq!(slots, vec![UniformSlot::zeroed(); 4]);
    }

    #[test]
    fn tracker_reports_only_moved_versions() {
        let mut tracker = VersionTracker::default();
        assert!(tracker.changed("aPosition", 0));
        assert!(!tracker.changed("aPosition", 0));
        assert!(tracker.changed("aPosition", 1));
        assert!(tracker.changed("aNormal", 1));
    }

    #[test]
    fn rgb_textures_are_widened() {
        let image = TextureImage::for_items_u8(1, 3);
        assert_eq!(texture_format(&image), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(texel_bytes(&image).as_ref(), &[0, 0, 0, 255]);

        let sizes = TextureImage::for_items_f32(4, 1);
        assert_eq!(texture_format(&sizes), wgpu::TextureFormat::R32Float);
        assert_eq!(texel_bytes(&sizes).len(), 16);
    }
}
