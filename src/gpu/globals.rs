//! Process-wide uniforms shared by every draw item.

use glam::{Mat4, Vec3};

use super::{
    dynamic_buffer::DynamicBuffer,
    render_item::{pack_uniforms, UniformSlot},
};
use crate::schema::{builtin::GLOBAL_UNIFORM_SCHEMA, SchemaEntry, Value, Values};

/// Camera, lighting and fog state supplied at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalUniforms {
    /// Scene model matrix.
    pub model: Mat4,
    /// View matrix.
    pub view: Mat4,
    /// Projection matrix.
    pub projection: Mat4,
    /// Eye position in world space.
    pub camera_position: Vec3,
    /// Device pixel ratio.
    pub pixel_ratio: f32,
    /// Viewport height in pixels; sizes impostor quads.
    pub viewport_height: f32,
    /// Directional light intensity.
    pub light_intensity: f32,
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Fog start distance.
    pub fog_near: f32,
    /// Fog end distance.
    pub fog_far: f32,
    /// Fog color.
    pub fog_color: Vec3,
    /// Hover highlight color.
    pub highlight_color: Vec3,
    /// Selection color.
    pub select_color: Vec3,
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            pixel_ratio: 1.0,
            viewport_height: 1.0,
            light_intensity: 0.6,
            ambient_intensity: 0.4,
            fog_near: 0.0,
            fog_far: 100.0,
            fog_color: Vec3::ZERO,
            highlight_color: Vec3::new(1.0, 0.4, 0.6),
            select_color: Vec3::new(0.2, 1.0, 0.1),
        }
    }
}

impl GlobalUniforms {
    /// Values keyed by the global uniform names.
    pub fn to_values(&self) -> Values {
        let mut values = Values::new();
        values.insert("uModel", Value::Mat4(self.model));
        values.insert("uView", Value::Mat4(self.view));
        values.insert("uProjection", Value::Mat4(self.projection));
        values.insert("uCameraPosition", Value::Vec3(self.camera_position));
        values.insert("uPixelRatio", Value::Float(self.pixel_ratio));
        values.insert("uViewportHeight", Value::Float(self.viewport_height));
        values.insert("uLightIntensity", Value::Float(self.light_intensity));
        values.insert(
            "uAmbientIntensity",
            Value::Float(self.ambient_intensity),
        );
        values.insert("uFogNear", Value::Float(self.fog_near));
        values.insert("uFogFar", Value::Float(self.fog_far));
        values.insert("uFogColor", Value::Vec3(self.fog_color));
        values.insert("uHighlightColor", Value::Vec3(self.highlight_color));
        values.insert("uSelectColor", Value::Vec3(self.select_color));
        values
    }

    /// Uniform block in [`GLOBAL_UNIFORM_SCHEMA`] order.
    pub fn pack(&self) -> Vec<UniformSlot> {
        let layout = GLOBAL_UNIFORM_SCHEMA.iter().filter_map(|(name, e)| {
            match e {
                SchemaEntry::Uniform(kind) => Some((*name, *kind)),
                _ => None,
            }
        });
        pack_uniforms(layout, &self.to_values())
    }
}

/// GPU buffer holding the packed [`GlobalUniforms`].
pub struct GlobalUniformBuffer {
    buffer: DynamicBuffer,
    last: Option<GlobalUniforms>,
}

impl GlobalUniformBuffer {
    /// Empty buffer; the first [`Self::update`] uploads.
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            buffer: DynamicBuffer::new(
                device,
                "global uniforms",
                GlobalUniforms::default().pack().len()
                    * size_of::<UniformSlot>(),
                wgpu::BufferUsages::UNIFORM,
            ),
            last: None,
        }
    }

    /// Upload `globals` unless identical to the last upload. Returns
    /// whether anything was written.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        globals: &GlobalUniforms,
    ) -> bool {
        if self.last.as_ref() == Some(globals) {
            return false;
        }
        let _ = self.buffer.write(device, queue, &globals.pack());
        self.last = Some(*globals);
        true
    }

    /// Underlying buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        self.buffer.buffer()
    }
}
