//! GPU resource management.
//!
//! Mirrors renderable values into wgpu buffers and textures, uploading only
//! what changed, and detects which geometry strategies the device supports.

/// Device feature detection.
pub mod capabilities;
/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Process-wide camera, light and fog uniforms.
pub mod globals;
/// Version-skipping upload of one renderable.
pub mod render_item;

pub use capabilities::DeviceCapabilities;
pub use dynamic_buffer::DynamicBuffer;
pub use globals::{GlobalUniformBuffer, GlobalUniforms};
pub use render_item::{RenderItem, SyncStats};
