//! Device feature detection for choosing between geometry strategies.

/// What the device can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Ray-cast impostors: per-primitive data read from storage buffers in
    /// the vertex stage, plus fragment depth output.
    pub impostors: bool,
}

impl DeviceCapabilities {
    /// Everything supported.
    pub const FULL: Self = Self { impostors: true };

    /// Nothing beyond plain triangle meshes.
    pub const MINIMAL: Self = Self { impostors: false };

    /// Query `adapter`.
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let caps = Self::from_parts(
            adapter.get_downlevel_capabilities().flags,
            &adapter.limits(),
        );
        log::info!(
            "{}: impostors {}",
            adapter.get_info().name,
            if caps.impostors {
                "supported"
            } else {
                "unsupported"
            }
        );
        caps
    }

    /// Derive from downlevel flags and limits. Fragment depth output is
    /// core WGSL, so only vertex-stage storage access is checked.
    pub fn from_parts(flags: wgpu::DownlevelFlags, limits: &wgpu::Limits) -> Self {
        Self {
            impostors: flags.contains(wgpu::DownlevelFlags::VERTEX_STORAGE)
                && limits.max_storage_buffers_per_shader_stage > 0,
        }
    }
}
