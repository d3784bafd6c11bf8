use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::BaseGeometryOptions;

/// Smallest accepted size factor.
pub const SIZE_FACTOR_MIN: f32 = 0.0;
/// Largest accepted size factor.
pub const SIZE_FACTOR_MAX: f32 = 10.0;
/// Fewest radial segments per tessellated cylinder.
pub const RADIAL_SEGMENTS_MIN: u32 = 2;
/// Most radial segments per tessellated cylinder.
pub const RADIAL_SEGMENTS_MAX: u32 = 56;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Split Shift", inline)]
#[serde(default)]
/// Fraction along a backbone pair at which the two half-cylinders meet.
pub struct BackboneShift {
    /// Shift for protein and other non-nucleic pairs.
    pub standard: f32,
    /// Shift for nucleic-acid pairs.
    pub nucleic: f32,
}

impl Default for BackboneShift {
    fn default() -> Self {
        Self {
            standard: 0.5,
            nucleic: 0.3,
        }
    }
}

impl BackboneShift {
    /// Shift for a pair of the given kind.
    pub fn for_pair(&self, nucleic: bool) -> f32 {
        if nucleic {
            self.nucleic
        } else {
            self.standard
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Backbone Cylinder", inline)]
#[serde(default)]
/// Parameters of the polymer backbone cylinder representation.
pub struct BackboneCylinderOptions {
    /// Appearance shared with every geometry kind.
    #[serde(flatten)]
    pub base: BaseGeometryOptions,
    /// Multiplier applied to the size theme's radius.
    #[schemars(title = "Size Factor", range(min = 0.0, max = 10.0), extend("step" = 0.01))]
    pub size_factor: f32,
    /// Vertices per ring of tessellated cylinders.
    #[schemars(title = "Radial Segments", range(min = 2, max = 56), extend("step" = 2))]
    pub radial_segments: u32,
    /// Prefer ray-cast impostors when the device supports them.
    #[schemars(title = "Use Impostors")]
    pub try_use_impostor: bool,
    /// Split point configuration. Fixed per visual at construction.
    #[schemars(skip)]
    pub shift: BackboneShift,
}

impl Default for BackboneCylinderOptions {
    fn default() -> Self {
        Self {
            base: BaseGeometryOptions::default(),
            size_factor: 0.3,
            radial_segments: 16,
            try_use_impostor: true,
            shift: BackboneShift::default(),
        }
    }
}

impl BackboneCylinderOptions {
    /// Copy with every numeric field forced into its accepted range.
    /// Radial segments are rounded down to an even count.
    #[must_use]
    pub fn clamped(self) -> Self {
        let size_factor = if self.size_factor.is_nan() {
            Self::default().size_factor
        } else {
            self.size_factor.clamp(SIZE_FACTOR_MIN, SIZE_FACTOR_MAX)
        };
        let radial_segments = (self
            .radial_segments
            .clamp(RADIAL_SEGMENTS_MIN, RADIAL_SEGMENTS_MAX)
            / 2)
            * 2;
        Self {
            base: self.base.clamped(),
            size_factor,
            radial_segments,
            ..self
        }
    }
}
