use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Geometry", inline)]
#[serde(default)]
/// Appearance parameters shared by every geometry kind.
pub struct BaseGeometryOptions {
    /// Opacity in [0, 1].
    #[schemars(title = "Opacity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub alpha: f32,
    /// Whether fog applies to this geometry.
    #[schemars(title = "Fog")]
    pub use_fog: bool,
    /// Per-face normals instead of interpolated ones (meshes only).
    #[schemars(title = "Flat Shaded")]
    pub flat_shaded: bool,
    /// Render back faces.
    #[schemars(title = "Double Sided")]
    pub double_sided: bool,
}

impl Default for BaseGeometryOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            use_fog: true,
            flat_shaded: false,
            double_sided: false,
        }
    }
}

impl BaseGeometryOptions {
    /// Copy with `alpha` clamped to [0, 1].
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            alpha: if self.alpha.is_nan() {
                1.0
            } else {
                self.alpha.clamp(0.0, 1.0)
            },
            ..self
        }
    }
}
