use glam::{Mat4, Vec3};

/// Bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sphere3D {
    /// Sphere center.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

impl Sphere3D {
    /// Degenerate sphere at the origin; the bound of empty geometry.
    pub const EMPTY: Self = Self {
        center: Vec3::ZERO,
        radius: 0.0,
    };

    /// Sphere from center and radius.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Centroid + max distance bound of a point set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let points: Vec<Vec3> = points.into_iter().collect();
        if points.is_empty() {
            return Self::EMPTY;
        }
        let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let radius = points
            .iter()
            .map(|p| (*p - center).length())
            .fold(0.0f32, f32::max);
        Self { center, radius }
    }

    /// Same center, radius grown by `delta`.
    #[must_use]
    pub fn expand(&self, delta: f32) -> Self {
        Self {
            center: self.center,
            radius: self.radius + delta,
        }
    }

    /// Conservative bound of this sphere under an affine transform.
    #[must_use]
    pub fn transform(&self, m: &Mat4) -> Self {
        let scale = m
            .x_axis
            .truncate()
            .length()
            .max(m.y_axis.truncate().length())
            .max(m.z_axis.truncate().length());
        Self {
            center: m.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }

    /// Sphere enclosing every sphere in `spheres`.
    pub fn enclosing(spheres: &[Self]) -> Self {
        match spheres {
            [] => Self::EMPTY,
            [single] => *single,
            _ => {
                let center = spheres.iter().map(|s| s.center).sum::<Vec3>()
                    / spheres.len() as f32;
                let radius = spheres
                    .iter()
                    .map(|s| (s.center - center).length() + s.radius)
                    .fold(0.0f32, f32::max);
                Self { center, radius }
            }
        }
    }

    /// Whether this is the bound of empty geometry.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Whether center and radius are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite()
    }
}
