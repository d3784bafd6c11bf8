//! Symmetry operators applied to unit copies.

use glam::{IVec3, Mat4, Vec3};

/// Name of the identity operator.
pub const IDENTITY_OPERATOR_NAME: &str = "1_555";

/// Immutable named transform placing one unit copy in the structure frame.
///
/// Shared read-only by every unit instance it generates.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    name: String,
    hkl: IVec3,
    matrix: Mat4,
    inverse: Mat4,
    is_identity: bool,
}

impl Operator {
    /// Operator applying `matrix`, at lattice offset `hkl`.
    pub fn new(name: impl Into<String>, matrix: Mat4, hkl: IVec3) -> Self {
        Self {
            name: name.into(),
            hkl,
            inverse: matrix.inverse(),
            is_identity: matrix == Mat4::IDENTITY && hkl == IVec3::ZERO,
            matrix,
        }
    }

    /// The `1_555` identity operator.
    pub fn identity() -> Self {
        Self::new(IDENTITY_OPERATOR_NAME, Mat4::IDENTITY, IVec3::ZERO)
    }

    /// Operator name, e.g. `1_555` or `ASM_2`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integer lattice offset.
    pub fn hkl(&self) -> IVec3 {
        self.hkl
    }

    /// Forward transform.
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Inverse of [`Self::matrix`].
    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    /// Whether this operator leaves coordinates unchanged.
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// Transform an invariant-frame point into the structure frame.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }
}
