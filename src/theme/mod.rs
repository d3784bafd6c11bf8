//! Color and size themes consulted while building and theming visuals.
//!
//! A theme is a pure function of a structural [`Location`]. Visuals compare
//! themes by `Arc` identity: swapping in a new theme object is what triggers
//! a color or size refresh, so a theme must not change its answers after
//! construction.

use std::sync::Arc;

use glam::Vec3;

use crate::structure::{ElementIndex, MoleculeType, Unit};

/// One element of one unit instance.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    /// Unit instance.
    pub unit: &'a dyn Unit,
    /// Element within the unit.
    pub element: ElementIndex,
}

impl Location<'_> {
    /// Molecule type of the element.
    pub fn molecule_type(&self) -> MoleculeType {
        self.unit.molecule_type(self.element)
    }
}

/// Linear RGB color per location, components in [0, 1].
pub trait ColorTheme: Send + Sync {
    /// Color at `location`.
    fn color(&self, location: &Location<'_>) -> Vec3;
}

/// Radius per location in Å.
pub trait SizeTheme: Send + Sync {
    /// Radius at `location`.
    fn size(&self, location: &Location<'_>) -> f32;
}

/// The color and size themes applied to one visual.
#[derive(Clone)]
pub struct Theme {
    /// Color theme.
    pub color: Arc<dyn ColorTheme>,
    /// Size theme.
    pub size: Arc<dyn SizeTheme>,
}

impl std::fmt::Debug for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theme")
            .field("color", &Arc::as_ptr(&self.color).cast::<()>())
            .field("size", &Arc::as_ptr(&self.size).cast::<()>())
            .finish()
    }
}

impl Theme {
    /// Theme from the two parts.
    pub fn new(color: Arc<dyn ColorTheme>, size: Arc<dyn SizeTheme>) -> Self {
        Self { color, size }
    }

    /// Uniform color and uniform radius.
    pub fn uniform(color: Vec3, size: f32) -> Self {
        Self::new(
            Arc::new(UniformColorTheme { color }),
            Arc::new(UniformSizeTheme { size }),
        )
    }

    /// Whether `other` uses a different color theme object.
    pub fn color_changed(&self, other: &Self) -> bool {
        !same_object(&self.color, &other.color)
    }

    /// Whether `other` uses a different size theme object.
    pub fn size_changed(&self, other: &Self) -> bool {
        !same_object(&self.size, &other.size)
    }
}

/// Data-pointer identity; vtable pointers are not compared.
fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Same color everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformColorTheme {
    /// The color.
    pub color: Vec3,
}

impl ColorTheme for UniformColorTheme {
    fn color(&self, _location: &Location<'_>) -> Vec3 {
        self.color
    }
}

/// Color by coarse molecule type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoleculeTypeColorTheme {
    /// Protein color.
    pub protein: Vec3,
    /// DNA, RNA and PNA color.
    pub nucleic: Vec3,
    /// Everything else.
    pub other: Vec3,
}

impl Default for MoleculeTypeColorTheme {
    fn default() -> Self {
        Self {
            protein: Vec3::new(0.9, 0.9, 0.9),
            nucleic: Vec3::new(0.45, 0.55, 0.85),
            other: Vec3::new(0.6, 0.6, 0.6),
        }
    }
}

impl ColorTheme for MoleculeTypeColorTheme {
    fn color(&self, location: &Location<'_>) -> Vec3 {
        match location.molecule_type() {
            MoleculeType::Protein => self.protein,
            t if t.is_nucleic() => self.nucleic,
            _ => self.other,
        }
    }
}

/// Same radius everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSizeTheme {
    /// The radius.
    pub size: f32,
}

impl SizeTheme for UniformSizeTheme {
    fn size(&self, _location: &Location<'_>) -> f32 {
        self.size
    }
}
