//! Visuals: geometry plus values plus the update-state machine.
//!
//! A [`Visual`] renders one [`StructureGroup`]. Each
//! [`Visual::update`] compares the incoming structure, theme and props with
//! what it rendered last and picks the cheapest path: a no-op, in-place
//! writes to the affected value cells, or a full geometry rebuild.
//! Representation switches (mesh vs. impostor) are decided outside the
//! visual through [`Visual::must_recreate`], which replaces the whole
//! visual.

pub mod backbone_cylinder;
mod representation;
mod units_visual;
mod writers;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub use backbone_cylinder::{
    polymer_backbone_cylinder_visual, split_point, BackboneCylinderImpostorBuilder,
    BackboneCylinderMeshBuilder,
};
pub use representation::{UnitsRepresentation, VisualFactory};
pub use units_visual::{UnitsVisual, VisualBuilder};

use crate::{
    error::ReprError,
    geometry::{GeometryKind, Sphere3D},
    gpu::DeviceCapabilities,
    options::{BackboneCylinderOptions, BaseGeometryOptions},
    renderable::Renderable,
    structure::{Loci, PickingId, StructureGroup},
    theme::Theme,
};

/// Cooperative cancellation flag shared between a caller and a build.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every build observing this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Environment of one update call.
#[derive(Debug, Clone)]
pub struct VisualContext {
    /// What the device supports.
    pub capabilities: DeviceCapabilities,
    /// Checked between structural elements during builds.
    pub cancel: Option<CancellationToken>,
}

impl VisualContext {
    /// Context without cancellation.
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            cancel: None,
        }
    }

    /// Same context observing `token`.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), ReprError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(ReprError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// What one update call did. Computed fresh per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualUpdateState {
    /// Geometry rebuilt; implies color, size, marker and transform refresh.
    pub create_geometry: bool,
    /// Instance count changed; transforms, colors and markers rewritten.
    pub update_transform: bool,
    /// Per-group colors rewritten.
    pub update_color: bool,
    /// Per-group sizes rewritten.
    pub update_size: bool,
    /// Instance matrices rewritten, instance count unchanged.
    pub update_matrix: bool,
    /// Prop-driven uniforms, defines or bounds rewritten in place.
    pub update_uniforms: bool,
}

impl VisualUpdateState {
    /// Full rebuild.
    pub fn create() -> Self {
        Self {
            create_geometry: true,
            ..Self::default()
        }
    }

    /// Whether no flag is set.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Clear every flag `create_geometry` supersedes.
    #[must_use]
    pub fn resolved(self) -> Self {
        if self.create_geometry {
            Self::create()
        } else if self.update_transform {
            Self {
                update_matrix: false,
                ..self
            }
        } else {
            self
        }
    }
}

/// Highlight/selection edit applied to marked locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAction {
    /// Set the highlight bit.
    Highlight,
    /// Clear the highlight bit.
    RemoveHighlight,
    /// Set the selection bit.
    Select,
    /// Clear the selection bit.
    Deselect,
    /// Flip the selection bit.
    Toggle,
    /// Clear both bits.
    Clear,
}

const HIGHLIGHT_BIT: u8 = 0b01;
const SELECT_BIT: u8 = 0b10;

impl MarkerAction {
    /// Apply to every marker in `markers`; `true` when any changed.
    pub fn apply(self, markers: &mut [u8]) -> bool {
        let mut changed = false;
        for m in markers {
            let next = match self {
                Self::Highlight => *m | HIGHLIGHT_BIT,
                Self::RemoveHighlight => *m & !HIGHLIGHT_BIT,
                Self::Select => *m | SELECT_BIT,
                Self::Deselect => *m & !SELECT_BIT,
                Self::Toggle => *m ^ SELECT_BIT,
                Self::Clear => 0,
            };
            changed |= next != *m;
            *m = next;
        }
        changed
    }
}

/// Props a visual can be driven with.
pub trait VisualProps: Clone + PartialEq {
    /// Appearance shared by every geometry kind.
    fn base(&self) -> &BaseGeometryOptions;

    /// Radius multiplier.
    fn size_factor(&self) -> f32;
}

impl VisualProps for BackboneCylinderOptions {
    fn base(&self) -> &BaseGeometryOptions {
        &self.base
    }

    fn size_factor(&self) -> f32 {
        self.size_factor
    }
}

/// One structure group rendered by one geometry strategy.
pub trait Visual<P> {
    /// Geometry kind this visual draws.
    fn kind(&self) -> GeometryKind;

    /// Bring geometry and values in line with the inputs.
    ///
    /// On error the visual keeps its previous values untouched.
    fn update(
        &mut self,
        ctx: &VisualContext,
        group: &StructureGroup,
        theme: &Theme,
        props: &P,
    ) -> Result<VisualUpdateState, ReprError>;

    /// Whether a different strategy should replace this visual.
    fn must_recreate(&self, props: &P, capabilities: &DeviceCapabilities) -> bool;

    /// Elements behind a picking id, or [`Loci::Empty`].
    fn get_loci(&self, id: PickingId) -> Loci;

    /// Apply `action` to the markers of `loci`; `true` when any changed.
    fn mark(&mut self, loci: &Loci, action: MarkerAction) -> bool;

    /// Current draw item, once the first update succeeded.
    fn renderable(&self) -> Option<&Renderable>;

    /// Mutable draw item, for visibility toggles.
    fn renderable_mut(&mut self) -> Option<&mut Renderable>;

    /// World-frame bound over every instance.
    fn bounding_sphere(&self) -> Sphere3D {
        self.renderable()
            .map_or(Sphere3D::EMPTY, Renderable::bounding_sphere)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_supersedes_other_flags() {
        let state = VisualUpdateState {
            create_geometry: true,
            update_color: true,
            update_matrix: true,
            update_uniforms: true,
            ..Default::default()
        }
        .resolved();
        assert_eq!(state, VisualUpdateState::create());
    }

    #[test]
    fn transform_supersedes_matrix() {
        let state = VisualUpdateState {
            update_transform: true,
            update_matrix: true,
            update_color: true,
            ..Default::default()
        }
        .resolved();
        assert!(state.update_transform && state.update_color);
        assert!(!state.update_matrix);
    }

    #[test]
    fn marker_actions_report_changes() {
        let mut m = [0u8, SELECT_BIT];
        assert!(MarkerAction::Highlight.apply(&mut m));
        assert_eq!(m, [1, 3]);
        assert!(!MarkerAction::Highlight.apply(&mut m));
        assert!(MarkerAction::Toggle.apply(&mut m));
        assert_eq!(m, [3, 1]);
        assert!(MarkerAction::Clear.apply(&mut m));
        assert!(!MarkerAction::Deselect.apply(&mut m));
        assert_eq!(m, [0, 0]);
    }

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        let ctx = VisualContext::new(DeviceCapabilities::FULL)
            .with_cancel(token.clone());
        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(ReprError::Cancelled)));
    }
}
