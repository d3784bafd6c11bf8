//! One visual per structure group, kept in sync with a changing structure.

use rustc_hash::FxHashMap;

use super::{MarkerAction, Visual, VisualContext};
use crate::{
    error::ReprError,
    geometry::Sphere3D,
    gpu::DeviceCapabilities,
    renderable::Renderable,
    structure::{Loci, PickingId, Structure},
    theme::Theme,
};

/// Creates a visual for an object id under the given props and device.
pub type VisualFactory<P> =
    Box<dyn Fn(i32, &P, &DeviceCapabilities) -> Box<dyn Visual<P>> + Send + Sync>;

struct Entry<P> {
    invariant_id: u32,
    object_id: i32,
    visual: Box<dyn Visual<P>>,
}

/// Visuals for every symmetry group of a structure.
///
/// Groups are matched across updates by element-set identity. A visual
/// whose strategy no longer fits the props or device is replaced through
/// the factory, keeping its object id so picking ids stay stable.
pub struct UnitsRepresentation<P> {
    factory: VisualFactory<P>,
    entries: Vec<Entry<P>>,
    next_object_id: i32,
}

impl<P> UnitsRepresentation<P> {
    /// Empty representation creating visuals through `factory`.
    pub fn new(factory: VisualFactory<P>) -> Self {
        Self {
            factory,
            entries: Vec::new(),
            next_object_id: 0,
        }
    }

    /// Bring every visual in line with `structure`, `theme` and `props`.
    ///
    /// Visuals of vanished groups are dropped. A failing group keeps its
    /// previous visual; the first error is returned after every other
    /// group was updated.
    pub fn update(
        &mut self,
        ctx: &VisualContext,
        structure: &Structure,
        theme: &Theme,
        props: &P,
    ) -> Result<(), ReprError> {
        let mut previous: FxHashMap<u32, Entry<P>> = self
            .entries
            .drain(..)
            .map(|e| (e.invariant_id, e))
            .collect();
        let mut first_error = None;

        for group in structure.unit_symmetry_groups() {
            let mut entry = match previous.remove(&group.invariant_id()) {
                Some(entry) => entry,
                None => {
                    let object_id = self.next_object_id;
                    self.next_object_id += 1;
                    Entry {
                        invariant_id: group.invariant_id(),
                        object_id,
                        visual: (self.factory)(
                            object_id,
                            props,
                            &ctx.capabilities,
                        ),
                    }
                }
            };

            let outcome = if entry.visual.must_recreate(props, &ctx.capabilities)
            {
                let mut replacement =
                    (self.factory)(entry.object_id, props, &ctx.capabilities);
                replacement.update(ctx, &group, theme, props).map(|_| {
                    log::info!(
                        "object {}: switched {:?} visual to {:?}",
                        entry.object_id,
                        entry.visual.kind(),
                        replacement.kind()
                    );
                    entry.visual = replacement;
                })
            } else {
                entry.visual.update(ctx, &group, theme, props).map(|_| ())
            };
            if let Err(err) = outcome {
                log::warn!("object {}: update failed: {err}", entry.object_id);
                let _ = first_error.get_or_insert(err);
            }
            self.entries.push(entry);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every visual, in group order.
    pub fn visuals(&self) -> impl Iterator<Item = &dyn Visual<P>> + '_ {
        self.entries.iter().map(|e| e.visual.as_ref())
    }

    /// Every built draw item.
    pub fn renderables(&self) -> impl Iterator<Item = &Renderable> + '_ {
        self.entries.iter().filter_map(|e| e.visual.renderable())
    }

    /// Elements behind `id`, from whichever visual owns it.
    pub fn get_loci(&self, id: PickingId) -> Loci {
        self.entries
            .iter()
            .filter(|e| e.object_id == id.object_id)
            .map(|e| e.visual.get_loci(id))
            .find(|loci| !loci.is_empty())
            .unwrap_or_default()
    }

    /// Apply `action` to `loci` in every visual; `true` when any changed.
    pub fn mark(&mut self, loci: &Loci, action: MarkerAction) -> bool {
        let mut changed = false;
        for entry in &mut self.entries {
            changed |= entry.visual.mark(loci, action);
        }
        changed
    }

    /// Bound over every built visual that draws something.
    pub fn bounding_sphere(&self) -> Sphere3D {
        let spheres: Vec<Sphere3D> = self
            .renderables()
            .filter(|r| r.draw_count() > 0)
            .map(Renderable::bounding_sphere)
            .filter(|s| !s.is_empty())
            .collect();
        Sphere3D::enclosing(&spheres)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::{
        geometry::GeometryKind,
        options::BackboneCylinderOptions,
        repr::{polymer_backbone_cylinder_visual, CancellationToken},
        structure::{fixtures, AtomicUnit, MoleculeType, Unit},
    };

    fn representation() -> UnitsRepresentation<BackboneCylinderOptions> {
        UnitsRepresentation::new(Box::new(polymer_backbone_cylinder_visual))
    }

    fn two_chains() -> Structure {
        let protein: Arc<dyn Unit> = Arc::new(AtomicUnit::new(
            0,
            0,
            fixtures::helix_model(6, MoleculeType::Protein),
        ));
        let dna: Arc<dyn Unit> = Arc::new(AtomicUnit::new(
            1,
            1,
            fixtures::helix_model(4, MoleculeType::Dna),
        ));
        Structure::new(vec![protein, dna])
    }

    #[test]
    fn one_visual_per_group() {
        let mut repr = representation();
        let ctx = VisualContext::new(DeviceCapabilities::FULL);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        repr.update(&ctx, &two_chains(), &theme, &Default::default())
            .unwrap();
        assert_eq!(repr.renderables().count(), 2);
        assert!(repr
            .visuals()
            .all(|v| v.kind() == GeometryKind::Cylinders));
        let ids: Vec<i32> = repr.renderables().map(Renderable::id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(repr.bounding_sphere().radius > 0.0);
    }

    #[test]
    fn empty_groups_do_not_widen_the_bound() {
        let ctx = VisualContext::new(DeviceCapabilities::FULL);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let protein: Arc<dyn Unit> = Arc::new(AtomicUnit::new(
            0,
            0,
            fixtures::helix_model(6, MoleculeType::Protein),
        ));
        let empty: Arc<dyn Unit> = Arc::new(AtomicUnit::new(
            1,
            1,
            fixtures::helix_model(0, MoleculeType::Protein),
        ));

        let props = BackboneCylinderOptions::default();
        let mut alone = representation();
        let only_protein = Structure::new(vec![Arc::clone(&protein)]);
        alone.update(&ctx, &only_protein, &theme, &props).unwrap();
        let mut mixed = representation();
        let with_empty = Structure::new(vec![protein, empty]);
        mixed.update(&ctx, &with_empty, &theme, &props).unwrap();
        assert_eq!(mixed.renderables().count(), 2);
        assert_eq!(mixed.bounding_sphere(), alone.bounding_sphere());
    }

    #[test]
    fn device_change_switches_strategy_and_keeps_ids() {
        let mut repr = representation();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        repr.update(
            &VisualContext::new(DeviceCapabilities::FULL),
            &two_chains(),
            &theme,
            &props,
        )
        .unwrap();
        repr.update(
            &VisualContext::new(DeviceCapabilities::MINIMAL),
            &two_chains(),
            &theme,
            &props,
        )
        .unwrap();
        assert!(repr.visuals().all(|v| v.kind() == GeometryKind::Mesh));
        let ids: Vec<i32> = repr.renderables().map(Renderable::id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn vanished_groups_are_dropped() {
        let mut repr = representation();
        let ctx = VisualContext::new(DeviceCapabilities::FULL);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        repr.update(&ctx, &two_chains(), &theme, &Default::default())
            .unwrap();
        let only_protein = Structure::new(vec![Arc::clone(&two_chains().units()[0])]);
        repr.update(&ctx, &only_protein, &theme, &Default::default())
            .unwrap();
        assert_eq!(repr.renderables().count(), 1);
    }

    #[test]
    fn failed_switch_keeps_the_previous_visual() {
        let mut repr = representation();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let structure = two_chains();
        repr.update(
            &VisualContext::new(DeviceCapabilities::FULL),
            &structure,
            &theme,
            &props,
        )
        .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let ctx =
            VisualContext::new(DeviceCapabilities::MINIMAL).with_cancel(token);
        let err = repr.update(&ctx, &structure, &theme, &props).unwrap_err();
        assert!(matches!(err, ReprError::Cancelled));
        assert!(repr
            .visuals()
            .all(|v| v.kind() == GeometryKind::Cylinders));
        assert_eq!(repr.renderables().count(), 2);
    }

    #[test]
    fn picking_resolves_through_the_owning_visual() {
        let mut repr = representation();
        let ctx = VisualContext::new(DeviceCapabilities::FULL);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        repr.update(&ctx, &two_chains(), &theme, &Default::default())
            .unwrap();
        let loci = repr.get_loci(PickingId {
            object_id: 1,
            instance_id: 0,
            group_id: 2,
        });
        let Loci::Elements(parts) = &loci else {
            panic!("expected element loci");
        };
        assert_eq!(parts[0].unit.id(), 1);
        assert_eq!(parts[0].elements, vec![2]);
        assert!(repr.mark(&loci, MarkerAction::Select));
        assert!(!repr.mark(&loci, MarkerAction::Select));
        assert!(repr
            .get_loci(PickingId {
                object_id: 9,
                instance_id: 0,
                group_id: 0,
            })
            .is_empty());
    }
}
