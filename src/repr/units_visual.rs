//! Generic units visual: one geometry builder driven by the update-state
//! machine.

use super::{
    writers, MarkerAction, Visual, VisualContext, VisualProps,
    VisualUpdateState,
};
use crate::{
    error::ReprError,
    geometry::{Geometry, GeometryKind, Sphere3D},
    gpu::DeviceCapabilities,
    renderable::{Renderable, RenderableState},
    schema::{TextureData, Value, Values},
    structure::{ElementLoci, Loci, PickingId, StructureGroup, Unit},
    theme::Theme,
};

/// Builds one geometry kind from a unit and decides which prop changes it
/// can absorb without rebuilding.
pub trait VisualBuilder {
    /// Geometry produced.
    type Geometry: Geometry;
    /// Props driving the build.
    type Props: VisualProps;

    /// Build geometry for `unit` in its invariant frame into `out`, reusing
    /// its allocations. Must check `ctx` for cancellation between
    /// structural elements and must not touch any values. On error `out`
    /// keeps its allocations but its contents are unspecified.
    fn build(
        &self,
        ctx: &VisualContext,
        unit: &dyn Unit,
        theme: &Theme,
        props: &Self::Props,
        out: &mut Self::Geometry,
    ) -> Result<(), ReprError>;

    /// Flag what a change from `old` to `new` props requires.
    fn set_update_state(
        &self,
        state: &mut VisualUpdateState,
        new: &Self::Props,
        old: &Self::Props,
    );

    /// Whether another builder should take over under `props`.
    fn must_recreate(
        &self,
        props: &Self::Props,
        capabilities: &DeviceCapabilities,
    ) -> bool;

    /// Refuse to run on devices lacking a required feature.
    fn check_capabilities(
        &self,
        _capabilities: &DeviceCapabilities,
    ) -> Result<(), ReprError> {
        Ok(())
    }

    /// Invariant-frame bound of the geometry built for `unit` under
    /// `props`; [`Sphere3D::EMPTY`] when nothing would be drawn.
    fn bounding_sphere(&self, unit: &dyn Unit, props: &Self::Props) -> Sphere3D;
}

/// Inputs of the last successful update.
#[derive(Debug)]
struct Snapshot<P> {
    props: P,
    theme: Theme,
    group: StructureGroup,
    conformation_id: u64,
}

/// A [`Visual`] over one [`StructureGroup`], built by `B`.
pub struct UnitsVisual<B: VisualBuilder> {
    builder: B,
    object_id: i32,
    renderable: Option<Renderable>,
    scratch: Option<B::Geometry>,
    current: Option<Snapshot<B::Props>>,
}

impl<B: VisualBuilder> UnitsVisual<B> {
    /// Visual with nothing built yet; the first update creates the
    /// renderable under `object_id`.
    pub fn new(builder: B, object_id: i32) -> Self {
        Self {
            builder,
            object_id,
            renderable: None,
            scratch: None,
            current: None,
        }
    }

    /// The builder.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    fn update_state(
        &self,
        group: &StructureGroup,
        theme: &Theme,
        props: &B::Props,
    ) -> VisualUpdateState {
        let Some(prev) = self.current.as_ref().filter(|_| self.renderable.is_some())
        else {
            return VisualUpdateState::create();
        };
        let mut state = VisualUpdateState::default();
        self.builder.set_update_state(&mut state, props, &prev.props);
        if theme.color_changed(&prev.theme) {
            state.update_color = true;
        }
        if theme.size_changed(&prev.theme) {
            if B::Geometry::uses_size_texture() {
                state.update_size = true;
            } else {
                state.create_geometry = true;
            }
        }
        if group.invariant_id() != prev.group.invariant_id()
            || group.unit().conformation_id() != prev.conformation_id
        {
            state.create_geometry = true;
        }
        if group.instance_count() != prev.group.instance_count() {
            state.update_transform = true;
        } else if !group.same_transforms(&prev.group) {
            state.update_matrix = true;
        }
        state.resolved()
    }

    /// Per-instance and per-group slots written by a full rebuild.
    fn write_all(values: &mut Values, group: &StructureGroup, theme: &Theme) {
        writers::write_transform(values, group);
        writers::write_color(values, group, theme);
        if B::Geometry::uses_size_texture() {
            writers::write_size(values, group, theme);
        }
        writers::write_marker(values, group);
    }
}

impl<B: VisualBuilder> Visual<B::Props> for UnitsVisual<B> {
    fn kind(&self) -> GeometryKind {
        B::Geometry::KIND
    }

    fn update(
        &mut self,
        ctx: &VisualContext,
        group: &StructureGroup,
        theme: &Theme,
        props: &B::Props,
    ) -> Result<VisualUpdateState, ReprError> {
        self.builder.check_capabilities(&ctx.capabilities)?;
        let mut state = self.update_state(group, theme, props);
        let unit = group.unit().as_ref();

        let mut geometry = if state.create_geometry {
            let mut geometry = self.scratch.take().unwrap_or_default();
            if let Err(err) =
                self.builder.build(ctx, unit, theme, props, &mut geometry)
            {
                if matches!(err, ReprError::Cancelled) {
                    log::debug!("object {}: build cancelled", self.object_id);
                }
                geometry.clear();
                self.scratch = Some(geometry);
                return Err(err);
            }
            Some(geometry)
        } else {
            None
        };
        if self.renderable.is_none() {
            let mut values = Values::new();
            if let Some(geometry) = geometry.as_mut() {
                geometry.install(&mut values);
            }
            Self::write_all(&mut values, group, theme);
            let _ = B::Geometry::update_values(
                &mut values,
                props.base(),
                props.size_factor(),
            );
            let _ = writers::write_bounding_sphere(
                &mut values,
                group,
                self.builder.bounding_sphere(unit, props),
            );
            self.renderable = Some(Renderable::new(
                self.object_id,
                B::Geometry::KIND,
                B::Geometry::partial_schemas(),
                values,
                RenderableState::default(),
                true,
            )?);
        } else if let (Some(renderable), Some(geometry)) =
            (self.renderable.as_mut(), geometry.as_mut())
        {
            let values = renderable.values_mut();
            geometry.install(values);
            Self::write_all(values, group, theme);
        }
        if geometry.is_some() {
            self.scratch = geometry;
        }

        if let Some(renderable) = self.renderable.as_mut() {
            let values = renderable.values_mut();
            if state.update_transform {
                writers::write_transform(values, group);
                writers::write_color(values, group, theme);
                writers::write_marker(values, group);
            } else {
                if state.update_matrix {
                    writers::write_transform(values, group);
                }
                if state.update_color {
                    writers::write_color(values, group, theme);
                }
            }
            if state.update_size {
                writers::write_size(values, group, theme);
            }
            let uniforms = B::Geometry::update_values(
                values,
                props.base(),
                props.size_factor(),
            );
            let bounds = writers::write_bounding_sphere(
                values,
                group,
                self.builder.bounding_sphere(unit, props),
            );
            // Bounds moved by a matrix or instance change are already
            // covered by those flags.
            if !state.create_geometry
                && (uniforms || (bounds && state.is_noop()))
            {
                state.update_uniforms = true;
            }
            debug_assert!(renderable.validate().is_ok());
        }

        self.current = Some(Snapshot {
            props: props.clone(),
            theme: theme.clone(),
            group: group.clone(),
            conformation_id: unit.conformation_id(),
        });
        Ok(state)
    }

    fn must_recreate(
        &self,
        props: &B::Props,
        capabilities: &DeviceCapabilities,
    ) -> bool {
        self.builder.must_recreate(props, capabilities)
    }

    fn get_loci(&self, id: PickingId) -> Loci {
        let Some(current) = &self.current else {
            return Loci::Empty;
        };
        if id.object_id != self.object_id {
            return Loci::Empty;
        }
        let Some(unit) = current.group.units().get(id.instance_id as usize)
        else {
            return Loci::Empty;
        };
        let Some(&element) = unit.polymer_elements().get(id.group_id as usize)
        else {
            return Loci::Empty;
        };
        Loci::Elements(vec![ElementLoci {
            unit: std::sync::Arc::clone(unit),
            elements: vec![element],
        }])
    }

    fn mark(&mut self, loci: &Loci, action: MarkerAction) -> bool {
        let (Some(current), Some(renderable)) =
            (&self.current, self.renderable.as_mut())
        else {
            return false;
        };
        let Some(mut markers) = renderable.values().texture("tMarker").cloned()
        else {
            return false;
        };
        let TextureData::U8(data) = &mut markers.data else {
            return false;
        };
        let changed = writers::each_location(loci, &current.group, |range| {
            data.get_mut(range).is_some_and(|m| action.apply(m))
        });
        if changed {
            renderable.values_mut().set("tMarker", Value::Texture(markers));
        }
        changed
    }

    fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }

    fn renderable_mut(&mut self) -> Option<&mut Renderable> {
        self.renderable.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{IVec3, Mat4, Vec3};

    use super::*;
    use crate::{
        options::{BackboneCylinderOptions, BackboneShift},
        repr::{
            BackboneCylinderImpostorBuilder, BackboneCylinderMeshBuilder,
            CancellationToken,
        },
        structure::{fixtures, AtomicUnit, MoleculeType, Operator},
        theme::{UniformColorTheme, UniformSizeTheme},
    };

    const OBJECT_ID: i32 = 3;

    fn impostor() -> UnitsVisual<BackboneCylinderImpostorBuilder> {
        UnitsVisual::new(
            BackboneCylinderImpostorBuilder::new(BackboneShift::default()),
            OBJECT_ID,
        )
    }

    fn mesh() -> UnitsVisual<BackboneCylinderMeshBuilder> {
        UnitsVisual::new(
            BackboneCylinderMeshBuilder::new(BackboneShift::default()),
            OBJECT_ID,
        )
    }

    fn ctx() -> VisualContext {
        VisualContext::new(DeviceCapabilities::FULL)
    }

    fn base_unit() -> AtomicUnit {
        AtomicUnit::new(0, 0, fixtures::helix_model(5, MoleculeType::Protein))
    }

    fn values<B: VisualBuilder>(visual: &UnitsVisual<B>) -> &Values {
        visual.renderable().unwrap().values()
    }

    fn version<B: VisualBuilder>(visual: &UnitsVisual<B>, name: &str) -> u64 {
        values(visual).version(name).unwrap()
    }

    #[test]
    fn first_update_creates_everything() {
        let mut visual = impostor();
        let group = fixtures::symmetric_group(5, 2);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let state = visual
            .update(&ctx(), &group, &theme, &Default::default())
            .unwrap();
        assert_eq!(state, VisualUpdateState::create());
        let r = visual.renderable().unwrap();
        assert_eq!(r.id(), OBJECT_ID);
        // Four pairs, two impostors each.
        assert_eq!(r.draw_count(), 4 * 2 * 6);
        assert_eq!(r.instance_count(), 2);
        assert!(r.validate().is_ok());
        assert_eq!(
            r.values().get("dColorType"),
            Some(&Value::Str("groupInstance".to_owned()))
        );
    }

    #[test]
    fn unchanged_inputs_are_a_noop() {
        let mut visual = impostor();
        let group = fixtures::symmetric_group(5, 2);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let before = values(&visual).version_sum();
        let state = visual
            .update(&ctx(), &group, &theme.clone(), &props)
            .unwrap();
        assert!(state.is_noop());
        assert_eq!(values(&visual).version_sum(), before);
    }

    #[test]
    fn color_theme_swap_only_rewrites_colors() {
        let mut visual = impostor();
        let group = fixtures::symmetric_group(5, 2);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let positions = version(&visual, "aStart");
        let colors = version(&visual, "tColor");

        let recolored = Theme::new(
            Arc::new(UniformColorTheme { color: Vec3::X }),
            Arc::clone(&theme.size),
        );
        let state = visual.update(&ctx(), &group, &recolored, &props).unwrap();
        assert_eq!(
            state,
            VisualUpdateState {
                update_color: true,
                ..Default::default()
            }
        );
        assert_eq!(version(&visual, "aStart"), positions);
        assert!(version(&visual, "tColor") > colors);
    }

    #[test]
    fn impostor_size_factor_never_rebuilds() {
        let mut visual = impostor();
        let group = fixtures::symmetric_group(5, 1);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let positions = version(&visual, "aStart");
        let radius = values(&visual)
            .sphere("invariantBoundingSphere")
            .unwrap()
            .radius;

        let thicker = BackboneCylinderOptions {
            size_factor: props.size_factor + 0.5,
            ..props
        };
        let state = visual.update(&ctx(), &group, &theme, &thicker).unwrap();
        assert_eq!(
            state,
            VisualUpdateState {
                update_uniforms: true,
                ..Default::default()
            }
        );
        assert!(!state.is_noop());
        assert_eq!(version(&visual, "aStart"), positions);
        assert_eq!(
            values(&visual).float("uSizeFactor"),
            Some(thicker.size_factor)
        );
        let grown = values(&visual)
            .sphere("invariantBoundingSphere")
            .unwrap()
            .radius;
        assert!((grown - radius - 0.5).abs() < 1e-4);
    }

    #[test]
    fn uniform_only_props_are_reported() {
        let mut visual = mesh();
        let group = fixtures::symmetric_group(5, 1);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let positions = version(&visual, "aPosition");
        let before = values(&visual).version_sum();

        let mut faded = props;
        faded.base.alpha = 0.5;
        faded.base.use_fog = !props.base.use_fog;
        let state = visual.update(&ctx(), &group, &theme, &faded).unwrap();
        assert!(state.update_uniforms && !state.create_geometry);
        assert_eq!(version(&visual, "aPosition"), positions);
        assert_eq!(values(&visual).version_sum(), before + 2);

        let state = visual.update(&ctx(), &group, &theme, &faded).unwrap();
        assert!(state.is_noop());
        assert_eq!(values(&visual).version_sum(), before + 2);
    }

    #[test]
    fn empty_unit_has_a_degenerate_bound() {
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        for unit in [fixtures::protein_unit(0), fixtures::protein_unit(1)] {
            let group = fixtures::single_group(unit);
            let mut visual = impostor();
            let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
            let r = visual.renderable().unwrap();
            assert_eq!(r.draw_count(), 0);
            assert_eq!(
                r.values().sphere("invariantBoundingSphere"),
                Some(Sphere3D::EMPTY)
            );
            assert_eq!(r.bounding_sphere(), Sphere3D::EMPTY);

            let mut visual = mesh();
            let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
            assert_eq!(
                visual.renderable().unwrap().bounding_sphere(),
                Sphere3D::EMPTY
            );
        }
    }

    #[test]
    fn mesh_size_factor_rebuilds() {
        let mut visual = mesh();
        let group = fixtures::symmetric_group(5, 1);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let positions = version(&visual, "aPosition");
        let state = visual
            .update(
                &ctx(),
                &group,
                &theme,
                &BackboneCylinderOptions {
                    size_factor: 1.0,
                    ..props
                },
            )
            .unwrap();
        assert_eq!(state, VisualUpdateState::create());
        assert!(version(&visual, "aPosition") > positions);
        assert!(visual.scratch.is_some());
    }

    #[test]
    fn size_theme_swap_depends_on_strategy() {
        let group = fixtures::symmetric_group(5, 1);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let resized = Theme::new(
            Arc::clone(&theme.color),
            Arc::new(UniformSizeTheme { size: 2.0 }),
        );
        let props = BackboneCylinderOptions::default();

        let mut visual = impostor();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let state = visual.update(&ctx(), &group, &resized, &props).unwrap();
        assert_eq!(
            state,
            VisualUpdateState {
                update_size: true,
                ..Default::default()
            }
        );
        assert_eq!(values(&visual).float("uSize"), Some(2.0));

        let mut visual = mesh();
        let _ = visual.update(&ctx(), &group, &theme, &props).unwrap();
        let state = visual.update(&ctx(), &group, &resized, &props).unwrap();
        assert!(state.create_geometry);
    }

    #[test]
    fn moved_instances_only_rewrite_matrices() {
        let mut visual = impostor();
        let base = base_unit();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&base, 2), &theme, &props)
            .unwrap();
        let positions = version(&visual, "aStart");
        let transforms = version(&visual, "aTransform");

        let moved: Vec<Arc<dyn Unit>> = vec![
            Arc::new(base.clone()),
            Arc::new(base.with_operator(
                1,
                Arc::new(Operator::new(
                    "ASM_9",
                    Mat4::from_translation(Vec3::Y * 7.0),
                    IVec3::ZERO,
                )),
            )),
        ];
        let group = StructureGroup::new(moved).unwrap();
        let state = visual.update(&ctx(), &group, &theme, &props).unwrap();
        assert_eq!(
            state,
            VisualUpdateState {
                update_matrix: true,
                ..Default::default()
            }
        );
        assert_eq!(version(&visual, "aStart"), positions);
        assert!(version(&visual, "aTransform") > transforms);
        assert_eq!(values(&visual).f32_array("aTransform").unwrap()[16 + 13], 7.0);
    }

    #[test]
    fn instance_count_change_rewrites_instancing() {
        let mut visual = impostor();
        let base = base_unit();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&base, 2), &theme, &props)
            .unwrap();
        let state = visual
            .update(&ctx(), &fixtures::group_from(&base, 3), &theme, &props)
            .unwrap();
        assert!(state.update_transform);
        assert!(!state.update_matrix && !state.create_geometry);
        let r = visual.renderable().unwrap();
        assert_eq!(r.instance_count(), 3);
        let tex = r.values().texture("tMarker").unwrap();
        assert!(tex.width * tex.height >= 15);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn conformation_change_rebuilds_into_recycled_arrays() {
        let mut visual = impostor();
        let base = base_unit();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&base, 1), &theme, &props)
            .unwrap();
        assert!(visual.scratch.is_some());

        let shifted = fixtures::helix_positions(5)
            .into_iter()
            .map(|p| p + Vec3::Z)
            .collect();
        let moved = base.with_model(Arc::new(base.model().with_positions(shifted)));
        let state = visual
            .update(&ctx(), &fixtures::group_from(&moved, 1), &theme, &props)
            .unwrap();
        assert_eq!(state, VisualUpdateState::create());
        assert_eq!(values(&visual).f32_array("aStart").unwrap()[2], 1.0);
    }

    #[test]
    fn cancelled_rebuild_leaves_values_untouched() {
        let mut visual = impostor();
        let base = base_unit();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&base, 1), &theme, &props)
            .unwrap();
        let before = values(&visual).version_sum();

        let token = CancellationToken::new();
        token.cancel();
        let moved = base.with_model(Arc::new(
            base.model().with_positions(fixtures::helix_positions(5)),
        ));
        let group = fixtures::group_from(&moved, 1);
        let result = visual.update(
            &ctx().with_cancel(token),
            &group,
            &theme,
            &props,
        );
        assert!(matches!(result, Err(ReprError::Cancelled)));
        assert_eq!(values(&visual).version_sum(), before);

        let state = visual.update(&ctx(), &group, &theme, &props).unwrap();
        assert!(state.create_geometry);
    }

    #[test]
    fn cancelled_rebuild_keeps_scratch_allocations() {
        let mut visual = impostor();
        let base = base_unit();
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let props = BackboneCylinderOptions::default();
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&base, 1), &theme, &props)
            .unwrap();
        // Second build leaves the first build's arrays in scratch.
        let shifted = base.with_model(Arc::new(
            base.model().with_positions(fixtures::helix_positions(5)),
        ));
        let _ = visual
            .update(&ctx(), &fixtures::group_from(&shifted, 1), &theme, &props)
            .unwrap();
        let allocation = visual.scratch.as_ref().unwrap().starts().as_ptr();

        let token = CancellationToken::new();
        token.cancel();
        let moved = base.with_model(Arc::new(
            base.model().with_positions(fixtures::helix_positions(5)),
        ));
        let result = visual.update(
            &ctx().with_cancel(token),
            &fixtures::group_from(&moved, 1),
            &theme,
            &props,
        );
        assert!(matches!(result, Err(ReprError::Cancelled)));
        let scratch = visual.scratch.as_ref().unwrap();
        assert_eq!(scratch.starts().as_ptr(), allocation);
        assert_eq!(scratch.count(), 0);
    }

    #[test]
    fn cancelled_first_update_builds_nothing() {
        let mut visual = mesh();
        let token = CancellationToken::new();
        token.cancel();
        let result = visual.update(
            &ctx().with_cancel(token),
            &fixtures::symmetric_group(5, 1),
            &Theme::uniform(Vec3::ONE, 1.0),
            &Default::default(),
        );
        assert!(result.is_err());
        assert!(visual.renderable().is_none());
    }

    #[test]
    fn picking_and_marking_address_instance_groups() {
        let mut visual = impostor();
        let group = fixtures::symmetric_group(5, 2);
        let _ = visual
            .update(
                &ctx(),
                &group,
                &Theme::uniform(Vec3::ONE, 1.0),
                &Default::default(),
            )
            .unwrap();

        let loci = visual.get_loci(PickingId {
            object_id: OBJECT_ID,
            instance_id: 1,
            group_id: 2,
        });
        let Loci::Elements(parts) = &loci else {
            panic!("expected element loci");
        };
        assert_eq!(parts[0].unit.id(), 1);
        assert_eq!(parts[0].elements, vec![2]);

        assert!(visual.mark(&loci, MarkerAction::Highlight));
        assert!(!visual.mark(&loci, MarkerAction::Highlight));
        let tex = values(&visual).texture("tMarker").unwrap();
        let TextureData::U8(data) = &tex.data else {
            panic!("expected u8 markers");
        };
        assert_eq!(data[7], 1);
        assert_eq!(data.iter().filter(|&&m| m != 0).count(), 1);

        assert!(visual
            .get_loci(PickingId {
                object_id: OBJECT_ID + 1,
                instance_id: 0,
                group_id: 0,
            })
            .is_empty());
        assert!(visual
            .get_loci(PickingId {
                object_id: OBJECT_ID,
                instance_id: 5,
                group_id: 0,
            })
            .is_empty());
    }
}
