//! Polymer backbone as cylinders between consecutive polymer elements.
//!
//! Each backbone pair `(A, B)` is drawn as two half-cylinders meeting at a
//! split point, so each half takes the color and size of its own element.
//! The split sits at `shift` along `A → B`: halfway for proteins, closer to
//! `A` for nucleic acids.
//!
//! Two strategies produce the same picture. The mesh builder tessellates
//! with radii baked into the vertices; the impostor builder emits one
//! ray-cast primitive per half and resolves radii at draw time, so a size
//! change never rebuilds it. [`polymer_backbone_cylinder_visual`] picks
//! between them per device.

use glam::Vec3;
use web_time::Instant;

use super::{
    units_visual::{UnitsVisual, VisualBuilder},
    Visual, VisualContext, VisualUpdateState,
};
use crate::{
    error::ReprError,
    geometry::{
        cylinders::{Cylinders, CylindersBuilder},
        mesh::{
            add_cylinder, cylinder_index_count, cylinder_vertex_count,
            CylinderProps, Mesh, MeshBuilder,
        },
        Geometry, Sphere3D,
    },
    gpu::DeviceCapabilities,
    options::{BackboneCylinderOptions, BackboneShift},
    structure::{PolymerBackboneIterator, Unit},
    theme::{Location, Theme},
};

/// Point at fraction `shift` along `a → b`.
pub fn split_point(a: Vec3, b: Vec3, shift: f32) -> Vec3 {
    a + (b - a) * shift
}

/// Invariant bound shared by both strategies: the unit's boundary grown by
/// the size factor, or empty when the unit has no backbone pair.
fn backbone_bounding_sphere(unit: &dyn Unit, size_factor: f32) -> Sphere3D {
    if PolymerBackboneIterator::new(unit).next().is_none() {
        return Sphere3D::EMPTY;
    }
    unit.boundary_sphere().expand(size_factor)
}

/// Tessellated backbone cylinders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackboneCylinderMeshBuilder {
    shift: BackboneShift,
}

impl BackboneCylinderMeshBuilder {
    /// Builder splitting pairs at `shift`.
    pub fn new(shift: BackboneShift) -> Self {
        Self { shift }
    }

    fn add_pairs(
        &self,
        ctx: &VisualContext,
        unit: &dyn Unit,
        theme: &Theme,
        props: &BackboneCylinderOptions,
        builder: &mut MeshBuilder,
    ) -> Result<(), ReprError> {
        let mut cylinder = CylinderProps::uniform(1.0, props.radial_segments);
        for pair in PolymerBackboneIterator::new(unit) {
            ctx.check_cancelled()?;
            let a = unit.invariant_position(pair.element_a);
            let b = unit.invariant_position(pair.element_b);
            let shift = self.shift.for_pair(pair.molecule_type.is_nucleic());

            let radius = theme.size.size(&Location {
                unit,
                element: pair.element_a,
            }) * props.size_factor;
            cylinder.radius_top = radius;
            cylinder.radius_bottom = radius;
            builder.current_group = pair.index_a;
            let _ = add_cylinder(builder, a, b, shift, &cylinder);

            let radius = theme.size.size(&Location {
                unit,
                element: pair.element_b,
            }) * props.size_factor;
            cylinder.radius_top = radius;
            cylinder.radius_bottom = radius;
            builder.current_group = pair.index_b;
            let _ = add_cylinder(builder, b, a, 1.0 - shift, &cylinder);
        }
        Ok(())
    }
}

impl VisualBuilder for BackboneCylinderMeshBuilder {
    type Geometry = Mesh;
    type Props = BackboneCylinderOptions;

    fn build(
        &self,
        ctx: &VisualContext,
        unit: &dyn Unit,
        theme: &Theme,
        props: &BackboneCylinderOptions,
        out: &mut Mesh,
    ) -> Result<(), ReprError> {
        out.clear();
        if unit.polymer_elements().is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let estimate = CylinderProps::uniform(1.0, props.radial_segments);
        let halves = PolymerBackboneIterator::pair_count_estimate(unit) * 2;
        let mut builder = MeshBuilder::new(
            halves * cylinder_vertex_count(&estimate),
            halves * cylinder_index_count(&estimate),
            Some(std::mem::take(out)),
        );
        let filled = self.add_pairs(ctx, unit, theme, props, &mut builder);
        *out = builder.finish();
        filled?;

        out.set_bounding_sphere(self.bounding_sphere(unit, props));
        log::debug!(
            "backbone cylinder mesh for unit {}: {} vertices, {} triangles in {:.2?}",
            unit.id(),
            out.vertex_count(),
            out.triangle_count(),
            start.elapsed()
        );
        Ok(())
    }

    fn set_update_state(
        &self,
        state: &mut VisualUpdateState,
        new: &BackboneCylinderOptions,
        old: &BackboneCylinderOptions,
    ) {
        state.create_geometry |= new.size_factor != old.size_factor
            || new.radial_segments != old.radial_segments;
    }

    fn must_recreate(
        &self,
        props: &BackboneCylinderOptions,
        capabilities: &DeviceCapabilities,
    ) -> bool {
        (props.try_use_impostor && capabilities.impostors)
            || props.shift != self.shift
    }

    fn bounding_sphere(
        &self,
        unit: &dyn Unit,
        props: &BackboneCylinderOptions,
    ) -> Sphere3D {
        backbone_bounding_sphere(unit, props.size_factor)
    }
}

/// Ray-cast backbone cylinder impostors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackboneCylinderImpostorBuilder {
    shift: BackboneShift,
}

impl BackboneCylinderImpostorBuilder {
    /// Builder splitting pairs at `shift`.
    pub fn new(shift: BackboneShift) -> Self {
        Self { shift }
    }

    fn add_pairs(
        &self,
        ctx: &VisualContext,
        unit: &dyn Unit,
        builder: &mut CylindersBuilder,
    ) -> Result<(), ReprError> {
        for pair in PolymerBackboneIterator::new(unit) {
            ctx.check_cancelled()?;
            let a = unit.invariant_position(pair.element_a);
            let b = unit.invariant_position(pair.element_b);
            let shift = self.shift.for_pair(pair.molecule_type.is_nucleic());
            let m = split_point(a, b, shift);
            let _ = builder.add(a, m, 1.0, 0, pair.index_a);
            let _ = builder.add(m, b, 1.0, 0, pair.index_b);
        }
        Ok(())
    }
}

impl VisualBuilder for BackboneCylinderImpostorBuilder {
    type Geometry = Cylinders;
    type Props = BackboneCylinderOptions;

    fn build(
        &self,
        ctx: &VisualContext,
        unit: &dyn Unit,
        _theme: &Theme,
        props: &BackboneCylinderOptions,
        out: &mut Cylinders,
    ) -> Result<(), ReprError> {
        out.clear();
        if unit.polymer_elements().is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let mut builder = CylindersBuilder::new(
            PolymerBackboneIterator::pair_count_estimate(unit) * 2,
            Some(std::mem::take(out)),
        );
        let filled = self.add_pairs(ctx, unit, &mut builder);
        *out = builder.finish();
        filled?;

        out.set_bounding_sphere(self.bounding_sphere(unit, props));
        log::debug!(
            "backbone cylinder impostors for unit {}: {} primitives in {:.2?}",
            unit.id(),
            out.count(),
            start.elapsed()
        );
        Ok(())
    }

    fn set_update_state(
        &self,
        _state: &mut VisualUpdateState,
        _new: &BackboneCylinderOptions,
        _old: &BackboneCylinderOptions,
    ) {
        // Radii are resolved at draw time; nothing here needs a rebuild.
    }

    fn must_recreate(
        &self,
        props: &BackboneCylinderOptions,
        capabilities: &DeviceCapabilities,
    ) -> bool {
        !props.try_use_impostor
            || !capabilities.impostors
            || props.shift != self.shift
    }

    fn check_capabilities(
        &self,
        capabilities: &DeviceCapabilities,
    ) -> Result<(), ReprError> {
        if capabilities.impostors {
            Ok(())
        } else {
            Err(ReprError::UnsupportedCapability("impostors"))
        }
    }

    fn bounding_sphere(
        &self,
        unit: &dyn Unit,
        props: &BackboneCylinderOptions,
    ) -> Sphere3D {
        backbone_bounding_sphere(unit, props.size_factor)
    }
}

/// Tessellated backbone cylinder visual.
pub type BackboneCylinderMeshVisual = UnitsVisual<BackboneCylinderMeshBuilder>;

/// Impostor backbone cylinder visual.
pub type BackboneCylinderImpostorVisual =
    UnitsVisual<BackboneCylinderImpostorBuilder>;

/// Backbone cylinder visual for `props` on a device with `capabilities`:
/// impostors when requested and supported, the mesh otherwise.
pub fn polymer_backbone_cylinder_visual(
    object_id: i32,
    props: &BackboneCylinderOptions,
    capabilities: &DeviceCapabilities,
) -> Box<dyn Visual<BackboneCylinderOptions>> {
    if props.try_use_impostor && capabilities.impostors {
        return Box::new(BackboneCylinderImpostorVisual::new(
            BackboneCylinderImpostorBuilder::new(props.shift),
            object_id,
        ));
    }
    if props.try_use_impostor {
        log::warn!(
            "object {object_id}: cylinder impostors unsupported on this device, using mesh"
        );
    }
    Box::new(BackboneCylinderMeshVisual::new(
        BackboneCylinderMeshBuilder::new(props.shift),
        object_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::GeometryKind,
        structure::{fixtures, MoleculeType, UnitModel},
    };

    fn ctx() -> VisualContext {
        VisualContext::new(DeviceCapabilities::FULL)
    }

    fn props(size_factor: f32) -> BackboneCylinderOptions {
        BackboneCylinderOptions {
            size_factor,
            radial_segments: 8,
            ..Default::default()
        }
    }

    fn mesh_of(
        unit: &dyn Unit,
        theme: &Theme,
        props: &BackboneCylinderOptions,
    ) -> Mesh {
        let mut mesh = Mesh::default();
        BackboneCylinderMeshBuilder::new(BackboneShift::default())
            .build(&ctx(), unit, theme, props, &mut mesh)
            .unwrap();
        mesh
    }

    fn impostors_of(
        unit: &dyn Unit,
        props: &BackboneCylinderOptions,
    ) -> Cylinders {
        let mut cylinders = Cylinders::default();
        BackboneCylinderImpostorBuilder::new(BackboneShift::default())
            .build(
                &ctx(),
                unit,
                &Theme::uniform(Vec3::ONE, 1.0),
                props,
                &mut cylinders,
            )
            .unwrap();
        cylinders
    }

    fn bits(values: &[f32]) -> Vec<u32> {
        values.iter().map(|v| v.to_bits()).collect()
    }

    #[test]
    fn split_point_is_linear() {
        let b = Vec3::new(10.0, 0.0, 0.0);
        for t in [0.0, 0.3, 0.5, 1.0] {
            let m = split_point(Vec3::ZERO, b, t);
            assert!((m - Vec3::new(10.0 * t, 0.0, 0.0)).length() < 1e-5);
        }
    }

    #[test]
    fn impostor_halves_meet_at_the_split() {
        let unit = fixtures::segment_unit(10.0, MoleculeType::Protein);
        let c = impostors_of(unit.as_ref(), &props(1.0));
        assert_eq!(c.count(), 2);
        assert_eq!(c.starts(), &[0.0, 0.0, 0.0, 5.0, 0.0, 0.0]);
        assert_eq!(c.ends(), &[5.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(c.groups(), &[0.0, 1.0]);
        assert_eq!(c.scales(), &[1.0, 1.0]);
        assert_eq!(c.caps(), &[0.0, 0.0]);
        assert_eq!(c.draw_count(), 12);
    }

    #[test]
    fn nucleic_pairs_use_the_nucleic_shift() {
        let unit = fixtures::segment_unit(10.0, MoleculeType::Dna);
        let c = impostors_of(unit.as_ref(), &props(1.0));
        assert!((c.ends()[0] - 3.0).abs() < 1e-5);
        assert!((c.starts()[3] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn mesh_radii_follow_size_theme_and_factor() {
        let unit = fixtures::segment_unit(10.0, MoleculeType::Protein);
        let mesh =
            mesh_of(unit.as_ref(), &Theme::uniform(Vec3::ONE, 2.0), &props(0.5));
        // Two halves of 8 segments, two rings each.
        assert_eq!(mesh.vertex_count(), 2 * 8 * 2);
        for p in mesh.vertices().chunks_exact(3) {
            let r = (p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 1.0).abs() < 1e-4);
            assert!((-1e-4..=10.0 + 1e-4).contains(&p[0]));
        }
        let (first, second) = mesh.groups().split_at(16);
        assert!(first.iter().all(|&g| g == 0.0));
        assert!(second.iter().all(|&g| g == 1.0));
    }

    #[test]
    fn both_strategies_share_the_bounding_sphere() {
        let unit = fixtures::segment_unit(10.0, MoleculeType::Protein);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let mesh = mesh_of(unit.as_ref(), &theme, &props(1.0));
        let cylinders = impostors_of(unit.as_ref(), &props(1.0));
        for sphere in [mesh.bounding_sphere(), cylinders.bounding_sphere()] {
            assert!((sphere.center - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
            assert!((sphere.radius - 6.0).abs() < 1e-5);
        }
    }

    #[test]
    fn rebuilding_is_bit_identical() {
        let unit = fixtures::protein_unit(12);
        let theme = Theme::uniform(Vec3::ONE, 1.3);
        let p = props(0.4);

        let first = mesh_of(unit.as_ref(), &theme, &p);
        let second = mesh_of(unit.as_ref(), &theme, &p);
        let mut recycled = first.clone();
        BackboneCylinderMeshBuilder::new(BackboneShift::default())
            .build(&ctx(), unit.as_ref(), &theme, &p, &mut recycled)
            .unwrap();
        for other in [&second, &recycled] {
            assert_eq!(bits(first.vertices()), bits(other.vertices()));
            assert_eq!(bits(first.normals()), bits(other.normals()));
            assert_eq!(bits(first.groups()), bits(other.groups()));
            assert_eq!(first.indices(), other.indices());
            assert_eq!(first.bounding_sphere(), other.bounding_sphere());
        }

        let first = impostors_of(unit.as_ref(), &p);
        let second = impostors_of(unit.as_ref(), &p);
        let mut recycled = first.clone();
        BackboneCylinderImpostorBuilder::new(BackboneShift::default())
            .build(&ctx(), unit.as_ref(), &theme, &p, &mut recycled)
            .unwrap();
        for other in [&second, &recycled] {
            assert_eq!(bits(first.starts()), bits(other.starts()));
            assert_eq!(bits(first.ends()), bits(other.ends()));
            assert_eq!(bits(first.groups()), bits(other.groups()));
            assert_eq!(bits(first.scales()), bits(other.scales()));
        }
    }

    #[test]
    fn empty_unit_builds_empty_geometry() {
        let unit = fixtures::protein_unit(0);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let mesh = mesh_of(unit.as_ref(), &theme, &props(1.0));
        assert_eq!(mesh.draw_count(), 0);
        assert_eq!(mesh.bounding_sphere(), Sphere3D::EMPTY);

        // A lone element forms no pair, so nothing is drawn or bounded.
        let single = fixtures::protein_unit(1);
        let cylinders = impostors_of(single.as_ref(), &props(1.0));
        assert_eq!(cylinders.draw_count(), 0);
        assert_eq!(cylinders.bounding_sphere(), Sphere3D::EMPTY);
        let builder = BackboneCylinderImpostorBuilder::new(BackboneShift::default());
        assert_eq!(
            builder.bounding_sphere(single.as_ref(), &props(1.0)),
            Sphere3D::EMPTY
        );
    }

    #[test]
    fn chain_breaks_get_no_cylinder() {
        let model = std::sync::Arc::new(UnitModel::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::X * 5.0, Vec3::X * 6.0],
            vec![MoleculeType::Protein; 4],
            vec![0, 1, 2, 3],
            vec![2],
        ));
        let unit = crate::structure::AtomicUnit::new(0, 0, model);
        let c = impostors_of(&unit, &props(1.0));
        assert_eq!(c.count(), 4);
        assert_eq!(c.groups(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn cancelled_build_is_abandoned() {
        let token = crate::repr::CancellationToken::new();
        token.cancel();
        let ctx = ctx().with_cancel(token);
        let unit = fixtures::protein_unit(10);
        let theme = Theme::uniform(Vec3::ONE, 1.0);
        let mut mesh = mesh_of(unit.as_ref(), &theme, &props(1.0));
        let allocation = mesh.vertices().as_ptr();
        let result = BackboneCylinderMeshBuilder::new(BackboneShift::default())
            .build(&ctx, unit.as_ref(), &theme, &props(1.0), &mut mesh);
        assert!(matches!(result, Err(ReprError::Cancelled)));
        // The partial build hands its buffers back.
        assert_eq!(mesh.vertices().as_ptr(), allocation);
    }

    #[test]
    fn factory_follows_device_support() {
        let p = BackboneCylinderOptions::default();
        let visual =
            polymer_backbone_cylinder_visual(1, &p, &DeviceCapabilities::FULL);
        assert_eq!(visual.kind(), GeometryKind::Cylinders);
        assert!(!visual.must_recreate(&p, &DeviceCapabilities::FULL));
        assert!(visual.must_recreate(&p, &DeviceCapabilities::MINIMAL));

        let visual =
            polymer_backbone_cylinder_visual(1, &p, &DeviceCapabilities::MINIMAL);
        assert_eq!(visual.kind(), GeometryKind::Mesh);
        assert!(visual.must_recreate(&p, &DeviceCapabilities::FULL));

        let mesh_only = BackboneCylinderOptions {
            try_use_impostor: false,
            ..p
        };
        let visual = polymer_backbone_cylinder_visual(
            1,
            &mesh_only,
            &DeviceCapabilities::FULL,
        );
        assert_eq!(visual.kind(), GeometryKind::Mesh);
        assert!(!visual.must_recreate(&mesh_only, &DeviceCapabilities::FULL));
    }

    #[test]
    fn impostors_refuse_unsupported_devices() {
        let mut visual = BackboneCylinderImpostorVisual::new(
            BackboneCylinderImpostorBuilder::new(BackboneShift::default()),
            1,
        );
        let group = fixtures::symmetric_group(3, 1);
        let result = visual.update(
            &VisualContext::new(DeviceCapabilities::MINIMAL),
            &group,
            &Theme::uniform(Vec3::ONE, 1.0),
            &BackboneCylinderOptions::default(),
        );
        assert!(matches!(
            result,
            Err(ReprError::UnsupportedCapability("impostors"))
        ));
        assert!(visual.renderable().is_none());
    }
}
