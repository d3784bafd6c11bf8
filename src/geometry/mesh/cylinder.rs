//! Open cylinder tessellation.

use glam::Vec3;

use super::MeshBuilder;

/// Segments shorter than this produce no geometry.
const MIN_LENGTH: f32 = 1e-6;

/// Shape of one tessellated cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderProps {
    /// Radius at the far end.
    pub radius_top: f32,
    /// Radius at the start.
    pub radius_bottom: f32,
    /// Vertices per ring.
    pub radial_segments: u32,
}

impl CylinderProps {
    /// Straight cylinder of uniform radius.
    pub fn uniform(radius: f32, radial_segments: u32) -> Self {
        Self {
            radius_top: radius,
            radius_bottom: radius,
            radial_segments,
        }
    }
}

/// Vertices [`add_cylinder`] emits for `props`.
pub fn cylinder_vertex_count(props: &CylinderProps) -> usize {
    props.radial_segments.max(3) as usize * 2
}

/// Indices [`add_cylinder`] emits for `props`.
pub fn cylinder_index_count(props: &CylinderProps) -> usize {
    props.radial_segments.max(3) as usize * 6
}

/// Append an uncapped cylinder from `start` toward `end`, covering
/// `length_scale` of that distance, tagged with the builder's current
/// group. Returns `false` (and emits nothing) for a degenerate segment.
pub fn add_cylinder(
    builder: &mut MeshBuilder,
    start: Vec3,
    end: Vec3,
    length_scale: f32,
    props: &CylinderProps,
) -> bool {
    let axis = (end - start) * length_scale;
    let height = axis.length();
    if !height.is_finite() || height < MIN_LENGTH {
        return false;
    }
    let dir = axis / height;
    let u = find_perpendicular(dir);
    let v = dir.cross(u);
    let top = start + axis;
    let segments = props.radial_segments.max(3);
    let slope = (props.radius_bottom - props.radius_top) / height;

    let base = builder.vertex_count() as u32;
    for (center, radius) in
        [(start, props.radius_bottom), (top, props.radius_top)]
    {
        for i in 0..segments {
            let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
            let radial = u * theta.cos() + v * theta.sin();
            let normal = (radial + dir * slope).normalize();
            let _ = builder.add_vertex(center + radial * radius, normal);
        }
    }

    for i in 0..segments {
        let j = (i + 1) % segments;
        let a = base + i;
        let b = base + j;
        let c = base + segments + i;
        let d = base + segments + j;
        builder.add_triangle(a, b, c);
        builder.add_triangle(b, d, c);
    }
    true
}

/// Any unit vector perpendicular to `v`.
fn find_perpendicular(v: Vec3) -> Vec3 {
    if v.length_squared() < 1e-8 {
        return Vec3::X;
    }
    let candidate = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(candidate).normalize()
}
