//! Value writers shared by every units visual.
//!
//! Each writer fills one concern's slots (instancing, color, size, markers,
//! bounds) from the structure group and theme. Writes go through
//! `set_if_changed`, so rewriting identical content never bumps a version.

use glam::{Mat4, Vec3};

use crate::{
    geometry::Sphere3D,
    schema::{TextureData, TextureImage, Value, Values},
    structure::{Loci, PolymerLocationIterator, StructureGroup},
    theme::{Location, Theme},
};

/// Groups per instance of `group`.
pub(crate) fn group_count(group: &StructureGroup) -> usize {
    group.unit().polymer_elements().len()
}

/// `aTransform`, `aInstance`, instance counts, and the identity `matrix`.
pub(crate) fn write_transform(values: &mut Values, group: &StructureGroup) {
    let n = group.instance_count();
    let mut transforms = Vec::with_capacity(n * 16);
    for unit in group.units() {
        transforms.extend_from_slice(&unit.operator().matrix().to_cols_array());
    }
    let instances: Vec<f32> = (0..n).map(|i| i as f32).collect();
    let _ = values.set_if_changed("aTransform", Value::Float32Array(transforms));
    let _ = values.set_if_changed("aInstance", Value::Float32Array(instances));
    let _ = values.set_if_changed("instanceCount", Value::Uint(n as u32));
    let _ = values.set_if_changed("uInstanceCount", Value::Int(n as i32));
    let _ = values.set_if_changed("matrix", Value::Mat4(Mat4::IDENTITY));
}

/// `tColor` with one RGB texel per (instance, group), plus its uniforms.
pub(crate) fn write_color(
    values: &mut Values,
    group: &StructureGroup,
    theme: &Theme,
) {
    let groups = group_count(group);
    let mut image =
        TextureImage::for_items_u8(groups * group.instance_count(), 3);
    let mut first = None;
    if let TextureData::U8(data) = &mut image.data {
        for (texel, item) in data
            .chunks_exact_mut(3)
            .zip(PolymerLocationIterator::new(group))
        {
            let color = theme.color.color(&item.location);
            let _ = first.get_or_insert(color);
            let rgb = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
            texel.copy_from_slice(&[rgb.x as u8, rgb.y as u8, rgb.z as u8]);
        }
    }
    let _ = values.set_if_changed("uColorTexDim", Value::Vec2(image.dim()));
    let _ = values.set_if_changed("tColor", Value::Texture(image));
    let _ = values.set_if_changed(
        "uColor",
        Value::Vec3(first.unwrap_or(Vec3::ZERO)),
    );
    let _ = values
        .set_if_changed("dColorType", Value::Str("groupInstance".to_owned()));
    let _ = values.set_if_changed("uGroupCount", Value::Int(groups as i32));
}

/// `tSize` with one radius per group of the representative unit.
pub(crate) fn write_size(
    values: &mut Values,
    group: &StructureGroup,
    theme: &Theme,
) {
    let unit = group.unit().as_ref();
    let elements = unit.polymer_elements();
    let mut image = TextureImage::for_items_f32(elements.len(), 1);
    let mut first = None;
    if let TextureData::F32(data) = &mut image.data {
        for (texel, &element) in data.iter_mut().zip(elements) {
            let size = theme.size.size(&Location { unit, element });
            let _ = first.get_or_insert(size);
            *texel = size;
        }
    }
    let _ = values.set_if_changed("uSizeTexDim", Value::Vec2(image.dim()));
    let _ = values.set_if_changed("tSize", Value::Texture(image));
    let _ = values.set_if_changed("uSize", Value::Float(first.unwrap_or(0.0)));
    let _ = values.set_if_changed("dSizeType", Value::Str("group".to_owned()));
}

/// Cleared `tMarker` sized for every (instance, group).
pub(crate) fn write_marker(values: &mut Values, group: &StructureGroup) {
    let image =
        TextureImage::for_items_u8(group_count(group) * group.instance_count(), 1);
    let _ = values.set_if_changed("uMarkerTexDim", Value::Vec2(image.dim()));
    let _ = values.set_if_changed("tMarker", Value::Texture(image));
}

/// `invariantBoundingSphere` and the enclosing `boundingSphere` over every
/// instance. Returns whether either was written. Empty geometry stays
/// empty in every frame.
pub(crate) fn write_bounding_sphere(
    values: &mut Values,
    group: &StructureGroup,
    invariant: Sphere3D,
) -> bool {
    let per_instance: Vec<Sphere3D> = if invariant.is_empty() {
        Vec::new()
    } else {
        group
            .units()
            .iter()
            .map(|u| invariant.transform(u.operator().matrix()))
            .collect()
    };
    let invariant_changed = values
        .set_if_changed("invariantBoundingSphere", Value::Sphere(invariant));
    let world_changed = values.set_if_changed(
        "boundingSphere",
        Value::Sphere(Sphere3D::enclosing(&per_instance)),
    );
    invariant_changed || world_changed
}

/// Call `apply` with each contiguous (instance, group) marker range covered
/// by `loci`. Returns whether any call reported a change.
pub(crate) fn each_location(
    loci: &Loci,
    group: &StructureGroup,
    mut apply: impl FnMut(std::ops::Range<usize>) -> bool,
) -> bool {
    let groups = group_count(group);
    match loci {
        Loci::Empty => false,
        Loci::Every => apply(0..groups * group.instance_count()),
        Loci::Elements(parts) => {
            let elements = group.unit().polymer_elements();
            let mut changed = false;
            for part in parts {
                let Some(instance) = group.instance_of(part.unit.id()) else {
                    continue;
                };
                for element in &part.elements {
                    if let Some(g) = elements.iter().position(|e| e == element)
                    {
                        let i = instance * groups + g;
                        changed |= apply(i..i + 1);
                    }
                }
            }
            changed
        }
    }
}
