//! Synthetic units shared by tests across the crate.

use std::sync::Arc;

use glam::{IVec3, Mat4, Vec3};

use super::{
    AtomicUnit, MoleculeType, Operator, StructureGroup, Unit, UnitModel,
};

/// Alpha-helix-like trace: 100 degrees and 1.5 Å rise per element.
pub(crate) fn helix_positions(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let angle = (i as f32 * 100.0).to_radians();
            Vec3::new(2.3 * angle.cos(), 2.3 * angle.sin(), 1.5 * i as f32)
        })
        .collect()
}

/// Single-segment helix model of `n` polymer elements.
pub(crate) fn helix_model(
    n: usize,
    molecule_type: MoleculeType,
) -> Arc<UnitModel> {
    Arc::new(UnitModel::new(
        helix_positions(n),
        vec![molecule_type; n],
        (0..n as u32).collect(),
        Vec::new(),
    ))
}

/// Protein helix unit at the identity operator.
pub(crate) fn protein_unit(n: usize) -> Arc<dyn Unit> {
    Arc::new(AtomicUnit::new(
        0,
        0,
        helix_model(n, MoleculeType::Protein),
    ))
}

/// Two-element unit along the x axis: `(0,0,0)` and `(length,0,0)`.
pub(crate) fn segment_unit(
    length: f32,
    molecule_type: MoleculeType,
) -> Arc<dyn Unit> {
    let model = UnitModel::new(
        vec![Vec3::ZERO, Vec3::X * length],
        vec![molecule_type; 2],
        vec![0, 1],
        Vec::new(),
    );
    Arc::new(AtomicUnit::new(0, 0, Arc::new(model)))
}

/// Translation operator `ASM_<k>` shifting by `k * 30` Å along x.
pub(crate) fn shifted_operator(k: usize) -> Arc<Operator> {
    Arc::new(Operator::new(
        format!("ASM_{k}"),
        Mat4::from_translation(Vec3::X * 30.0 * k as f32),
        IVec3::ZERO,
    ))
}

/// Group of `copies` symmetry copies of one `n`-element protein helix.
pub(crate) fn symmetric_group(n: usize, copies: usize) -> StructureGroup {
    let base = AtomicUnit::new(0, 0, helix_model(n, MoleculeType::Protein));
    group_from(&base, copies)
}

/// Group of `copies` copies of `base`, copy `k` placed by
/// [`shifted_operator`].
pub(crate) fn group_from(base: &AtomicUnit, copies: usize) -> StructureGroup {
    let units: Vec<Arc<dyn Unit>> = (0..copies)
        .map(|k| {
            let unit: Arc<dyn Unit> = if k == 0 {
                Arc::new(base.clone())
            } else {
                Arc::new(base.with_operator(k as u32, shifted_operator(k)))
            };
            unit
        })
        .collect();
    StructureGroup::new(units).unwrap()
}

/// Group holding just `unit`.
pub(crate) fn single_group(unit: Arc<dyn Unit>) -> StructureGroup {
    StructureGroup::new(vec![unit]).unwrap()
}
