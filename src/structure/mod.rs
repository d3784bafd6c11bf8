//! Structural contract consumed by the representations.
//!
//! Visuals never parse structure files. They read a [`Unit`] through this
//! trait: the ordered polymer elements, their invariant-frame positions,
//! chain breaks, molecule types, and the [`Operator`] placing the unit.
//! Units sharing an element set but differing in operator form a
//! [`StructureGroup`], rendered as one instanced draw.

pub mod iterator;
pub mod loci;
pub mod operator;
pub mod unit;

#[cfg(test)]
pub(crate) mod fixtures;

use std::{fmt, sync::Arc};

use glam::Vec3;
use rustc_hash::FxHashMap;

pub use iterator::{
    BackbonePair, LocationItem, PolymerBackboneIterator,
    PolymerLocationIterator,
};
pub use loci::{ElementLoci, Loci, PickingId};
pub use operator::Operator;
pub use unit::{AtomicUnit, UnitModel};

use crate::geometry::Sphere3D;

/// Index of an element (atom or coarse bead) within a unit's model.
pub type ElementIndex = u32;

/// Coarse molecule classification of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoleculeType {
    /// Unclassified.
    #[default]
    Unknown,
    /// Solvent.
    Water,
    /// Single-atom ion.
    Ion,
    /// Amino-acid polymer.
    Protein,
    /// Ribonucleic acid.
    Rna,
    /// Deoxyribonucleic acid.
    Dna,
    /// Peptide nucleic acid.
    Pna,
    /// Carbohydrate.
    Saccharide,
}

impl MoleculeType {
    /// Whether the type is a nucleic acid.
    pub fn is_nucleic(self) -> bool {
        matches!(self, Self::Rna | Self::Dna | Self::Pna)
    }
}

/// One structure unit: a set of elements plus the operator placing it.
pub trait Unit: fmt::Debug + Send + Sync {
    /// Unique id of this unit instance.
    fn id(&self) -> u32;

    /// Identity of the element set; equal for symmetry copies.
    fn invariant_id(&self) -> u32;

    /// Identity of the coordinates; changes when positions change.
    fn conformation_id(&self) -> u64;

    /// Polymer elements in canonical traversal order.
    fn polymer_elements(&self) -> &[ElementIndex];

    /// Offsets into [`Self::polymer_elements`] at which a new polymer
    /// segment (chain break) starts, ascending. Offset 0 is implied.
    fn polymer_segment_starts(&self) -> &[usize] {
        &[]
    }

    /// Position of `element` in the invariant (operator-free) frame.
    fn invariant_position(&self, element: ElementIndex) -> Vec3;

    /// Molecule type of `element`.
    fn molecule_type(&self, element: ElementIndex) -> MoleculeType;

    /// Invariant-frame bound of every element.
    fn boundary_sphere(&self) -> Sphere3D;

    /// Operator placing this unit in the structure frame.
    fn operator(&self) -> &Arc<Operator>;
}

/// Units sharing one element set, each placed by its own operator.
#[derive(Debug, Clone)]
pub struct StructureGroup {
    units: Vec<Arc<dyn Unit>>,
}

impl StructureGroup {
    /// Group of `units`, which must share [`Unit::invariant_id`].
    /// Returns `None` when `units` is empty.
    pub fn new(units: Vec<Arc<dyn Unit>>) -> Option<Self> {
        let first = units.first()?;
        debug_assert!(units
            .iter()
            .all(|u| u.invariant_id() == first.invariant_id()));
        Some(Self { units })
    }

    /// Representative unit; its elements and conformation define the
    /// geometry shared by every instance.
    pub fn unit(&self) -> &Arc<dyn Unit> {
        &self.units[0]
    }

    /// Every unit, in instance order.
    pub fn units(&self) -> &[Arc<dyn Unit>] {
        &self.units
    }

    /// Number of instances.
    pub fn instance_count(&self) -> usize {
        self.units.len()
    }

    /// Shared element-set identity.
    pub fn invariant_id(&self) -> u32 {
        self.unit().invariant_id()
    }

    /// Whether both groups place the same units with the same operator
    /// matrices, instance by instance.
    pub fn same_transforms(&self, other: &Self) -> bool {
        self.units.len() == other.units.len()
            && self.units.iter().zip(&other.units).all(|(a, b)| {
                a.id() == b.id()
                    && (Arc::ptr_eq(a.operator(), b.operator())
                        || a.operator().matrix() == b.operator().matrix())
            })
    }

    /// Instance index of the unit with id `unit_id`.
    pub fn instance_of(&self, unit_id: u32) -> Option<usize> {
        self.units.iter().position(|u| u.id() == unit_id)
    }
}

/// A collection of units.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    units: Vec<Arc<dyn Unit>>,
}

impl Structure {
    /// Structure made of `units`.
    pub fn new(units: Vec<Arc<dyn Unit>>) -> Self {
        Self { units }
    }

    /// Every unit.
    pub fn units(&self) -> &[Arc<dyn Unit>] {
        &self.units
    }

    /// Units grouped by element-set identity, in order of first
    /// appearance.
    pub fn unit_symmetry_groups(&self) -> Vec<StructureGroup> {
        let mut order: Vec<u32> = Vec::new();
        let mut by_invariant: FxHashMap<u32, Vec<Arc<dyn Unit>>> =
            FxHashMap::default();
        for unit in &self.units {
            let key = unit.invariant_id();
            by_invariant
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(Arc::clone(unit));
        }
        order
            .into_iter()
            .filter_map(|key| by_invariant.remove(&key))
            .filter_map(StructureGroup::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Mat4};

    use super::*;
    use crate::structure::fixtures;

    #[test]
    fn nucleic_classification() {
        assert!(MoleculeType::Dna.is_nucleic());
        assert!(MoleculeType::Pna.is_nucleic());
        assert!(!MoleculeType::Protein.is_nucleic());
    }

    #[test]
    fn symmetry_copies_share_a_group() {
        let model = fixtures::helix_model(6, MoleculeType::Protein);
        let base = AtomicUnit::new(0, 0, Arc::clone(&model));
        let copy = base.with_operator(
            1,
            Arc::new(Operator::new(
                "ASM_2",
                Mat4::from_translation(Vec3::X * 20.0),
                IVec3::ZERO,
            )),
        );
        let other =
            AtomicUnit::new(2, 1, fixtures::helix_model(3, MoleculeType::Dna));
        let structure = Structure::new(vec![
            Arc::new(base),
            Arc::new(other),
            Arc::new(copy),
        ]);
        let groups = structure.unit_symmetry_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].instance_count(), 2);
        assert_eq!(groups[0].instance_of(1), Some(1));
        assert_eq!(groups[1].instance_count(), 1);
        assert!(!groups[0].same_transforms(&groups[1]));
        assert!(groups[0].same_transforms(&groups[0].clone()));
    }

    #[test]
    fn transforms_compare_matrices_not_names() {
        let model = fixtures::helix_model(4, MoleculeType::Protein);
        let base = AtomicUnit::new(0, 0, model);
        let placed = |m: Mat4| {
            let op = Arc::new(Operator::new("ASM_2", m, IVec3::ZERO));
            let copy: Arc<dyn Unit> = Arc::new(base.with_operator(1, op));
            StructureGroup::new(vec![Arc::new(base.clone()), copy]).unwrap()
        };
        // Separately allocated operators with equal matrices.
        let near = placed(Mat4::from_translation(Vec3::X * 20.0));
        let same = placed(Mat4::from_translation(Vec3::X * 20.0));
        let nudged = placed(Mat4::from_translation(Vec3::X * 20.5));
        assert!(near.same_transforms(&same));
        assert!(!near.same_transforms(&nudged));
        let only: Arc<dyn Unit> = Arc::new(base.clone());
        let fewer = StructureGroup::new(vec![only]).unwrap();
        assert!(!near.same_transforms(&fewer));
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(StructureGroup::new(Vec::new()).is_none());
    }
}
