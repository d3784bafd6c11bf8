//! In-memory unit implementation backed by a shared coordinate model.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use glam::Vec3;

use super::{ElementIndex, MoleculeType, Operator, Unit};
use crate::geometry::Sphere3D;

static NEXT_CONFORMATION_ID: AtomicU64 = AtomicU64::new(1);

/// Element coordinates and classification shared by symmetry copies.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitModel {
    positions: Vec<Vec3>,
    molecule_types: Vec<MoleculeType>,
    polymer_elements: Vec<ElementIndex>,
    segment_starts: Vec<usize>,
    boundary: Sphere3D,
    conformation_id: u64,
}

impl UnitModel {
    /// Model with one position and molecule type per element.
    ///
    /// `polymer_elements` lists the elements traversed by backbone
    /// representations; `segment_starts` are the offsets into that list at
    /// which a chain break begins a new segment. Out-of-range polymer
    /// elements are dropped.
    pub fn new(
        positions: Vec<Vec3>,
        molecule_types: Vec<MoleculeType>,
        mut polymer_elements: Vec<ElementIndex>,
        mut segment_starts: Vec<usize>,
    ) -> Self {
        polymer_elements.retain(|&e| (e as usize) < positions.len());
        segment_starts.retain(|&s| s > 0 && s < polymer_elements.len());
        segment_starts.sort_unstable();
        segment_starts.dedup();
        Self {
            boundary: Sphere3D::from_points(positions.iter().copied()),
            conformation_id: NEXT_CONFORMATION_ID
                .fetch_add(1, Ordering::Relaxed),
            positions,
            molecule_types,
            polymer_elements,
            segment_starts,
        }
    }

    /// Same topology with new coordinates and a fresh conformation id.
    #[must_use]
    pub fn with_positions(&self, positions: Vec<Vec3>) -> Self {
        Self::new(
            positions,
            self.molecule_types.clone(),
            self.polymer_elements.clone(),
            self.segment_starts.clone(),
        )
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.positions.len()
    }
}

/// A unit instance: a shared model placed by an operator.
#[derive(Debug, Clone)]
pub struct AtomicUnit {
    id: u32,
    invariant_id: u32,
    model: Arc<UnitModel>,
    operator: Arc<Operator>,
}

impl AtomicUnit {
    /// Unit at the identity operator.
    pub fn new(id: u32, invariant_id: u32, model: Arc<UnitModel>) -> Self {
        Self {
            id,
            invariant_id,
            model,
            operator: Arc::new(Operator::identity()),
        }
    }

    /// Symmetry copy sharing this unit's model and element set.
    #[must_use]
    pub fn with_operator(&self, id: u32, operator: Arc<Operator>) -> Self {
        Self {
            id,
            invariant_id: self.invariant_id,
            model: Arc::clone(&self.model),
            operator,
        }
    }

    /// Same unit with a different coordinate model.
    #[must_use]
    pub fn with_model(&self, model: Arc<UnitModel>) -> Self {
        Self {
            model,
            ..self.clone()
        }
    }

    /// Shared model.
    pub fn model(&self) -> &Arc<UnitModel> {
        &self.model
    }
}

impl Unit for AtomicUnit {
    fn id(&self) -> u32 {
        self.id
    }

    fn invariant_id(&self) -> u32 {
        self.invariant_id
    }

    fn conformation_id(&self) -> u64 {
        self.model.conformation_id
    }

    fn polymer_elements(&self) -> &[ElementIndex] {
        &self.model.polymer_elements
    }

    fn polymer_segment_starts(&self) -> &[usize] {
        &self.model.segment_starts
    }

    fn invariant_position(&self, element: ElementIndex) -> Vec3 {
        self.model
            .positions
            .get(element as usize)
            .copied()
            .unwrap_or(Vec3::ZERO)
    }

    fn molecule_type(&self, element: ElementIndex) -> MoleculeType {
        self.model
            .molecule_types
            .get(element as usize)
            .copied()
            .unwrap_or_default()
    }

    fn boundary_sphere(&self) -> Sphere3D {
        self.model.boundary
    }

    fn operator(&self) -> &Arc<Operator> {
        &self.operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_positions_get_new_conformation() {
        let model = UnitModel::new(
            vec![Vec3::ZERO, Vec3::X],
            vec![MoleculeType::Protein; 2],
            vec![0, 1],
            vec![],
        );
        let moved = model.with_positions(vec![Vec3::Y, Vec3::Z]);
        assert_ne!(model.conformation_id, moved.conformation_id);
        assert_eq!(model.polymer_elements, moved.polymer_elements);
    }

    #[test]
    fn invalid_indices_are_dropped() {
        let model = UnitModel::new(
            vec![Vec3::ZERO; 3],
            vec![MoleculeType::Protein; 3],
            vec![0, 1, 7, 2],
            vec![0, 2, 2, 9],
        );
        assert_eq!(model.polymer_elements, vec![0, 1, 2]);
        assert_eq!(model.segment_starts, vec![2]);
    }

    #[test]
    fn copies_share_model_and_invariant_id() {
        let model = Arc::new(UnitModel::new(
            vec![Vec3::ONE],
            vec![MoleculeType::Ion],
            vec![0],
            vec![],
        ));
        let unit = AtomicUnit::new(0, 5, model);
        let copy = unit.with_operator(9, Arc::new(Operator::identity()));
        assert_eq!(copy.invariant_id(), 5);
        assert_eq!(copy.id(), 9);
        assert!(Arc::ptr_eq(unit.model(), copy.model()));
        assert_eq!(copy.conformation_id(), unit.conformation_id());
    }
}
