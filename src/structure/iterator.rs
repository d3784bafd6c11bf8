//! Lazy traversals over a unit's polymer elements.

use super::{ElementIndex, MoleculeType, StructureGroup, Unit};
use crate::theme::Location;

/// Two consecutive polymer elements of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackbonePair {
    /// First element.
    pub element_a: ElementIndex,
    /// Second element.
    pub element_b: ElementIndex,
    /// Group index of the first element.
    pub index_a: u32,
    /// Group index of the second element.
    pub index_b: u32,
    /// Molecule type of the first element.
    pub molecule_type: MoleculeType,
}

/// Pairs of consecutive polymer elements, never crossing a chain break.
///
/// Group indices are ordinals within [`Unit::polymer_elements`], so they
/// are dense, zero-based, and identical across runs over an unchanged unit.
pub struct PolymerBackboneIterator<'a> {
    unit: &'a dyn Unit,
    elements: &'a [ElementIndex],
    segment_starts: &'a [usize],
    next: usize,
}

impl<'a> PolymerBackboneIterator<'a> {
    /// Fresh traversal of `unit`.
    pub fn new(unit: &'a dyn Unit) -> Self {
        Self {
            unit,
            elements: unit.polymer_elements(),
            segment_starts: unit.polymer_segment_starts(),
            next: 0,
        }
    }

    /// Upper bound on the number of pairs, for pre-sizing buffers.
    pub fn pair_count_estimate(unit: &dyn Unit) -> usize {
        unit.polymer_elements().len().saturating_sub(1)
    }
}

impl Iterator for PolymerBackboneIterator<'_> {
    type Item = BackbonePair;

    fn next(&mut self) -> Option<BackbonePair> {
        while self.next + 1 < self.elements.len() {
            let a = self.next;
            let b = a + 1;
            self.next = b;
            if self.segment_starts.binary_search(&b).is_ok() {
                continue;
            }
            let element_a = self.elements[a];
            return Some(BackbonePair {
                element_a,
                element_b: self.elements[b],
                index_a: a as u32,
                index_b: b as u32,
                molecule_type: self.unit.molecule_type(element_a),
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.elements.len().saturating_sub(self.next + 1);
        (0, Some(remaining))
    }
}

/// One themed slot of a group: instance, group index, and the location the
/// themes are evaluated at.
#[derive(Debug, Clone, Copy)]
pub struct LocationItem<'a> {
    /// Instance (unit copy) index.
    pub instance: usize,
    /// Group index within the instance.
    pub group: usize,
    /// Structural location.
    pub location: Location<'a>,
}

/// Every (instance, group) slot of a structure group in texture order:
/// instance-major, then group.
pub struct PolymerLocationIterator<'a> {
    group: &'a StructureGroup,
    group_count: usize,
    instance: usize,
    index: usize,
}

impl<'a> PolymerLocationIterator<'a> {
    /// Fresh traversal of `group`.
    pub fn new(group: &'a StructureGroup) -> Self {
        Self {
            group,
            group_count: group.unit().polymer_elements().len(),
            instance: 0,
            index: 0,
        }
    }

    /// Groups per instance.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Number of instances.
    pub fn instance_count(&self) -> usize {
        self.group.instance_count()
    }
}

impl<'a> Iterator for PolymerLocationIterator<'a> {
    type Item = LocationItem<'a>;

    fn next(&mut self) -> Option<LocationItem<'a>> {
        if self.index >= self.group_count {
            self.index = 0;
            self.instance += 1;
        }
        let unit = self.group.units().get(self.instance)?;
        let element = *unit.polymer_elements().get(self.index)?;
        let item = LocationItem {
            instance: self.instance,
            group: self.index,
            location: Location {
                unit: unit.as_ref(),
                element,
            },
        };
        self.index += 1;
        Some(item)
    }
}
