//! Picked or marked structural elements.

use std::sync::Arc;

use super::{ElementIndex, Unit};

/// GPU picking triple read back from an id buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickingId {
    /// Renderable id (`uObjectId`).
    pub object_id: i32,
    /// Instance (unit copy) index.
    pub instance_id: u32,
    /// Group index.
    pub group_id: u32,
}

/// Elements of one unit.
#[derive(Debug, Clone)]
pub struct ElementLoci {
    /// Owning unit instance.
    pub unit: Arc<dyn Unit>,
    /// Selected elements.
    pub elements: Vec<ElementIndex>,
}

/// A set of structural elements.
#[derive(Debug, Clone, Default)]
pub enum Loci {
    /// Nothing.
    #[default]
    Empty,
    /// Everything the receiver renders.
    Every,
    /// Specific elements, grouped per unit.
    Elements(Vec<ElementLoci>),
}

impl Loci {
    /// Whether the loci selects nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Every => false,
            Self::Elements(parts) => {
                parts.iter().all(|part| part.elements.is_empty())
            }
        }
    }
}
