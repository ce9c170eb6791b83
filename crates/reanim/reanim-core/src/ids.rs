//! Identifiers and simple allocators for engine-owned entries.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ComboId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Monotonic allocator for DocId, ComboId and EntityId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_doc: u32,
    next_combo: u32,
    next_entity: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_doc(&mut self) -> DocId {
        let id = DocId(self.next_doc);
        self.next_doc = self.next_doc.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_combo(&mut self) -> ComboId {
        let id = ComboId(self.next_combo);
        self.next_combo = self.next_combo.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_doc(), DocId(0));
        assert_eq!(alloc.alloc_doc(), DocId(1));
        assert_eq!(alloc.alloc_combo(), ComboId(0));
        assert_eq!(alloc.alloc_entity(), EntityId(0));
        assert_eq!(alloc.alloc_entity(), EntityId(1));
    }
}
