//! Reusable node storage backing a single decoder.
//!
//! Nodes are addressed by index rather than by reference. A parse resets the
//! `used` cursor and then hands out slots front to back, so the slots (and the
//! child vectors of array slots) allocated by earlier parses are recycled
//! instead of freed.

pub(crate) type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    Bytes,
    Array,
}

#[derive(Debug)]
pub(crate) struct Slot {
    pub kind: SlotKind,
    /// Byte range into the input, valid for `SlotKind::Bytes`.
    pub start: usize,
    pub len: usize,
    /// Child ids, valid for `SlotKind::Array`. Cleared, never shrunk.
    pub children: Vec<NodeId>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            kind: SlotKind::Bytes,
            start: 0,
            len: 0,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Slot>,
    used: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with `capacity` slots allocated up front.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::empty);
        Self { slots, used: 0 }
    }

    /// Slots handed out since the last reset.
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Slots allocated over the arena's lifetime, in use or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }

    fn next_slot(&mut self) -> NodeId {
        let id = self.used;
        if id == self.slots.len() {
            self.slots.push(Slot::empty());
        }
        self.used += 1;
        id
    }

    pub(crate) fn alloc_bytes(&mut self, start: usize, len: usize) -> NodeId {
        let id = self.next_slot();
        let slot = &mut self.slots[id];
        slot.kind = SlotKind::Bytes;
        slot.start = start;
        slot.len = len;
        id
    }

    pub(crate) fn alloc_array(&mut self) -> NodeId {
        let id = self.next_slot();
        let slot = &mut self.slots[id];
        slot.kind = SlotKind::Array;
        slot.children.clear();
        id
    }

    pub(crate) fn push_child(&mut self, array: NodeId, child: NodeId) {
        self.slots[array].children.push(child);
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id]
    }
}
