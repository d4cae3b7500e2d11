use super::header::BlockHeader;

/// A change of the canonical chain head.
///
/// Headers are cloned on insertion, so an event never aliases headers the
/// caller keeps mutating. Once pushed to an [`EventStream`](super::EventStream)
/// an event is shared read-only between subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Headers dropped from the canonical chain by a reorg, in insertion order.
    old_chain: Vec<BlockHeader>,
    /// Headers that became canonical, in insertion order.
    new_chain: Vec<BlockHeader>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_new_header(&mut self, header: &BlockHeader) {
        self.new_chain.push(header.clone());
    }

    pub fn add_old_header(&mut self, header: &BlockHeader) {
        self.old_chain.push(header.clone());
    }

    pub fn old_chain(&self) -> &[BlockHeader] {
        &self.old_chain
    }

    pub fn new_chain(&self) -> &[BlockHeader] {
        &self.new_chain
    }

    /// True if the event removed headers from the canonical chain.
    pub fn is_reorg(&self) -> bool {
        !self.old_chain.is_empty()
    }

    /// The last header added, i.e. the new chain head.
    pub fn new_head(&self) -> Option<&BlockHeader> {
        self.new_chain.last()
    }
}
