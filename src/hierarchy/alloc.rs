use crate::topology::BusPort;

/// Hands out bus-side port indices in a strictly increasing sequence as leaf
/// caches are attached. Index 0 is never produced; it stays reserved for the
/// shared L2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAllocator {
    next: u32,
}

impl PortAllocator {
    pub fn new() -> Self {
        PortAllocator { next: 1 }
    }

    /// Returns the port to wire now and the allocator to thread into the
    /// next call.
    pub fn next(self) -> (BusPort, PortAllocator) {
        (BusPort(self.next), PortAllocator { next: self.next + 1 })
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new()
    }
}
