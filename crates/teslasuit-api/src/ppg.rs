//! Photoplethysmography updates.

/// Readings from one PPG sensor node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpgNode {
    /// Vendor node index
    pub index: u8,
    /// Heart rate in beats per minute
    pub heart_rate: u32,
    /// Blood oxygen saturation in percent
    pub oxygen_percent: u8,
}

/// The nodes one PPG callback reported, in the order the library listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PpgFrame {
    /// Per-node readings
    pub nodes: Vec<PpgNode>,
}

impl PpgFrame {
    /// First node the library reported, if any.
    pub fn first(&self) -> Option<&PpgNode> {
        self.nodes.first()
    }
}
