//! Cell permission and classification bits.
use bitflags::bitflags;

bitflags! {
    /// Bits stored on every [`crate::node::GridNode`].
    ///
    /// Masks are tested with intersection semantics: a cell satisfies a mask when
    /// `flags & mask != 0`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u64 {
        const ALLOW_WALK = 0x1;
        const ALLOW_FLIER = 0x2;
        const ALLOW_PROJECTILE = 0x4;
        const RAY_CAST = 0x8;
        /// Set on cells that sit on the walkable surface.
        const NAVIGATION = 0x10;
        const COMBAT = 0x20;
        const AVOIDANCE = 0x40;
        const OBSTACLE = 0x80;
        const RANGED = 0x100;
        /// Set on walkable cells close to the boundary of the walkable surface.
        const NEAR_EDGE = 0x200;
        const PIERCE = 0x400;
        const MONSTER = 0x800;
        const HEALTH = 0x1000;
    }
}

impl NodeFlags {
    /// True if any bit of `mask` is set. An empty mask never matches.
    pub fn matches(&self, mask: NodeFlags) -> bool {
        self.intersects(mask)
    }

    /// Bit position of a single-bit flag, `None` for empty or multi-bit values.
    pub fn bit_index(&self) -> Option<u32> {
        let bits = self.bits();
        if bits.count_ones() == 1 {
            Some(bits.trailing_zeros())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(NodeFlags::ALLOW_WALK.bits(), 0x1);
        assert_eq!(NodeFlags::NEAR_EDGE.bits(), 0x200);
        assert_eq!(NodeFlags::HEALTH.bits(), 0x1000);
    }

    #[test]
    fn test_matches_any_bit() {
        let flags = NodeFlags::ALLOW_WALK | NodeFlags::COMBAT;
        assert!(flags.matches(NodeFlags::COMBAT | NodeFlags::OBSTACLE));
        assert!(!flags.matches(NodeFlags::OBSTACLE));
        assert!(!flags.matches(NodeFlags::empty()));
    }

    #[test]
    fn test_bit_index() {
        assert_eq!(NodeFlags::ALLOW_WALK.bit_index(), Some(0));
        assert_eq!(NodeFlags::OBSTACLE.bit_index(), Some(7));
        assert_eq!((NodeFlags::OBSTACLE | NodeFlags::PIERCE).bit_index(), None);
        assert_eq!(NodeFlags::empty().bit_index(), None);
    }
}
