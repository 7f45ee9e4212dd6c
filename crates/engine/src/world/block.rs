/// Opaque block identifier. The world never interprets it; game-specific
/// layers assign meaning to specific IDs. A provider whose format can only
/// name some IDs rejects the rest when saving rather than substituting.
///
/// The only semantic enforced here is that `BlockId::AIR` (0) is the "empty"
/// block: chunk sections filled entirely with AIR are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);

    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }
}
