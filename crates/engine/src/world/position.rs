use std::fmt;

/// Number of chunks along each horizontal axis of a region.
pub const REGION_SIZE: i32 = 32;

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The chunk this block belongs to, or `None` if it lies beyond the
    /// range of chunk coordinates.
    pub fn chunk(&self) -> Option<ChunkPos> {
        Some(ChunkPos {
            x: i32::try_from(self.x >> 4).ok()?,
            z: i32::try_from(self.z >> 4).ok()?,
        })
    }

    /// Position within the chunk (0..16 on x and z, y unchanged).
    pub const fn local(&self) -> LocalBlockPos {
        LocalBlockPos {
            x: (self.x & 0xF) as u8,
            y: self.y,
            z: (self.z & 0xF) as u8,
        }
    }
}

/// Chunk column position (each chunk is 16x16 blocks horizontally).
///
/// The sole key for every piece of chunk-scoped data a provider stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given horizontal world coordinates. `None` for
    /// non-finite coordinates and ones beyond the range of chunk coordinates.
    pub fn containing(x: f64, z: f64) -> Option<Self> {
        let axis = |v: f64| {
            if !v.is_finite() {
                return None;
            }
            // Saturating cast; saturated values fail the range check below.
            i32::try_from(v.floor() as i64 >> 4).ok()
        };
        Some(Self {
            x: axis(x)?,
            z: axis(z)?,
        })
    }

    /// Region holding this chunk, as `(rx, rz)`.
    pub const fn region(&self) -> (i32, i32) {
        (self.x.div_euclid(REGION_SIZE), self.z.div_euclid(REGION_SIZE))
    }

    /// Offset of this chunk inside its region (0..32 on each axis).
    pub const fn region_local(&self) -> (usize, usize) {
        (
            self.x.rem_euclid(REGION_SIZE) as usize,
            self.z.rem_euclid(REGION_SIZE) as usize,
        )
    }

    /// All chunk positions within `radius` chunks of this one (square),
    /// clipped to the range of chunk coordinates.
    pub fn square_around(self, radius: i32) -> impl Iterator<Item = ChunkPos> {
        (-radius..=radius).flat_map(move |dx| {
            (-radius..=radius).filter_map(move |dz| {
                Some(ChunkPos::new(self.x.checked_add(dx)?, self.z.checked_add(dz)?))
            })
        })
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Block position local to a chunk (x, z in 0..16).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalBlockPos {
    pub x: u8,
    pub y: i64,
    pub z: u8,
}

impl LocalBlockPos {
    pub const fn section_index(&self) -> i32 {
        (self.y >> 4) as i32
    }

    pub const fn section_local_y(&self) -> u8 {
        (self.y.rem_euclid(16)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_map_to_negative_chunks() {
        assert_eq!(BlockPos::new(-1, 0, -17).chunk(), Some(ChunkPos::new(-1, -2)));
        assert_eq!(BlockPos::new(-1, 0, 0).local().x, 15);
    }

    #[test]
    fn region_uses_euclidean_division() {
        assert_eq!(ChunkPos::new(0, 31).region(), (0, 0));
        assert_eq!(ChunkPos::new(-1, 32).region(), (-1, 1));
        assert_eq!(ChunkPos::new(-1, -33).region_local(), (31, 31));
    }

    #[test]
    fn containing_floors_fractional_coordinates() {
        assert_eq!(ChunkPos::containing(-0.5, 16.0), Some(ChunkPos::new(-1, 1)));
        assert_eq!(ChunkPos::containing(15.99, 0.0), Some(ChunkPos::new(0, 0)));
    }

    #[test]
    fn far_coordinates_have_no_chunk() {
        assert_eq!(BlockPos::new(1 << 36, 5, 0).chunk(), None);
        assert_eq!(BlockPos::new(0, 5, -(1 << 36)).chunk(), None);
        assert_eq!(
            BlockPos::new((i32::MAX as i64) << 4, 0, 0).chunk(),
            Some(ChunkPos::new(i32::MAX, 0))
        );
        assert_eq!(ChunkPos::containing(1e12, 0.0), None);
        assert_eq!(ChunkPos::containing(0.0, f64::NAN), None);
        assert_eq!(ChunkPos::containing(f64::NEG_INFINITY, 0.0), None);
    }

    #[test]
    fn square_around_covers_full_square() {
        let all: Vec<_> = ChunkPos::new(3, -2).square_around(1).collect();
        assert_eq!(all.len(), 9);
        assert!(all.contains(&ChunkPos::new(4, -1)));
        assert!(all.contains(&ChunkPos::new(2, -3)));

        let edge: Vec<_> = ChunkPos::new(i32::MAX, 0).square_around(1).collect();
        assert_eq!(edge.len(), 6);
    }
}
