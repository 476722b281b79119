//! Geometry layer masks.

use std::ops::{BitAnd, BitOr};

/// Bit set selecting which geometry layers a ray query may hit.
///
/// Layer indices run from 0 to 31. Hosts usually map these onto their own
/// physics layers (e.g. "static world", "doors", "characters").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches every layer
    pub const ALL: Self = Self(u32::MAX);

    /// Matches nothing
    pub const NONE: Self = Self(0);

    /// Mask containing a single layer. Indices above 31 produce an empty mask.
    pub fn layer(index: u32) -> Self {
        if index < 32 {
            Self(1 << index)
        } else {
            Self::NONE
        }
    }

    /// Mask containing all of the given layers.
    pub fn from_layers(indices: &[u32]) -> Self {
        indices
            .iter()
            .fold(Self::NONE, |mask, &index| mask | Self::layer(index))
    }

    pub fn contains(self, index: u32) -> bool {
        self.intersects(Self::layer(index))
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
