//! The six axis-aligned neighbour directions and their fixed ordering
//!
//! Index order is +X, +Y, -X, -Y, +Z, -Z with Y pointing up. Catalog data
//! stores one neighbour list per index in this order, so the ordinals are part
//! of the data format and must not be rearranged.

use std::fmt;

/// One of the six faces of a grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// +X
    PosX,
    /// +Y (up)
    PosY,
    /// -X
    NegX,
    /// -Y (down)
    NegY,
    /// +Z
    PosZ,
    /// -Z
    NegZ,
}

impl Direction {
    /// All directions in data-format order
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::PosY,
        Self::NegX,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Ordinal used to index per-direction neighbour lists
    pub const fn index(self) -> usize {
        match self {
            Self::PosX => 0,
            Self::PosY => 1,
            Self::NegX => 2,
            Self::NegY => 3,
            Self::PosZ => 4,
            Self::NegZ => 5,
        }
    }

    /// Direction for a data-format ordinal
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::PosX),
            1 => Some(Self::PosY),
            2 => Some(Self::NegX),
            3 => Some(Self::NegY),
            4 => Some(Self::PosZ),
            5 => Some(Self::NegZ),
            _ => None,
        }
    }

    /// The face pointing the other way
    pub const fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Unit step (dx, dy, dz) towards the neighbour
    pub const fn offset(self) -> [isize; 3] {
        match self {
            Self::PosX => [1, 0, 0],
            Self::NegX => [-1, 0, 0],
            Self::PosY => [0, 1, 0],
            Self::NegY => [0, -1, 0],
            Self::PosZ => [0, 0, 1],
            Self::NegZ => [0, 0, -1],
        }
    }

    /// Label of the matching socket field in prototype data
    pub const fn label(self) -> &'static str {
        match self {
            Self::PosX => "posX",
            Self::PosY => "posY",
            Self::NegX => "negX",
            Self::NegY => "negY",
            Self::PosZ => "posZ",
            Self::NegZ => "negZ",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
